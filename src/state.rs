use crate::application::reviews::ReviewService;
use crate::domain::error::ReviewError;
use crate::infrastructure::config::Config;
use crate::infrastructure::storage::cache::ReviewCache;
use crate::infrastructure::storage::db::SqliteReviewStore;
use std::sync::Arc;
use tokio_rusqlite::Connection;

#[derive(Clone)]
pub struct AppState {
    pub db: Connection,
    pub reviews: Arc<ReviewService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the store, the cache and the service around an open database.
    pub async fn new(db: Connection, config: Config) -> Result<Self, ReviewError> {
        let store = SqliteReviewStore::new(db.clone()).await?;
        let cache = Arc::new(ReviewCache::new());
        let reviews = ReviewService::new(Arc::new(store), cache);

        if config.cache.enabled && config.cache.warm_on_start {
            reviews.warm_cache().await?;
        }

        Ok(Self {
            db,
            reviews: Arc::new(reviews),
            config: Arc::new(config),
        })
    }
}
