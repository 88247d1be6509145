use crate::domain::error::ReviewError;
use crate::domain::model::{NewReview, Review, ReviewVisibility};
use crate::domain::patch::{apply_patch, PatchOperation};
use crate::domain::traits::ReviewStore;
use crate::infrastructure::storage::cache::{CacheLookup, ReviewCache};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Review operations, answered from the cache first and the store second.
///
/// Writes go to the store and are committed before the cache is patched, so
/// the cache never holds a review the store does not. Writes run one at a
/// time: the store's staged changes always belong to a single caller.
pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
    cache: Arc<ReviewCache>,
    writes: Mutex<()>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn ReviewStore>, cache: Arc<ReviewCache>) -> Self {
        Self {
            store,
            cache,
            writes: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &ReviewCache {
        &self.cache
    }

    /// Loads every stored review into the cache.
    pub async fn warm_cache(&self) -> Result<usize, ReviewError> {
        let reviews = self.store.list_all().await?;
        let count = reviews.len();
        self.cache.populate(reviews);
        tracing::info!(reviews = count, "review cache populated");
        Ok(count)
    }

    pub async fn list_all(&self) -> Result<Vec<Review>, ReviewError> {
        if let Some(reviews) = self.cache.get_all() {
            tracing::debug!("list_all served from cache");
            return Ok(reviews);
        }

        // A miss here deliberately leaves the cache cold
        self.store.list_all().await
    }

    pub async fn list_visible_for_product(&self, product_id: i64) -> Result<Vec<Review>, ReviewError> {
        ReviewError::check_id("product_id", product_id)?;

        if let Some(reviews) = self.cache.get_visible_for_product(product_id) {
            tracing::debug!(product_id, "visible reviews served from cache");
            return Ok(reviews);
        }

        self.store.list_visible_for_product(product_id).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Review, ReviewError> {
        ReviewError::check_id("id", id)?;

        match self.cache.get(id) {
            CacheLookup::Hit(review) => {
                tracing::debug!(id, "review served from cache");
                Ok(review)
            }
            CacheLookup::Miss => {
                let review = self
                    .store
                    .get_by_id(id)
                    .await?
                    .ok_or(ReviewError::NotFound(id))?;
                tracing::debug!(id, "review added to cache after store lookup");
                Ok(self.cache.insert_if_absent(review))
            }
            CacheLookup::Unpopulated => self
                .store
                .get_by_id(id)
                .await?
                .ok_or(ReviewError::NotFound(id)),
        }
    }

    /// Creates a visible review dated now.
    pub async fn create(&self, input: Option<NewReview>) -> Result<Review, ReviewError> {
        let input = input.ok_or_else(|| {
            ReviewError::invalid_argument("review", "The product review to create cannot be null.")
        })?;

        let errors = input.validate();
        if !errors.is_empty() {
            return Err(ReviewError::ValidationFailed(errors));
        }

        let _write = self.writes.lock().await;
        let review = self.store.insert(input.into_review(Utc::now())).await?;
        self.store.commit().await?;
        self.cache.upsert(review.clone());

        tracing::info!(id = review.id, product_id = review.product_id, "review created");
        Ok(review)
    }

    /// Applies a JSON patch to the visibility of review `id`.
    pub async fn update_patch(
        &self,
        id: i64,
        ops: Option<Vec<PatchOperation>>,
    ) -> Result<(), ReviewError> {
        ReviewError::check_id("id", id)?;
        let ops = ops.ok_or_else(|| {
            ReviewError::invalid_argument(
                "patch",
                "The product review used to update cannot be null.",
            )
        })?;

        let _write = self.writes.lock().await;
        let mut review = self.get_by_id(id).await?;

        let visibility = apply_patch(ReviewVisibility::from(&review), &ops)
            .map_err(ReviewError::ValidationFailed)?;
        visibility.apply_to(&mut review);

        self.store.mark_dirty(&review).await?;
        self.store.commit().await?;
        self.cache.upsert(review.clone());

        tracing::info!(id, is_hidden = review.is_hidden, "review visibility updated");
        Ok(())
    }
}
