#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use product_reviews::application::reviews::ReviewService;
use product_reviews::domain::error::ReviewError;
use product_reviews::domain::model::{NewReview, Review};
use product_reviews::domain::traits::ReviewStore;
use product_reviews::infrastructure::storage::cache::ReviewCache;
use product_reviews::infrastructure::storage::db::{init_memory_database, SqliteReviewStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Store wrapper that counts how often each operation is reached.
pub struct CountingStore {
    inner: SqliteReviewStore,
    pub reads: AtomicUsize,
    pub commits: AtomicUsize,
}

impl CountingStore {
    pub async fn new() -> Self {
        let conn = init_memory_database().await.expect("open in-memory database");
        Self {
            inner: SqliteReviewStore::new(conn).await.expect("create store"),
            reads: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Inserts and commits directly, bypassing the service and its cache.
    pub async fn seed(&self, header: &str, product_id: i64, is_hidden: bool) -> Review {
        let mut review = new_review(header, product_id).into_review(Utc::now());
        review.is_hidden = is_hidden;
        let review = self.inner.insert(review).await.expect("insert");
        self.inner.commit().await.expect("commit");
        review
    }

    /// Drops the review table so every later statement fails in SQLite.
    pub async fn break_table(&self) {
        self.inner
            .connection()
            .call(|conn| conn.execute_batch("DROP TABLE product_reviews"))
            .await
            .expect("drop table");
    }
}

#[async_trait]
impl ReviewStore for CountingStore {
    async fn list_all(&self) -> Result<Vec<Review>, ReviewError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.list_all().await
    }

    async fn list_visible_for_product(&self, product_id: i64) -> Result<Vec<Review>, ReviewError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.list_visible_for_product(product_id).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Review>, ReviewError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_id(id).await
    }

    async fn insert(&self, review: Review) -> Result<Review, ReviewError> {
        self.inner.insert(review).await
    }

    async fn mark_dirty(&self, review: &Review) -> Result<(), ReviewError> {
        self.inner.mark_dirty(review).await
    }

    async fn commit(&self) -> Result<(), ReviewError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit().await
    }
}

/// Store whose next `get_by_id` stops after reading, until released.
pub struct GatedStore {
    inner: CountingStore,
    armed: AtomicBool,
    pub reached: Notify,
    pub release: Notify,
}

impl GatedStore {
    pub async fn new() -> Self {
        Self {
            inner: CountingStore::new().await,
            armed: AtomicBool::new(false),
            reached: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub async fn seed(&self, header: &str, product_id: i64, is_hidden: bool) -> Review {
        self.inner.seed(header, product_id, is_hidden).await
    }
}

#[async_trait]
impl ReviewStore for GatedStore {
    async fn list_all(&self) -> Result<Vec<Review>, ReviewError> {
        self.inner.list_all().await
    }

    async fn list_visible_for_product(&self, product_id: i64) -> Result<Vec<Review>, ReviewError> {
        self.inner.list_visible_for_product(product_id).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Review>, ReviewError> {
        let found = self.inner.get_by_id(id).await;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.release.notified().await;
        }
        found
    }

    async fn insert(&self, review: Review) -> Result<Review, ReviewError> {
        self.inner.insert(review).await
    }

    async fn mark_dirty(&self, review: &Review) -> Result<(), ReviewError> {
        self.inner.mark_dirty(review).await
    }

    async fn commit(&self) -> Result<(), ReviewError> {
        self.inner.commit().await
    }
}

pub fn new_review(header: &str, product_id: i64) -> NewReview {
    NewReview {
        header: header.to_string(),
        content: format!("{} content", header),
        product_id,
    }
}

/// Service over a fresh in-memory store with a cold cache.
pub async fn service() -> (ReviewService, Arc<CountingStore>, Arc<ReviewCache>) {
    let store = Arc::new(CountingStore::new().await);
    let cache = Arc::new(ReviewCache::new());
    let service = ReviewService::new(store.clone(), cache.clone());
    (service, store, cache)
}
