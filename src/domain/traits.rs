use crate::domain::error::ReviewError;
use crate::domain::model::Review;
use async_trait::async_trait;

/// Durable persistence for reviews.
///
/// Mutations follow a unit-of-work shape: [`insert`](ReviewStore::insert)
/// and [`mark_dirty`](ReviewStore::mark_dirty) stage changes, and nothing
/// is durable until [`commit`](ReviewStore::commit) returns `Ok`.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Every review, ordered by id
    async fn list_all(&self) -> Result<Vec<Review>, ReviewError>;

    /// Reviews for `product_id` that are not hidden, ordered by id
    async fn list_visible_for_product(&self, product_id: i64) -> Result<Vec<Review>, ReviewError>;

    /// Point lookup of a committed review
    async fn get_by_id(&self, id: i64) -> Result<Option<Review>, ReviewError>;

    /// Stages `review` for insertion and returns it with its assigned id.
    /// The id on the incoming value is ignored.
    async fn insert(&self, review: Review) -> Result<Review, ReviewError>;

    /// Stages the current state of an existing review for writing.
    async fn mark_dirty(&self, review: &Review) -> Result<(), ReviewError>;

    /// Persists every staged change in one transaction.
    async fn commit(&self) -> Result<(), ReviewError>;
}
