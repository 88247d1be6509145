// In-memory read-through cache for the review collection
use crate::domain::model::Review;
use parking_lot::Mutex;

/// Result of looking a single review up in the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Nothing has been loaded yet; the store is the only source.
    Unpopulated,
    /// The cache is populated but holds no review with this id.
    Miss,
    Hit(Review),
}

/// Process-local mirror of the review table.
///
/// The whole collection is one cached value: it is either absent or
/// populated, and once populated it only grows or has entries replaced.
/// All access goes through a single mutex, so concurrent upserts cannot
/// interleave their remove and append steps.
#[derive(Debug, Default)]
pub struct ReviewCache {
    reviews: Mutex<Option<Vec<Review>>>,
}

impl ReviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the cached collection, or `None` when unpopulated.
    pub fn get_all(&self) -> Option<Vec<Review>> {
        self.reviews.lock().clone()
    }

    /// Visible reviews of one product, or `None` when unpopulated.
    pub fn get_visible_for_product(&self, product_id: i64) -> Option<Vec<Review>> {
        self.reviews.lock().as_ref().map(|reviews| {
            reviews
                .iter()
                .filter(|r| !r.is_hidden && r.product_id == product_id)
                .cloned()
                .collect()
        })
    }

    pub fn get(&self, id: i64) -> CacheLookup {
        match self.reviews.lock().as_ref() {
            None => CacheLookup::Unpopulated,
            Some(reviews) => reviews
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .map_or(CacheLookup::Miss, CacheLookup::Hit),
        }
    }

    /// Replaces any entry with the same id and appends `review`.
    ///
    /// Returns `false` without touching anything when the cache is
    /// unpopulated; a write never populates the cache.
    pub fn upsert(&self, review: Review) -> bool {
        match self.reviews.lock().as_mut() {
            None => false,
            Some(reviews) => {
                reviews.retain(|r| r.id != review.id);
                reviews.push(review);
                true
            }
        }
    }

    /// Appends a review read from the store unless the cache already has
    /// that id, and returns whichever copy the cache now holds.
    ///
    /// A store read can finish after a concurrent write has upserted a newer
    /// copy; that copy must win over the older read. On an unpopulated
    /// cache nothing is stored and `review` is handed back unchanged.
    pub fn insert_if_absent(&self, review: Review) -> Review {
        match self.reviews.lock().as_mut() {
            None => review,
            Some(reviews) => match reviews.iter().find(|r| r.id == review.id) {
                Some(existing) => existing.clone(),
                None => {
                    reviews.push(review.clone());
                    review
                }
            },
        }
    }

    /// Loads a full collection and marks the cache populated.
    pub fn populate(&self, reviews: Vec<Review>) {
        *self.reviews.lock() = Some(reviews);
    }

    pub fn clear(&self) {
        *self.reviews.lock() = None;
    }

    pub fn is_populated(&self) -> bool {
        self.reviews.lock().is_some()
    }

    pub fn len(&self) -> usize {
        self.reviews.lock().as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
