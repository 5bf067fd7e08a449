use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ReviewPolicy;
use crate::error::ReviewError;
use crate::models::{NewReview, RatingSummary, Review};
use crate::orders::OrderLedger;
use crate::storage::ReviewStorage;

/// Outcome of a visibility toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityChange {
    NotFound,
    Unchanged,
    Changed,
}

/// Owns the review collection and mirrors it to storage after every change
pub struct ReviewStore<S: ReviewStorage> {
    orders: OrderLedger,
    storage: S,
    policy: ReviewPolicy,
    reviews: Vec<Review>,
}

impl<S: ReviewStorage> ReviewStore<S> {
    /// Open the store, restoring the last snapshot from `storage`.
    ///
    /// A missing or unreadable snapshot yields an empty collection.
    pub fn open(orders: OrderLedger, storage: S) -> Self {
        let reviews = match storage.load() {
            Ok(Some(reviews)) => {
                info!(count = reviews.len(), "Restored review snapshot");
                reviews
            }
            Ok(None) => {
                debug!("No review snapshot found, starting empty");
                Vec::new()
            }
            Err(err) => {
                warn!(error = ?err, "Review snapshot unreadable, starting empty");
                Vec::new()
            }
        };

        Self {
            orders,
            storage,
            policy: ReviewPolicy::default(),
            reviews,
        }
    }

    pub fn with_policy(mut self, policy: ReviewPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// A user may review a product they bought and have not reviewed yet.
    ///
    /// Hidden reviews still count as "already reviewed".
    pub fn can_user_review(&self, product_id: u64, user_id: &str) -> bool {
        if !self.orders.has_purchased(product_id, user_id) {
            return false;
        }

        !self.reviews.iter().any(|r| r.is_by(product_id, user_id))
    }

    /// Create a review if the user is eligible, then persist the collection
    pub fn add_review(&mut self, data: NewReview) -> Result<Review, ReviewError> {
        if !self.can_user_review(data.product_id, &data.user_id) {
            debug!(
                product_id = data.product_id,
                user_id = %data.user_id,
                "Review rejected: not eligible"
            );
            return Err(ReviewError::NotEligible {
                product_id: data.product_id,
                user_id: data.user_id,
            });
        }

        if !self.policy.accepts_rating(data.rating) {
            return Err(ReviewError::InvalidRating {
                rating: data.rating,
            });
        }

        let review = Review::new(data);
        info!(
            id = %review.id,
            product_id = review.product_id,
            user_id = %review.user_id,
            rating = review.rating,
            "Review added"
        );

        self.reviews.push(review.clone());
        self.persist();

        Ok(review)
    }

    /// Visible reviews for a product, oldest first
    pub fn get_product_reviews(&self, product_id: u64) -> Vec<&Review> {
        self.reviews
            .iter()
            .filter(|r| r.product_id == product_id && r.is_visible)
            .collect()
    }

    /// Show or hide a review. Unknown ids and no-op toggles write nothing.
    pub fn toggle_review_visibility(
        &mut self,
        review_id: &Uuid,
        is_visible: bool,
    ) -> VisibilityChange {
        let Some(review) = self.reviews.iter_mut().find(|r| r.id == *review_id) else {
            debug!(id = %review_id, "Visibility toggle ignored: unknown review");
            return VisibilityChange::NotFound;
        };

        if review.is_visible == is_visible {
            debug!(id = %review_id, is_visible, "Review visibility already set");
            return VisibilityChange::Unchanged;
        }

        review.is_visible = is_visible;
        info!(id = %review_id, is_visible, "Review visibility changed");

        self.persist();
        VisibilityChange::Changed
    }

    /// Every review, hidden ones included, in insertion order
    pub fn all_reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn find_review(&self, review_id: &Uuid) -> Option<&Review> {
        self.reviews.iter().find(|r| r.id == *review_id)
    }

    /// Reviews written by a user, hidden ones included
    pub fn user_reviews(&self, user_id: &str) -> Vec<&Review> {
        self.reviews.iter().filter(|r| r.user_id == user_id).collect()
    }

    /// Count, average and histogram over the visible reviews of a product
    pub fn rating_summary(&self, product_id: u64) -> RatingSummary {
        RatingSummary::from_reviews(product_id, self.get_product_reviews(product_id))
    }

    pub fn orders(&self) -> &OrderLedger {
        &self.orders
    }

    fn persist(&self) {
        if let Err(err) = self.storage.save(&self.reviews) {
            warn!(error = ?err, count = self.reviews.len(), "Failed to persist reviews");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Order;
    use crate::storage::{JsonFileStorage, MemoryStorage};
    use tempfile::tempdir;

    fn orders() -> OrderLedger {
        OrderLedger::new(vec![
            Order::new("ORD-001", "1", [1001]),
            Order::new("ORD-002", "2", [1001, 1002]),
        ])
    }

    fn new_review(product_id: u64, user_id: &str, user_name: &str) -> NewReview {
        NewReview {
            product_id,
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            rating: 5,
            comment: "Great".to_string(),
            order_id: None,
        }
    }

    struct FailingStorage;

    impl ReviewStorage for FailingStorage {
        fn load(&self) -> anyhow::Result<Option<Vec<Review>>> {
            anyhow::bail!("storage offline")
        }

        fn save(&self, _reviews: &[Review]) -> anyhow::Result<()> {
            anyhow::bail!("storage offline")
        }
    }

    #[test]
    fn test_purchase_then_review() {
        let mut store = ReviewStore::open(orders(), MemoryStorage::new());

        assert!(store.can_user_review(1001, "1"));

        store.add_review(new_review(1001, "1", "Alice")).unwrap();

        assert!(!store.can_user_review(1001, "1"));
        let reviews = store.get_product_reviews(1001);
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].user_name, "Alice");
        assert!(reviews[0].is_visible);
    }

    #[test]
    fn test_unpurchased_product_rejected() {
        let storage = MemoryStorage::new();
        let mut store = ReviewStore::open(orders(), storage.clone());

        assert!(!store.can_user_review(9999, "1"));

        let err = store.add_review(new_review(9999, "1", "Alice")).unwrap_err();
        assert_eq!(
            err,
            ReviewError::NotEligible {
                product_id: 9999,
                user_id: "1".to_string()
            }
        );
        assert!(store.all_reviews().is_empty());
        assert!(storage.snapshot().is_none());
    }

    #[test]
    fn test_duplicate_review_rejected() {
        let mut store = ReviewStore::open(orders(), MemoryStorage::new());

        store.add_review(new_review(1001, "2", "Bob")).unwrap();
        let result = store.add_review(new_review(1001, "2", "Bob"));

        assert!(matches!(result, Err(ReviewError::NotEligible { .. })));
        assert_eq!(store.all_reviews().len(), 1);

        // Other products from the same order are unaffected
        assert!(store.can_user_review(1002, "2"));
    }

    #[test]
    fn test_hidden_review_still_blocks_rereview() {
        let mut store = ReviewStore::open(orders(), MemoryStorage::new());

        let review = store.add_review(new_review(1001, "1", "Alice")).unwrap();
        store.toggle_review_visibility(&review.id, false);

        assert!(!store.can_user_review(1001, "1"));
    }

    #[test]
    fn test_other_user_without_order_rejected() {
        let mut store = ReviewStore::open(orders(), MemoryStorage::new());
        store.add_review(new_review(1001, "1", "Alice")).unwrap();

        assert!(!store.can_user_review(1001, "3"));
        assert!(store.can_user_review(1001, "2"));
    }

    #[test]
    fn test_any_rating_accepted_without_policy() {
        let mut store = ReviewStore::open(orders(), MemoryStorage::new());

        assert!(store.can_user_review(1001, "1"));
        let review = store
            .add_review(NewReview {
                rating: 0,
                ..new_review(1001, "1", "Alice")
            })
            .unwrap();

        assert_eq!(review.rating, 0);
        assert_eq!(store.get_product_reviews(1001), vec![&review]);
    }

    #[test]
    fn test_invalid_rating_rejected() {
        let storage = MemoryStorage::new();
        let mut store = ReviewStore::open(orders(), storage.clone())
            .with_policy(ReviewPolicy::bounded(1, 5));

        let data = NewReview {
            rating: 0,
            ..new_review(1001, "1", "Alice")
        };
        let err = store.add_review(data).unwrap_err();

        assert_eq!(err, ReviewError::InvalidRating { rating: 0 });
        assert!(store.can_user_review(1001, "1"));
        assert!(storage.snapshot().is_none());
    }

    #[test]
    fn test_custom_policy() {
        let mut store = ReviewStore::open(orders(), MemoryStorage::new())
            .with_policy(ReviewPolicy::bounded(1, 10));

        let data = NewReview {
            rating: 9,
            ..new_review(1001, "1", "Alice")
        };
        assert!(store.add_review(data).is_ok());
    }

    #[test]
    fn test_hidden_reviews_excluded_from_product_listing() {
        let mut store = ReviewStore::open(orders(), MemoryStorage::new());

        let alice = store.add_review(new_review(1001, "1", "Alice")).unwrap();
        store.add_review(new_review(1001, "2", "Bob")).unwrap();

        assert_eq!(
            store.toggle_review_visibility(&alice.id, false),
            VisibilityChange::Changed
        );

        let visible = store.get_product_reviews(1001);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].user_name, "Bob");
        assert!(visible.iter().all(|r| r.is_visible));
        assert_eq!(store.all_reviews().len(), 2);
    }

    #[test]
    fn test_toggle_round_trip_keeps_fields() {
        let mut store = ReviewStore::open(orders(), MemoryStorage::new());

        let original = store.add_review(new_review(1001, "1", "Alice")).unwrap();
        store.toggle_review_visibility(&original.id, false);
        store.toggle_review_visibility(&original.id, true);

        let reviews = store.get_product_reviews(1001);
        assert_eq!(reviews, vec![&original]);
    }

    #[test]
    fn test_toggle_unknown_review_is_noop() {
        let storage = MemoryStorage::new();
        let mut store = ReviewStore::open(orders(), storage.clone());
        store.add_review(new_review(1001, "1", "Alice")).unwrap();
        let before = storage.snapshot();

        assert_eq!(
            store.toggle_review_visibility(&Uuid::new_v4(), false),
            VisibilityChange::NotFound
        );

        assert_eq!(store.get_product_reviews(1001).len(), 1);
        assert_eq!(storage.snapshot(), before);
    }

    #[test]
    fn test_repeated_hide_is_unchanged() {
        let storage = MemoryStorage::new();
        let mut store = ReviewStore::open(orders(), storage.clone());
        let review = store.add_review(new_review(1001, "1", "Alice")).unwrap();

        assert_eq!(
            store.toggle_review_visibility(&review.id, false),
            VisibilityChange::Changed
        );
        // Clear the mirror so a second write would be visible
        storage.save(&[]).unwrap();

        assert_eq!(
            store.toggle_review_visibility(&review.id, false),
            VisibilityChange::Unchanged
        );
        assert_eq!(storage.snapshot(), Some(Vec::new()));
        assert!(!store.find_review(&review.id).unwrap().is_visible);
    }

    #[test]
    fn test_open_on_seeded_snapshot() {
        let hidden = Review {
            is_visible: false,
            ..Review::new(new_review(1001, "1", "Alice"))
        };
        let visible = Review::new(new_review(1001, "2", "Bob"));
        let storage = MemoryStorage::with_reviews(vec![hidden.clone(), visible.clone()]);

        let store = ReviewStore::open(orders(), storage);

        assert_eq!(store.all_reviews(), &[hidden, visible.clone()]);
        assert!(!store.can_user_review(1001, "1"));
        assert!(!store.can_user_review(1001, "2"));
        assert_eq!(store.get_product_reviews(1001), vec![&visible]);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut store = ReviewStore::open(orders(), MemoryStorage::new());

        store.add_review(new_review(1001, "2", "Bob")).unwrap();
        store.add_review(new_review(1002, "2", "Bob")).unwrap();
        store.add_review(new_review(1001, "1", "Alice")).unwrap();

        let names: Vec<&str> = store
            .get_product_reviews(1001)
            .iter()
            .map(|r| r.user_name.as_str())
            .collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
    }

    #[test]
    fn test_every_mutation_persists_snapshot() {
        let storage = MemoryStorage::new();
        let mut store = ReviewStore::open(orders(), storage.clone());

        let review = store.add_review(new_review(1001, "1", "Alice")).unwrap();
        assert_eq!(storage.snapshot().unwrap(), vec![review.clone()]);

        store.toggle_review_visibility(&review.id, false);
        let saved = storage.snapshot().unwrap();
        assert!(!saved[0].is_visible);
    }

    #[test]
    fn test_reopen_restores_collection() {
        let dir = tempdir().unwrap();

        let review = {
            let storage = JsonFileStorage::new(dir.path()).unwrap();
            let mut store = ReviewStore::open(orders(), storage);
            let review = store.add_review(new_review(1001, "1", "Alice")).unwrap();
            store.toggle_review_visibility(&review.id, false);
            review
        };

        let storage = JsonFileStorage::new(dir.path()).unwrap();
        let store = ReviewStore::open(orders(), storage);

        let restored = store.find_review(&review.id).unwrap();
        assert_eq!(restored.user_name, "Alice");
        assert!(!restored.is_visible);
        assert!(!store.can_user_review(1001, "1"));
    }

    #[test]
    fn test_unreadable_snapshot_starts_empty() {
        let mut store = ReviewStore::open(orders(), FailingStorage);
        assert!(store.all_reviews().is_empty());

        // Save failures are swallowed; in-memory state still updates
        let review = store.add_review(new_review(1001, "1", "Alice")).unwrap();
        assert_eq!(store.get_product_reviews(1001), vec![&review]);
    }

    #[test]
    fn test_user_reviews_and_summary() {
        let mut store = ReviewStore::open(orders(), MemoryStorage::new());

        store.add_review(new_review(1001, "2", "Bob")).unwrap();
        let hidden = store
            .add_review(NewReview {
                rating: 3,
                ..new_review(1002, "2", "Bob")
            })
            .unwrap();
        store.add_review(NewReview {
            rating: 4,
            ..new_review(1001, "1", "Alice")
        })
        .unwrap();
        store.toggle_review_visibility(&hidden.id, false);

        assert_eq!(store.user_reviews("2").len(), 2);

        let summary = store.rating_summary(1001);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, Some(4.5));

        assert_eq!(store.rating_summary(1002).count, 0);
    }
}
