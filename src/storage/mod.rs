pub mod json;
pub mod memory;

pub use json::JsonFileStorage;
pub use memory::MemoryStorage;

use anyhow::Result;
use crate::models::Review;

/// Storage key holding the full review collection
pub const REVIEWS_KEY: &str = "product_reviews";

/// Trait for review snapshot persistence backends
pub trait ReviewStorage: Send + Sync {
    /// Load the last saved snapshot, or `None` if nothing was saved yet
    fn load(&self) -> Result<Option<Vec<Review>>>;

    /// Replace the saved snapshot with `reviews`
    fn save(&self, reviews: &[Review]) -> Result<()>;
}
