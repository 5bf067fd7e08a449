use thiserror::Error;

/// Failures surfaced by the review store to its callers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    /// The user has not purchased the product, or has already reviewed it
    #[error("cannot review this product (product {product_id}, user {user_id})")]
    NotEligible { product_id: u64, user_id: String },

    /// Rating outside the bounds configured for the store
    #[error("rating {rating} is outside the configured range")]
    InvalidRating { rating: u8 },
}
