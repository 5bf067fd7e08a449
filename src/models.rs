use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed purchase. Never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub product_ids: BTreeSet<u64>,
}

impl Order {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        product_ids: impl IntoIterator<Item = u64>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            product_ids: product_ids.into_iter().collect(),
        }
    }

    /// True when this order belongs to `user_id` and includes `product_id`
    pub fn covers(&self, product_id: u64, user_id: &str) -> bool {
        self.user_id == user_id && self.product_ids.contains(&product_id)
    }
}

/// A user-submitted product review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub product_id: u64,
    pub user_id: String,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
    pub date: DateTime<Utc>,
    pub is_visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

/// Input for creating a review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub product_id: u64,
    pub user_id: String,
    pub user_name: String,
    pub rating: u8,
    pub comment: String,
    #[serde(default)]
    pub order_id: Option<String>,
}

impl Review {
    pub fn new(data: NewReview) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: data.product_id,
            user_id: data.user_id,
            user_name: data.user_name,
            rating: data.rating,
            comment: data.comment,
            date: Utc::now(),
            is_visible: true,
            order_id: data.order_id,
        }
    }

    /// Whether this review was written by `user_id` about `product_id`
    pub fn is_by(&self, product_id: u64, user_id: &str) -> bool {
        self.product_id == product_id && self.user_id == user_id
    }
}

/// Aggregate of the visible ratings for one product
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingSummary {
    pub product_id: u64,
    pub count: usize,
    pub average: Option<f64>,
    /// Number of reviews per star value, keyed by rating
    pub histogram: Vec<(u8, usize)>,
}

impl RatingSummary {
    pub fn from_reviews<'a>(product_id: u64, reviews: impl IntoIterator<Item = &'a Review>) -> Self {
        let mut histogram: std::collections::BTreeMap<u8, usize> = Default::default();
        let mut total: u64 = 0;
        let mut count = 0;

        for review in reviews {
            *histogram.entry(review.rating).or_default() += 1;
            total += u64::from(review.rating);
            count += 1;
        }

        let average = (count > 0).then(|| total as f64 / count as f64);

        Self {
            product_id,
            count,
            average,
            histogram: histogram.into_iter().collect(),
        }
    }
}
