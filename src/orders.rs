use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::Order;

/// Read-only set of completed orders used for purchase verification
#[derive(Debug, Clone, Default)]
pub struct OrderLedger {
    orders: Vec<Order>,
}

impl OrderLedger {
    pub fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    /// Load orders from a YAML or JSON file (JSON is valid YAML)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "Order file not found, using empty ledger");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read order file: {}", path.display()))?;

        let orders: Vec<Order> = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse order file: {}", path.display()))?;

        info!(path = %path.display(), count = orders.len(), "Loaded order ledger");

        Ok(Self::new(orders))
    }

    /// Check whether any order shows `user_id` bought `product_id`
    pub fn has_purchased(&self, product_id: u64, user_id: &str) -> bool {
        self.orders.iter().any(|o| o.covers(product_id, user_id))
    }

    /// First order that covers the purchase, if any
    pub fn find_purchase(&self, product_id: u64, user_id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.covers(product_id, user_id))
    }

    pub fn purchases_of<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a Order> + 'a {
        self.orders.iter().filter(move |o| o.user_id == user_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
