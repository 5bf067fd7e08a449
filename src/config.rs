use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub orders: OrdersConfig,
    pub reviews: ReviewPolicy,
    pub notifications: NotificationsConfig,
}

/// Where the review snapshot is kept
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".storefront/storage"),
        }
    }
}

/// Source of the order ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdersConfig {
    pub path: PathBuf,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".storefront/orders.yml"),
        }
    }
}

/// Optional rating bounds for new reviews; unbounded unless configured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewPolicy {
    pub min_rating: Option<u8>,
    pub max_rating: Option<u8>,
}

impl ReviewPolicy {
    pub fn bounded(min_rating: u8, max_rating: u8) -> Self {
        Self {
            min_rating: Some(min_rating),
            max_rating: Some(max_rating),
        }
    }

    pub fn accepts_rating(&self, rating: u8) -> bool {
        self.min_rating.map_or(true, |min| rating >= min)
            && self.max_rating.map_or(true, |max| rating <= max)
    }
}

/// Notifications configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotificationsConfig {
    pub slack: SlackConfig,
}

/// Slack notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub enabled: bool,
    pub webhook_url: Option<String>,
    pub channel: Option<String>,
    pub on_new_review: bool,
    pub on_hidden: bool,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: None,
            channel: None,
            on_new_review: true,
            on_hidden: false,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let (Some(min), Some(max)) = (config.reviews.min_rating, config.reviews.max_rating) {
            if min > max {
                anyhow::bail!(
                    "Invalid review policy in {}: min_rating {} exceeds max_rating {}",
                    path.display(),
                    min,
                    max
                );
            }
        }

        info!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }
}
