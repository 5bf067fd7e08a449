use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{ReviewStorage, REVIEWS_KEY};
use crate::models::Review;

/// JSON file storage: one file per key under a base directory
pub struct JsonFileStorage {
    base_path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).with_context(|| {
            format!("Failed to create storage directory: {}", base_path.display())
        })?;

        info!(path = %base_path.display(), "Initialized JSON review storage");

        Ok(Self { base_path })
    }

    pub fn reviews_path(&self) -> PathBuf {
        self.base_path.join(format!("{}.json", REVIEWS_KEY))
    }

    fn staging_path(&self) -> PathBuf {
        self.base_path.join(format!(".{}.json.tmp", REVIEWS_KEY))
    }
}

impl ReviewStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<Vec<Review>>> {
        let path = self.reviews_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read reviews: {}", path.display()))?;

        let reviews: Vec<Review> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse reviews: {}", path.display()))?;

        debug!(count = reviews.len(), "Loaded review snapshot");

        Ok(Some(reviews))
    }

    fn save(&self, reviews: &[Review]) -> Result<()> {
        let path = self.reviews_path();
        let staging = self.staging_path();
        let content = serde_json::to_string_pretty(reviews)?;

        // Stage then rename so a torn write never replaces the last good snapshot
        fs::write(&staging, content)
            .with_context(|| format!("Failed to write reviews: {}", staging.display()))?;
        fs::rename(&staging, &path).with_context(|| {
            format!("Failed to replace snapshot: {}", path.display())
        })?;

        debug!(count = reviews.len(), path = %path.display(), "Saved review snapshot");

        Ok(())
    }
}
