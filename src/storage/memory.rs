use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use super::ReviewStorage;
use crate::models::Review;

/// In-process storage; clones share the same snapshot
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    snapshot: Arc<Mutex<Option<Vec<Review>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with a snapshot
    pub fn with_reviews(reviews: Vec<Review>) -> Self {
        Self {
            snapshot: Arc::new(Mutex::new(Some(reviews))),
        }
    }

    /// Current snapshot, as last written
    pub fn snapshot(&self) -> Option<Vec<Review>> {
        self.snapshot.lock().ok().and_then(|s| s.clone())
    }
}

impl ReviewStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Vec<Review>>> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, reviews: &[Review]) -> Result<()> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        *guard = Some(reviews.to_vec());
        Ok(())
    }
}
