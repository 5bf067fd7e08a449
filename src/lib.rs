pub mod config;
pub mod error;
pub mod models;
pub mod notifications;
pub mod orders;
pub mod storage;
pub mod store;

pub use config::Config;
pub use error::ReviewError;
pub use models::*;
pub use notifications::NotificationService;
pub use orders::OrderLedger;
pub use storage::{JsonFileStorage, MemoryStorage, ReviewStorage};
pub use store::{ReviewStore, VisibilityChange};
