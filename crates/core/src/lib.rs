pub mod config;
pub mod error;
pub mod sanitize;
pub mod stats;
pub mod types;

pub use config::AppConfig;
pub use error::{InsightsError, InsightsResult};
