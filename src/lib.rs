pub mod config;
pub mod core;
pub mod models;
pub mod scrapers;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use utils::error::{AppError, Result};
