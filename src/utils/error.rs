use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unsupported site type for url: {url}")]
    UnsupportedSite { url: String },

    #[error("No scraper implemented for site: {site}")]
    AdapterNotImplemented { site: String },

    #[error("Local HTML file not found: {}", path.display())]
    SnapshotNotFound { path: PathBuf },

    #[error("Parsing error: {message}")]
    Parse { message: String },

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    pub fn parse(message: impl Into<String>) -> Self {
        AppError::Parse {
            message: message.into(),
        }
    }

    /// Errors that mean "this record cannot be routed to an adapter" rather
    /// than a failure while processing it.
    pub fn is_classification(&self) -> bool {
        matches!(
            self,
            AppError::UnsupportedSite { .. } | AppError::AdapterNotImplemented { .. }
        )
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_unsupported_site_error() {
        let err = AppError::UnsupportedSite {
            url: "https://lazada.sg/item".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported site type for url: https://lazada.sg/item"
        );
        assert!(err.is_classification());
    }

    #[test]
    fn test_snapshot_not_found_error() {
        let err = AppError::SnapshotNotFound {
            path: PathBuf::from("output/html/s_1.html"),
        };
        assert_eq!(err.to_string(), "Local HTML file not found: output/html/s_1.html");
        assert!(!err.is_classification());
    }
}
