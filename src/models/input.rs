use serde::{Deserialize, Serialize};

/// Marker used in input sheets for "no URL for this product".
pub const NO_URL_MARKER: &str = "--";

/// One row of input: what to scrape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductInputRecord {
    pub id: String,
    pub url: String,
}

impl ProductInputRecord {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }

    /// True when the URL is a real http(s) link and not the "no URL" marker.
    pub fn has_scrapable_url(&self) -> bool {
        let url = self.url.trim();
        if url == NO_URL_MARKER {
            return false;
        }
        match url::Url::parse(url) {
            Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some(),
            Err(_) => false,
        }
    }
}

/// Spreadsheet exports turn numeric ids into floats (`"12.0"`).
pub fn normalize_id(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix(".0").unwrap_or(trimmed).to_string()
}
