use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::utils::time::iso_timestamp;

pub const DEFAULT_URL_TAG: &str = "main";

fn default_url_tag() -> String {
    DEFAULT_URL_TAG.to_string()
}

/// Canonical record for one scraped product page.
///
/// Field order is the serialized order of the per-product JSON artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProductData {
    pub id: String,
    pub url: String,
    pub url_tag: String,
    /// Left blank when absent from a stored record.
    #[serde(default)]
    pub crawled_at: String,
    pub product_name: String,
    pub brand: String,
    pub price_current: String,
    pub price_original: String,
    pub image_urls_original: Vec<String>,
    pub image_urls_simplified: Vec<String>,
    pub infos: serde_json::Value,
    /// Relative paths (`{id}/{file}`) of downloaded images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_images: Option<Vec<String>>,
}

impl Default for ProductData {
    fn default() -> Self {
        Self {
            id: String::new(),
            url: String::new(),
            url_tag: default_url_tag(),
            crawled_at: iso_timestamp(),
            product_name: String::new(),
            brand: String::new(),
            price_current: String::new(),
            price_original: String::new(),
            image_urls_original: Vec::new(),
            image_urls_simplified: Vec::new(),
            infos: serde_json::Value::Object(serde_json::Map::new()),
            local_images: None,
        }
    }
}

impl ProductData {
    pub fn new(product_id: &str, url: &str) -> Self {
        Self {
            id: product_id.to_string(),
            url: url.to_string(),
            ..Self::default()
        }
    }

    /// Record signalling "page had no usable data".
    pub fn empty(product_id: &str, url: &str) -> Self {
        Self::new(product_id, url)
    }

    pub fn is_empty(&self) -> bool {
        self.product_name.trim().is_empty()
    }
}

/// Remove repeated entries, keeping the first occurrence of each.
pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record() {
        let data = ProductData::empty("42", "https://example.com/p/42");
        assert!(data.is_empty());
        assert_eq!(data.id, "42");
        assert_eq!(data.url_tag, "main");
        assert!(data.infos.as_object().unwrap().is_empty());
        assert!(!data.crawled_at.is_empty());
    }

    #[test]
    fn test_whitespace_name_counts_as_empty() {
        let mut data = ProductData::new("1", "u");
        data.product_name = "   ".to_string();
        assert!(data.is_empty());
        data.product_name = "Milo".to_string();
        assert!(!data.is_empty());
    }

    #[test]
    fn test_serialized_field_order() {
        let data = ProductData::new("1", "https://example.com");
        let json = serde_json::to_string(&data).unwrap();
        let keys = [
            "\"id\"",
            "\"url\"",
            "\"url_tag\"",
            "\"crawled_at\"",
            "\"product_name\"",
            "\"brand\"",
            "\"price_current\"",
            "\"price_original\"",
            "\"image_urls_original\"",
            "\"image_urls_simplified\"",
            "\"infos\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(!json.contains("local_images"));
    }

    #[test]
    fn test_deserialize_tolerates_missing_fields() {
        let data: ProductData = serde_json::from_str(r#"{"id": "7", "product_name": "Tea"}"#).unwrap();
        assert_eq!(data.id, "7");
        assert_eq!(data.url_tag, "main");
        assert!(data.image_urls_simplified.is_empty());
        assert_eq!(data.crawled_at, "");
    }

    #[test]
    fn test_dedup_preserving_order() {
        let urls = vec!["b".to_string(), "a".to_string(), "b".to_string(), "c".to_string(), "a".to_string()];
        assert_eq!(dedup_preserving_order(urls), vec!["b", "a", "c"]);
    }
}
