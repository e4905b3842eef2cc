use crate::models::product_data::DEFAULT_URL_TAG;

/// Deterministic artifact names for one (site prefix, product id, url tag).
///
/// The same key always yields the same names, so re-running a product
/// overwrites its previous artifacts instead of accumulating new ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileManager {
    prefix: String,
    product_id: String,
    url_tag: String,
}

impl FileManager {
    pub fn new(prefix: &str, product_id: &str, url_tag: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            product_id: product_id.to_string(),
            url_tag: url_tag.to_string(),
        }
    }

    fn stem(&self) -> String {
        if self.url_tag == DEFAULT_URL_TAG {
            format!("{}_{}", self.prefix, self.product_id)
        } else {
            format!("{}_{}_{}", self.prefix, self.product_id, self.url_tag)
        }
    }

    pub fn html_filename(&self) -> String {
        format!("{}.html", self.stem())
    }

    pub fn json_filename(&self) -> String {
        format!("{}.json", self.stem())
    }

    /// Image names are 1-based: `{prefix}_{id}_1.jpg`, `{prefix}_{id}_2.jpg`, ...
    pub fn image_filename(&self, index: usize) -> String {
        format!("{}_{}.jpg", self.stem(), index)
    }

    pub fn product_folder(&self) -> &str {
        &self.product_id
    }
}

/// Site prefix of an artifact file name (`a_12.json` -> `a`).
pub fn prefix_of(filename: &str) -> &str {
    filename.split('_').next().unwrap_or_default()
}
