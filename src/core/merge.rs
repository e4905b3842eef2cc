use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::SiteConfig;
use crate::models::{ProductData, prefix_of};
use crate::utils::error::Result;
use crate::utils::time::{compact_timestamp, iso_timestamp};

const HTML_DIR_NAME: &str = "html";
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// All persisted products regrouped by site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergedDocument {
    pub merged_at: String,
    pub base_path: String,
    pub products: BTreeMap<String, Vec<ProductData>>,
}

impl MergedDocument {
    pub fn total(&self) -> usize {
        self.products.values().map(Vec::len).sum()
    }
}

/// Collect every per-product JSON under `output_dir` into one document.
///
/// `local_images` of each record is rebuilt from the image files present in
/// its folder that carry the same site prefix, so re-running over unchanged
/// files yields the same `products`.
pub fn merge(output_dir: &Path, sites: &[SiteConfig]) -> Result<MergedDocument> {
    info!("Merging product JSON under {}", output_dir.display());

    let prefix_to_site: HashMap<&str, &str> = sites
        .iter()
        .map(|site| (site.prefix.as_str(), site.name.as_str()))
        .collect();
    let mut products: BTreeMap<String, Vec<ProductData>> = BTreeMap::new();

    for folder in sorted_entries(output_dir)? {
        let Some(folder_name) = file_name(&folder) else {
            continue;
        };
        if !folder.is_dir() || folder_name == HTML_DIR_NAME {
            continue;
        }

        let files = sorted_entries(&folder)?;
        for json_path in files.iter().filter(|p| has_extension(p, &["json"])) {
            let Some(filename) = file_name(json_path) else {
                continue;
            };
            let prefix = prefix_of(&filename);
            let Some(site_name) = prefix_to_site.get(prefix) else {
                warn!("Skipping file with unknown site prefix: {}", json_path.display());
                continue;
            };

            let mut data = match load_product(json_path) {
                Ok(data) => data,
                Err(e) => {
                    error!("Cannot read {}: {}", json_path.display(), e);
                    continue;
                }
            };

            data.local_images = Some(
                files
                    .iter()
                    .filter(|p| has_extension(p, &IMAGE_EXTENSIONS))
                    .filter_map(|p| file_name(p))
                    .filter(|name| prefix_of(name) == prefix)
                    .map(|name| format!("{}/{}", folder_name, name))
                    .collect(),
            );

            products.entry(site_name.to_string()).or_default().push(data);
        }
    }

    products.retain(|_, list| !list.is_empty());

    let base_path = std::fs::canonicalize(output_dir).unwrap_or_else(|_| output_dir.to_path_buf());
    let doc = MergedDocument {
        merged_at: iso_timestamp(),
        base_path: base_path.display().to_string(),
        products,
    };

    info!("Merged {} product files", doc.total());
    for (site, list) in &doc.products {
        info!("- {}: {} products", site, list.len());
    }
    Ok(doc)
}

/// Write `doc` to `merge.json`, or `merge_{YYYYMMDDHHMMSS}.json` when
/// `timestamp_suffix` is set.
pub fn write_merged(output_dir: &Path, doc: &MergedDocument, timestamp_suffix: bool) -> Result<PathBuf> {
    let filename = if timestamp_suffix {
        format!("merge_{}.json", compact_timestamp())
    } else {
        "merge.json".to_string()
    };

    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(filename);
    std::fs::write(&path, serde_json::to_string_pretty(doc)?)?;
    info!("Merged JSON saved to {}", path.display());
    Ok(path)
}

fn load_product(path: &Path) -> Result<ProductData> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.contains(&e.to_lowercase().as_str()))
}
