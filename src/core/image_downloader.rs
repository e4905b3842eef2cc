use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::utils::error::{AppError, Result};

/// Sequential image downloader that tolerates per-URL failures.
pub struct ImageDownloader {
    client: Client,
}

impl ImageDownloader {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Download every URL into `folder`, naming files with `namer(index)`
    /// where `index` starts at 1.
    ///
    /// Returns the saved paths in input order. Failed URLs are logged and
    /// left out, so the result may be shorter than `urls`.
    pub async fn download_all<F>(&self, urls: &[String], folder: &Path, namer: F) -> Vec<PathBuf>
    where
        F: Fn(usize) -> String,
    {
        if urls.is_empty() {
            return Vec::new();
        }

        if let Err(e) = tokio::fs::create_dir_all(folder).await {
            warn!("Cannot create image folder {}: {}", folder.display(), e);
            return Vec::new();
        }

        let total = urls.len();
        info!("Found {} images to download", total);

        let mut saved = Vec::with_capacity(total);
        for (idx, url) in urls.iter().enumerate() {
            let index = idx + 1;
            let path = folder.join(namer(index));
            debug!("Downloading image {}/{}: {}", index, total, url);

            match self.download_one(url, &path).await {
                Ok(()) => {
                    debug!("Saved image to {}", path.display());
                    saved.push(path);
                }
                Err(e) => {
                    warn!(url = %url, "Failed to download image: {}", e);
                }
            }
        }

        info!("Downloaded {}/{} images successfully", saved.len(), total);
        saved
    }

    async fn download_one(&self, url: &str, path: &Path) -> Result<()> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::Fetch(format!("empty response body from {}", url)));
        }
        tokio::fs::write(path, &bytes).await?;
        Ok(())
    }
}
