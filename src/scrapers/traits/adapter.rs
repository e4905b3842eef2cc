use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{error, info, warn};

use crate::config::{OutputConfig, SiteConfig};
use crate::core::image_downloader::ImageDownloader;
use crate::core::page_fetcher::PageFetcher;
use crate::models::{FileManager, ProductData};
use crate::utils::error::{AppError, Result};

static PRICE_TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d+\.?\d*").ok());

/// Normalize a displayed price into a plain two-decimal string.
///
/// Currency symbols, thousands separators and whitespace are dropped; the
/// first numeric token is kept. `"S$1,234.5"` becomes `"1234.50"`. Returns an
/// empty string when no number is present.
pub fn format_price(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let Some(regex) = PRICE_TOKEN.as_ref() else {
        return String::new();
    };
    let Some(token) = regex.find(&cleaned) else {
        return String::new();
    };

    match Decimal::from_str(token.as_str().trim_end_matches('.')) {
        Ok(value) => {
            let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(2);
            rounded.to_string()
        }
        Err(_) => String::new(),
    }
}

/// Result of running an adapter over one page.
#[derive(Debug)]
pub enum ParseOutcome {
    /// Usable product data.
    Parsed(ProductData),
    /// Page parsed but carried no product data (blank product name).
    Empty { data: ProductData, reason: String },
    /// The adapter failed. `fallback` is an empty record tagged with the
    /// product id and URL.
    Error { fallback: ProductData, cause: String },
}

impl ParseOutcome {
    /// Record to persist. An adapter error yields its empty fallback so the
    /// input is still marked attempted.
    pub fn into_record(self) -> ProductData {
        match self {
            ParseOutcome::Parsed(data) | ParseOutcome::Empty { data, .. } => data,
            ParseOutcome::Error { fallback, .. } => fallback,
        }
    }
}

/// Per-product state shared by every adapter: which site, which product,
/// where its artifacts live.
#[derive(Debug, Clone)]
pub struct AdapterContext {
    pub site: SiteConfig,
    pub product_id: String,
    pub url: String,
    pub url_tag: String,
    pub output: OutputConfig,
    pub file_manager: FileManager,
}

impl AdapterContext {
    pub fn new(site: SiteConfig, output: OutputConfig, product_id: &str, url: &str, url_tag: &str) -> Self {
        let file_manager = FileManager::new(&site.prefix, product_id, url_tag);
        Self {
            site,
            product_id: product_id.to_string(),
            url: url.to_string(),
            url_tag: url_tag.to_string(),
            output,
            file_manager,
        }
    }

    pub fn html_path(&self) -> PathBuf {
        self.output.html_dir.join(self.file_manager.html_filename())
    }

    pub fn json_path(&self, output_dir: &std::path::Path) -> PathBuf {
        output_dir
            .join(self.file_manager.product_folder())
            .join(self.file_manager.json_filename())
    }

    pub fn image_folder(&self) -> PathBuf {
        self.output.image_dir.join(self.file_manager.product_folder())
    }

    pub fn empty_record(&self) -> ProductData {
        let mut data = ProductData::empty(&self.product_id, &self.url);
        data.url_tag = self.url_tag.clone();
        data
    }
}

/// A per-site page-to-`ProductData` extractor bound to one product.
///
/// Implementors provide `context` and `parse_product_data`. Everything else
/// has a shared default; `fetch_page` may be overridden by sites that must
/// not be navigated live.
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    fn context(&self) -> &AdapterContext;

    /// Extract product data from page markup.
    fn parse_product_data(&self, html: &str, product_id: &str, url: &str) -> Result<ProductData>;

    fn site_name(&self) -> &str {
        &self.context().site.name
    }

    /// Read the previously saved snapshot for this product.
    fn get_local_html(&self) -> Result<String> {
        let path = self.context().html_path();
        if !path.exists() {
            return Err(AppError::SnapshotNotFound { path });
        }
        Ok(std::fs::read_to_string(&path)?)
    }

    /// Fetch the live page, saving a snapshot under the deterministic name.
    async fn fetch_page(&self, fetcher: &dyn PageFetcher) -> Result<Option<String>> {
        let ctx = self.context();
        let filename = ctx.file_manager.html_filename();
        Ok(fetcher
            .fetch(&ctx.url, Some(ctx.output.html_dir.as_path()), Some(&filename))
            .await)
    }

    /// Run the adapter, never letting its errors escape.
    fn parse(&self, html: &str) -> ParseOutcome {
        let ctx = self.context();

        if html.trim().is_empty() {
            return ParseOutcome::Empty {
                data: ctx.empty_record(),
                reason: "no HTML content".to_string(),
            };
        }

        match self.parse_product_data(html, &ctx.product_id, &ctx.url) {
            Ok(mut data) => {
                data.url_tag = ctx.url_tag.clone();
                data.price_original = format_price(&data.price_original);
                data.price_current = format_price(&data.price_current);

                if data.is_empty() {
                    warn!(product_id = %ctx.product_id, site = %ctx.site.name, "Parsed HTML but found no product data");
                    ParseOutcome::Empty {
                        data,
                        reason: "product name not found".to_string(),
                    }
                } else {
                    ParseOutcome::Parsed(data)
                }
            }
            Err(e) => {
                error!(
                    product_id = %ctx.product_id,
                    url = %ctx.url,
                    site = %ctx.site.name,
                    "Failed to parse HTML: {}", e
                );
                ParseOutcome::Error {
                    fallback: ctx.empty_record(),
                    cause: e.to_string(),
                }
            }
        }
    }

    /// Download `image_urls_simplified` into `{image_dir}/{id}/`.
    async fn download_images(&self, downloader: &ImageDownloader, data: &ProductData) -> Vec<PathBuf> {
        if data.image_urls_simplified.is_empty() {
            return Vec::new();
        }
        let ctx = self.context();
        let fm = ctx.file_manager.clone();
        downloader
            .download_all(&data.image_urls_simplified, &ctx.image_folder(), |idx| fm.image_filename(idx))
            .await
    }

    /// Write `data` to `{output_dir}/{id}/{prefix}_{id}.json`, overwriting.
    fn save_product_data(&self, data: &ProductData, output_dir: &std::path::Path) -> Result<PathBuf> {
        let ctx = self.context();
        let path = ctx.json_path(output_dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(data)?;
        std::fs::write(&path, content)?;
        info!(product_id = %ctx.product_id, "Saved product data to {}", path.display());
        Ok(path)
    }
}
