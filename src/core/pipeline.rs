use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::core::image_downloader::ImageDownloader;
use crate::core::merge::{merge, write_merged};
use crate::core::page_fetcher::PageFetcher;
use crate::models::ProductInputRecord;
use crate::scrapers::{ParseOutcome, ScraperFactory, SiteAdapter};
use crate::utils::error::Result;

/// Counters for one pass over the input.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub skipped_invalid_url: usize,
    pub skipped_unsupported: usize,
    pub fetch_failed: usize,
    pub parsed: usize,
    pub empty: usize,
    pub failed: usize,
    pub images_downloaded: usize,
    pub merged: bool,
}

/// How the persisted record came out of the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SavedAs {
    Parsed,
    Empty,
    Fallback,
}

/// What happened to a single input record.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RecordStatus {
    InvalidUrl,
    Unsupported,
    NoHtml,
    Saved { kind: SavedAs, images: usize },
}

/// Drives every input record through fetch, parse, persist and image
/// download, one at a time. An adapter parse error still persists an empty
/// fallback record; any other failure is logged and the record skipped.
pub struct PipelineOrchestrator {
    config: Arc<AppConfig>,
    factory: ScraperFactory,
    fetcher: Arc<dyn PageFetcher>,
    downloader: ImageDownloader,
}

impl PipelineOrchestrator {
    pub fn new(config: Arc<AppConfig>, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        let factory = ScraperFactory::new(Arc::clone(&config));
        Self::with_factory(config, factory, fetcher)
    }

    pub fn with_factory(
        config: Arc<AppConfig>,
        factory: ScraperFactory,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self> {
        let downloader = ImageDownloader::new(
            Duration::from_secs(config.fetcher.image_timeout_seconds),
            &config.fetcher.user_agent,
        )?;
        Ok(Self {
            config,
            factory,
            fetcher,
            downloader,
        })
    }

    pub async fn run(&self, records: &[ProductInputRecord]) -> RunSummary {
        let mut summary = RunSummary {
            total: records.len(),
            ..RunSummary::default()
        };

        for (idx, record) in records.iter().enumerate() {
            info!(
                product_id = %record.id,
                url = %record.url,
                "({}/{}) Processing product",
                idx + 1,
                records.len()
            );

            match self.process_record(record).await {
                Ok(RecordStatus::InvalidUrl) => summary.skipped_invalid_url += 1,
                Ok(RecordStatus::Unsupported) => summary.skipped_unsupported += 1,
                Ok(RecordStatus::NoHtml) => summary.fetch_failed += 1,
                Ok(RecordStatus::Saved { kind, images }) => {
                    match kind {
                        SavedAs::Parsed => summary.parsed += 1,
                        SavedAs::Empty => summary.empty += 1,
                        SavedAs::Fallback => summary.failed += 1,
                    }
                    summary.images_downloaded += images;
                    self.random_delay().await;
                }
                Err(e) => {
                    error!(product_id = %record.id, url = %record.url, "Failed to process product: {}", e);
                    summary.failed += 1;
                }
            }
        }

        if self.config.crawler.enable_merge_json {
            summary.merged = self.merge_outputs();
        }

        info!(
            total = summary.total,
            parsed = summary.parsed,
            empty = summary.empty,
            failed = summary.failed,
            skipped_invalid_url = summary.skipped_invalid_url,
            skipped_unsupported = summary.skipped_unsupported,
            fetch_failed = summary.fetch_failed,
            images = summary.images_downloaded,
            "Run finished"
        );
        summary
    }

    async fn process_record(&self, record: &ProductInputRecord) -> Result<RecordStatus> {
        if !record.has_scrapable_url() {
            info!(product_id = %record.id, "Skipping invalid URL: {}", record.url);
            return Ok(RecordStatus::InvalidUrl);
        }

        let adapter = match self.factory.create(record.url.trim(), &record.id) {
            Ok(adapter) => adapter,
            Err(e) if e.is_classification() => {
                warn!(product_id = %record.id, "Skipping record: {}", e);
                return Ok(RecordStatus::Unsupported);
            }
            Err(e) => return Err(e),
        };

        let Some(html) = self.obtain_html(adapter.as_ref(), &record.id).await else {
            return Ok(RecordStatus::NoHtml);
        };

        let outcome = adapter.parse(&html);
        let kind = match &outcome {
            ParseOutcome::Parsed(_) => SavedAs::Parsed,
            ParseOutcome::Empty { reason, .. } => {
                warn!(product_id = %record.id, "Saving empty record: {}", reason);
                SavedAs::Empty
            }
            ParseOutcome::Error { cause, .. } => {
                error!(product_id = %record.id, url = %record.url, stage = "parse", "Saving empty fallback record: {}", cause);
                SavedAs::Fallback
            }
        };
        let data = outcome.into_record();

        let output_dir = &self.config.output.data_dir;
        adapter.save_product_data(&data, output_dir)?;

        let mut images = 0;
        if self.config.debug.skip_image_download {
            info!(product_id = %record.id, "Skipping image download");
        } else {
            let mut data = data;
            let saved = adapter.download_images(&self.downloader, &data).await;
            images = saved.len();

            let folder = adapter.context().file_manager.product_folder().to_string();
            data.local_images = Some(
                saved
                    .iter()
                    .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
                    .map(|name| format!("{}/{}", folder, name))
                    .collect(),
            );

            if self.config.crawler.persist_local_images {
                adapter.save_product_data(&data, output_dir)?;
            }
        }

        Ok(RecordStatus::Saved { kind, images })
    }

    /// Snapshot replay in local mode, otherwise the adapter's fetch path.
    /// `None` means there is nothing to parse for this record.
    async fn obtain_html(&self, adapter: &dyn SiteAdapter, product_id: &str) -> Option<String> {
        let result = if self.config.debug.use_local_html {
            info!(product_id = %product_id, "Using local HTML file");
            adapter.get_local_html().map(Some)
        } else {
            info!(product_id = %product_id, "Fetching page");
            adapter.fetch_page(self.fetcher.as_ref()).await
        };

        match result {
            Ok(Some(html)) if !html.trim().is_empty() => Some(html),
            Ok(_) => {
                error!(product_id = %product_id, stage = "fetch", "No HTML retrieved");
                None
            }
            Err(e) => {
                error!(product_id = %product_id, stage = "fetch", "Failed to get HTML: {}", e);
                None
            }
        }
    }

    async fn random_delay(&self) {
        let crawler = &self.config.crawler;
        if !crawler.enable_random_delay || crawler.max_sleep_seconds <= 0.0 {
            return;
        }

        let min = crawler.min_sleep_seconds.max(0.0);
        let max = crawler.max_sleep_seconds.max(min);
        let seconds = rand::thread_rng().gen_range(min..=max);
        info!("Sleeping for {:.2} seconds", seconds);
        tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
    }

    /// Merge failures abort the merge only.
    fn merge_outputs(&self) -> bool {
        let output_dir = &self.config.output.data_dir;
        match merge(output_dir, &self.config.sites).and_then(|doc| write_merged(output_dir, &doc, false)) {
            Ok(_) => true,
            Err(e) => {
                error!("Merge step failed: {}", e);
                false
            }
        }
    }
}
