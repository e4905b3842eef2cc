pub mod image_downloader;
pub mod input_loader;
pub mod merge;
pub mod page_fetcher;
pub mod pipeline;
pub mod site_resolver;

pub use image_downloader::ImageDownloader;
pub use merge::{MergedDocument, merge, write_merged};
pub use page_fetcher::{ChromeFetcher, PageFetcher};
pub use pipeline::{PipelineOrchestrator, RunSummary};
