// Integration tests for union-scraper
//
// These tests run complete scrape and merge passes over a temporary output
// tree, with a stub fetcher standing in for the browser.

mod integration;

use integration::*;
use std::sync::Arc;
use union_scraper::core::PipelineOrchestrator;
use union_scraper::models::ProductInputRecord;

#[tokio::test]
async fn test_rerun_overwrites_artifacts() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let url = "https://www.amazon.sg/dp/77";
    let records = [ProductInputRecord::new("77", url)];

    for _ in 0..2 {
        let fetcher = Arc::new(StubFetcher::default().with_page(url, &amazon_page("https://img.invalid")));
        let pipeline = PipelineOrchestrator::new(Arc::new(get_test_config(dir.path())), fetcher)?;
        let summary = pipeline.run(&records).await;
        assert_eq!(summary.parsed, 1);
    }

    let files: Vec<_> = std::fs::read_dir(dir.path().join("77"))?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(files, vec!["a_77.json"]);

    let data = read_product(&dir.path().join("77").join("a_77.json"));
    assert_eq!(data.product_name, "Cordless Kettle 1.7L");
    Ok(())
}

#[tokio::test]
async fn test_unsupported_site_is_skipped() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let fetcher = Arc::new(StubFetcher::default());
    let pipeline = PipelineOrchestrator::new(Arc::new(get_test_config(dir.path())), fetcher)?;

    let summary = pipeline
        .run(&[ProductInputRecord::new("1", "https://www.lazada.sg/products/1")])
        .await;

    assert_eq!(summary.skipped_unsupported, 1);
    assert_eq!(summary.failed, 0);
    Ok(())
}
