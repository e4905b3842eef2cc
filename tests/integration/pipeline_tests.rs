use super::*;
use std::sync::Arc;
use union_scraper::core::PipelineOrchestrator;
use union_scraper::models::ProductInputRecord;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_end_to_end_with_stub_fetcher() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = get_test_config(dir.path());
    let fetcher = Arc::new(StubFetcher::default().with_page("https://amazon.sg/x", &amazon_page("https://img.invalid")));

    let pipeline = PipelineOrchestrator::new(Arc::new(config), fetcher.clone())?;
    let summary = pipeline
        .run(&[ProductInputRecord::new("1", "https://amazon.sg/x")])
        .await;

    assert_eq!(summary.parsed, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(fetcher.saved_snapshots(), vec!["a_1.html"]);
    assert!(dir.path().join("html").join("a_1.html").exists());

    let data = read_product(&dir.path().join("1").join("a_1.json"));
    assert_eq!(data.id, "1");
    assert_eq!(data.product_name, "Cordless Kettle 1.7L");
    assert_eq!(data.price_current, "1059.50");
    assert_eq!(data.brand, "Visit the Tefal Store");
    assert_eq!(data.image_urls_original.len(), 3);
    assert_eq!(
        data.image_urls_simplified,
        vec![
            "https://img.invalid/images/I/71abc.jpg",
            "https://img.invalid/images/I/82xyz.jpg",
        ]
    );
    assert!(data.local_images.is_none());
    Ok(())
}

#[tokio::test]
async fn test_invalid_urls_do_not_stop_the_batch() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = get_test_config(dir.path());
    let page = amazon_page("https://img.invalid");
    let fetcher = Arc::new(
        StubFetcher::default()
            .with_page("https://www.amazon.sg/dp/10", &page)
            .with_page("https://www.amazon.sg/dp/12", &page),
    );

    let pipeline = PipelineOrchestrator::new(Arc::new(config), fetcher)?;
    let summary = pipeline
        .run(&[
            ProductInputRecord::new("10", "https://www.amazon.sg/dp/10"),
            ProductInputRecord::new("11", "ftp://www.amazon.sg/dp/11"),
            ProductInputRecord::new("13", "--"),
            ProductInputRecord::new("12", "https://www.amazon.sg/dp/12"),
        ])
        .await;

    assert_eq!(summary.total, 4);
    assert_eq!(summary.skipped_invalid_url, 2);
    assert_eq!(summary.parsed, 2);
    assert!(dir.path().join("10").join("a_10.json").exists());
    assert!(dir.path().join("12").join("a_12.json").exists());
    assert!(!dir.path().join("11").exists());
    Ok(())
}

#[tokio::test]
async fn test_json_ld_site_without_data_island_saves_empty_record() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = get_test_config(dir.path());
    let url = "https://www.fairprice.com.sg/product/milo-20";
    let fetcher = Arc::new(StubFetcher::default().with_page(url, "<html><body><h1 class=\"product-name\">Milo</h1></body></html>"));

    let pipeline = PipelineOrchestrator::new(Arc::new(config), fetcher)?;
    let summary = pipeline.run(&[ProductInputRecord::new("20", url)]).await;

    assert_eq!(summary.empty, 1);
    assert_eq!(summary.failed, 0);
    let data = read_product(&dir.path().join("20").join("f_20.json"));
    assert!(data.is_empty());
    assert_eq!(data.price_current, "");
    Ok(())
}

#[tokio::test]
async fn test_replay_only_site_without_snapshot_is_skipped() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = get_test_config(dir.path());
    let url = "https://shopee.sg/Band-i.1.30";
    // The fetcher has the page, but this site never navigates live.
    let fetcher = Arc::new(StubFetcher::default().with_page(url, "<h1>Band</h1>"));

    let pipeline = PipelineOrchestrator::new(Arc::new(config), fetcher.clone())?;
    let summary = pipeline.run(&[ProductInputRecord::new("30", url)]).await;

    assert_eq!(summary.fetch_failed, 1);
    assert!(fetcher.saved_snapshots().is_empty());
    assert!(!dir.path().join("30").exists());
    Ok(())
}

#[tokio::test]
async fn test_images_downloaded_and_recorded() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images/I/71abc.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-1".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/I/82xyz.jpg"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let mut config = get_test_config(dir.path());
    config.debug.skip_image_download = false;
    config.crawler.persist_local_images = true;

    let url = "https://www.amazon.sg/dp/40";
    let fetcher = Arc::new(StubFetcher::default().with_page(url, &amazon_page(&server.uri())));
    let pipeline = PipelineOrchestrator::new(Arc::new(config), fetcher)?;
    let summary = pipeline.run(&[ProductInputRecord::new("40", url)]).await;

    assert_eq!(summary.images_downloaded, 1);
    assert_eq!(std::fs::read(dir.path().join("40").join("a_40_1.jpg"))?, b"jpeg-1");
    assert!(!dir.path().join("40").join("a_40_2.jpg").exists());

    let data = read_product(&dir.path().join("40").join("a_40.json"));
    assert_eq!(data.local_images, Some(vec!["40/a_40_1.jpg".to_string()]));
    Ok(())
}
