use super::*;
use std::sync::Arc;
use union_scraper::core::{PipelineOrchestrator, merge, write_merged};
use union_scraper::models::ProductInputRecord;

fn write_json(dir: &Path, folder: &str, filename: &str, data: &ProductData) {
    let folder = dir.join(folder);
    std::fs::create_dir_all(&folder).unwrap();
    std::fs::write(folder.join(filename), serde_json::to_string_pretty(data).unwrap()).unwrap();
}

fn product(id: &str, name: &str) -> ProductData {
    let mut data = ProductData::new(id, "https://example.com");
    data.product_name = name.to_string();
    data
}

#[test]
fn test_merge_twice_yields_identical_products() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = get_test_config(dir.path());
    write_json(dir.path(), "7", "a_7.json", &product("7", "Kettle"));
    write_json(dir.path(), "7", "s_7.json", &product("7", "Kettle"));
    write_json(dir.path(), "8", "f_8.json", &product("8", "Milo"));
    std::fs::write(dir.path().join("7").join("a_7_1.jpg"), b"x")?;
    std::fs::write(dir.path().join("7").join("s_7_1.jpg"), b"y")?;

    let first = merge(dir.path(), &config.sites)?;
    let first_path = write_merged(dir.path(), &first, false)?;
    let second = merge(dir.path(), &config.sites)?;
    write_merged(dir.path(), &second, false)?;

    assert_eq!(first.products, second.products);
    assert_eq!(first_path, dir.path().join("merge.json"));

    let on_disk: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&first_path)?)?;
    assert_eq!(on_disk["products"], serde_json::to_value(&second.products)?);
    Ok(())
}

#[test]
fn test_manifest_is_isolated_per_site_prefix() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = get_test_config(dir.path());
    write_json(dir.path(), "5", "a_5.json", &product("5", "Air Fryer"));
    for name in ["a_5_1.jpg", "a_5_2.jpg", "s_5_1.jpg", "s_5_2.jpg", "s_5_3.jpg"] {
        std::fs::write(dir.path().join("5").join(name), b"img")?;
    }

    let doc = merge(dir.path(), &config.sites)?;

    assert_eq!(doc.products.len(), 1);
    let images = doc.products["amazon"][0].local_images.clone().unwrap_or_default();
    assert_eq!(images, vec!["5/a_5_1.jpg", "5/a_5_2.jpg"]);
    assert!(images.iter().all(|p| !p.contains("/s_")));
    Ok(())
}

#[tokio::test]
async fn test_pipeline_then_merge() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = get_test_config(dir.path());
    config.crawler.enable_merge_json = true;

    let page = amazon_page("https://img.invalid");
    let fetcher = Arc::new(
        StubFetcher::default()
            .with_page("https://www.amazon.sg/dp/2", &page)
            .with_page("https://www.amazon.sg/dp/1", &page),
    );
    let pipeline = PipelineOrchestrator::new(Arc::new(config.clone()), fetcher)?;
    let summary = pipeline
        .run(&[
            ProductInputRecord::new("2", "https://www.amazon.sg/dp/2"),
            ProductInputRecord::new("1", "https://www.amazon.sg/dp/1"),
        ])
        .await;
    assert!(summary.merged);

    let doc: union_scraper::core::MergedDocument =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("merge.json"))?)?;
    let ids: Vec<_> = doc.products["amazon"].iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert!(doc.products["amazon"].iter().all(|p| p.local_images == Some(vec![])));
    Ok(())
}
