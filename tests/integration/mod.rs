// Integration tests for union-scraper
// These tests drive the pipeline and merge step against a temporary output tree

pub mod merge_tests;
pub mod pipeline_tests;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use union_scraper::{
    AppConfig,
    config::{CrawlerConfig, DebugConfig, FetcherConfig, LoggingConfig, OutputConfig, SiteConfig},
    core::PageFetcher,
    models::ProductData,
};

/// Test configuration rooted at `root`, with delays and image downloads off
pub fn get_test_config(root: &Path) -> AppConfig {
    AppConfig {
        sites: vec![
            site("amazon", "https://www.amazon.sg", "a"),
            site("fairprice", "https://www.fairprice.com.sg", "f"),
            site("shopee", "https://shopee.sg", "s"),
        ],
        input: vec![],
        output: OutputConfig {
            data_dir: root.to_path_buf(),
            html_dir: root.join("html"),
            image_dir: root.to_path_buf(),
        },
        crawler: CrawlerConfig {
            enable_random_delay: false,
            ..CrawlerConfig::default()
        },
        debug: DebugConfig {
            use_local_html: false,
            skip_image_download: true,
        },
        fetcher: FetcherConfig {
            image_timeout_seconds: 5,
            ..FetcherConfig::default()
        },
        logging: LoggingConfig::default(),
    }
}

fn site(name: &str, base_url: &str, prefix: &str) -> SiteConfig {
    SiteConfig {
        name: name.to_string(),
        base_url: base_url.to_string(),
        prefix: prefix.to_string(),
        keyword: None,
    }
}

/// Fetcher serving fixed HTML per URL
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, String>,
    saved: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Snapshot filenames the pipeline asked to be saved
    pub fn saved_snapshots(&self) -> Vec<String> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str, save_path: Option<&Path>, filename: Option<&str>) -> Option<String> {
        let html = self.pages.get(url).cloned()?;
        if let (Some(dir), Some(name)) = (save_path, filename) {
            union_scraper::core::page_fetcher::save_snapshot(dir, name, &html).ok()?;
            self.saved.lock().unwrap().push(name.to_string());
        }
        Some(html)
    }
}

pub fn read_product(path: &Path) -> ProductData {
    let content = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
}

/// Amazon-style page with a title, a price block and an image catalog script
/// whose entries point at `image_host`.
pub fn amazon_page(image_host: &str) -> String {
    format!(
        r#"<html><head><script>
var data = {{
  'colorImages': {{ 'initial': [
    {{"hiRes":"{host}/images/I/71abc._AC_SL1500_.jpg","large":"{host}/images/I/71abc._AC_.jpg","main":{{"{host}/images/I/71abc._AC_SX679_.jpg":[679,679]}}}},
    {{"hiRes":"{host}/images/I/71abc._AC_SL1000_.jpg"}},
    {{"hiRes":null,"large":"{host}/images/I/82xyz._AC_.jpg"}}
  ]}}
}};
</script></head><body>
<span id="productTitle"> Cordless Kettle 1.7L </span>
<a id="bylineInfo">Visit the Tefal Store</a>
<div id="corePriceDisplay_desktop_feature_div">
  <span class="a-price priceToPay"><span aria-hidden="true"><span class="a-price-symbol">S$</span><span class="a-price-whole">1,059.</span><span class="a-price-fraction">5</span></span></span>
</div>
</body></html>"#,
        host = image_host
    )
}
