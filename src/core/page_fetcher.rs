use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use tracing::{debug, error, info, warn};

use crate::config::FetcherConfig;

/// Retrieves rendered page markup.
///
/// Implementations return `None` on navigation failure or timeout instead
/// of raising; callers treat `None` as "skip this record".
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, save_path: Option<&Path>, filename: Option<&str>) -> Option<String>;
}

/// Headless Chrome fetcher. One browser per fetch, torn down afterwards.
pub struct ChromeFetcher {
    config: FetcherConfig,
}

impl ChromeFetcher {
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }

    fn launch_options(config: &FetcherConfig) -> Result<LaunchOptions<'static>> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false) // Often needed in containerized environments
            .window_size(Some((config.window_width, config.window_height)))
            .ignore_certificate_errors(true)
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
                OsStr::new("--disable-notifications"),
                OsStr::new("--disable-popup-blocking"),
                OsStr::new("--force-device-scale-factor=1"),
                OsStr::new("--disable-blink-features=AutomationControlled"),
            ])
            .build()
            .map_err(|e| anyhow!("Failed to create launch options: {}", e))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(PathBuf::from(chrome_path));
        }

        Ok(launch_options)
    }

    /// Blocking navigation. The browser is dropped on every exit path.
    fn fetch_blocking(config: &FetcherConfig, url: &str) -> Result<String> {
        let wait = Duration::from_secs(config.wait_seconds);
        let browser = Browser::new(Self::launch_options(config)?)
            .map_err(|e| anyhow!("Failed to launch browser: {}", e))?;

        let tab = browser
            .new_tab()
            .map_err(|e| anyhow!("Failed to create tab: {}", e))?;

        tab.set_default_timeout(wait * 2);
        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| anyhow!("Failed to set user agent: {}", e))?;

        let result = tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| anyhow!("Navigation failed: {}", e))
            .and_then(|tab| {
                // Fixed render wait; an explicit wait-for-selector per site
                // would make this less flaky.
                std::thread::sleep(wait);
                tab.get_content()
                    .map_err(|e| anyhow!("Failed to get page content: {}", e))
            });

        if let Err(e) = tab.close(true) {
            warn!("Error while closing browser tab: {}", e);
        }
        drop(browser);

        result
    }
}

#[async_trait]
impl PageFetcher for ChromeFetcher {
    async fn fetch(&self, url: &str, save_path: Option<&Path>, filename: Option<&str>) -> Option<String> {
        let config = self.config.clone();
        let target = url.to_string();

        let joined = tokio::task::spawn_blocking(move || Self::fetch_blocking(&config, &target)).await;

        let html = match joined {
            Ok(Ok(html)) => html,
            Ok(Err(e)) => {
                error!(url = %url, "Failed to fetch page: {}", e);
                return None;
            }
            Err(e) => {
                error!(url = %url, "Browser task failed: {}", e);
                return None;
            }
        };

        if let (Some(dir), Some(name)) = (save_path, filename) {
            if let Err(e) = save_snapshot(dir, name, &html) {
                warn!(url = %url, "Failed to save HTML snapshot {}: {}", name, e);
            } else {
                debug!("Saved HTML snapshot to {}", dir.join(name).display());
            }
        }

        info!(url = %url, bytes = html.len(), "Fetched page");
        Some(html)
    }
}

pub fn save_snapshot(dir: &Path, filename: &str, html: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(filename), html)
}
