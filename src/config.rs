use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub sites: Vec<SiteConfig>,
    #[serde(default)]
    pub input: Vec<InputFileConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One scrapable site: display name, home URL and artifact file prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteConfig {
    pub name: String,
    pub base_url: String,
    pub prefix: String,
    /// Substring matched against lowercased product URLs. Derived from
    /// `base_url` when not set.
    #[serde(default)]
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputFileConfig {
    pub path: PathBuf,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Per-product folders with JSON artifacts, and the merged document.
    pub data_dir: PathBuf,
    /// Raw HTML snapshots.
    pub html_dir: PathBuf,
    /// Root for per-product image folders.
    pub image_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub enable_random_delay: bool,
    pub min_sleep_seconds: f64,
    pub max_sleep_seconds: f64,
    pub enable_merge_json: bool,
    /// Re-save each product JSON after its images are downloaded so the
    /// artifact carries `local_images`.
    pub persist_local_images: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub use_local_html: bool,
    pub skip_image_download: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Fixed render wait after navigation, in seconds.
    pub wait_seconds: u64,
    pub user_agent: String,
    pub window_width: u32,
    pub window_height: u32,
    pub chrome_path: Option<String>,
    pub image_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_name: String,
    pub filter: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("output"),
            html_dir: PathBuf::from("output/html"),
            image_dir: PathBuf::from("output"),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            enable_random_delay: true,
            min_sleep_seconds: 1.0,
            max_sleep_seconds: 5.0,
            enable_merge_json: false,
            persist_local_images: false,
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            wait_seconds: 5,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36".to_string(),
            window_width: 1280,
            window_height: 800,
            chrome_path: None,
            image_timeout_seconds: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_name: "log.txt".to_string(),
            filter: "union_scraper=info".to_string(),
        }
    }
}

impl SiteConfig {
    /// Lowercased match keyword: explicit `keyword`, else `base_url` without
    /// scheme, leading `www.` and trailing slash.
    pub fn match_keyword(&self) -> String {
        if let Some(keyword) = &self.keyword {
            return keyword.trim().to_lowercase();
        }

        let lowered = self.base_url.trim().to_lowercase();
        let without_scheme = lowered
            .strip_prefix("https://")
            .or_else(|| lowered.strip_prefix("http://"))
            .unwrap_or(&lowered);
        without_scheme
            .strip_prefix("www.")
            .unwrap_or(without_scheme)
            .trim_end_matches('/')
            .to_string()
    }
}

impl AppConfig {
    /// Load layered configuration: `config/default`, `config/{RUN_MODE}`,
    /// `config/local`, an optional explicit file, then `SCRAPER__*` env vars.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let s = builder
            .add_source(Environment::with_prefix("SCRAPER").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        if config.fetcher.chrome_path.is_none() {
            config.fetcher.chrome_path = env::var("CHROME_PATH").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn site(&self, name: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| site.name == name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sites.is_empty() {
            return Err(ConfigError::Message("At least one site must be configured".into()));
        }

        for site in &self.sites {
            if site.name.trim().is_empty() {
                return Err(ConfigError::Message("Site name must not be empty".into()));
            }
            if Url::parse(&site.base_url).is_err() {
                return Err(ConfigError::Message(format!(
                    "Invalid base_url for site '{}': {}",
                    site.name, site.base_url
                )));
            }
            if site.prefix.is_empty() || site.prefix.contains('_') {
                return Err(ConfigError::Message(format!(
                    "Site '{}' prefix must be non-empty and contain no '_'",
                    site.name
                )));
            }
            if site.match_keyword().is_empty() {
                return Err(ConfigError::Message(format!(
                    "Site '{}' has an empty match keyword",
                    site.name
                )));
            }
        }

        // Resolution takes the first keyword found in the URL, so keywords
        // must not contain one another.
        for (i, a) in self.sites.iter().enumerate() {
            for b in self.sites.iter().skip(i + 1) {
                if a.name == b.name {
                    return Err(ConfigError::Message(format!("Duplicate site name '{}'", a.name)));
                }
                if a.prefix == b.prefix {
                    return Err(ConfigError::Message(format!(
                        "Sites '{}' and '{}' share prefix '{}'",
                        a.name, b.name, a.prefix
                    )));
                }
                let (ka, kb) = (a.match_keyword(), b.match_keyword());
                if ka.contains(&kb) || kb.contains(&ka) {
                    return Err(ConfigError::Message(format!(
                        "Site keywords overlap: '{}' ({}) and '{}' ({})",
                        ka, a.name, kb, b.name
                    )));
                }
            }
        }

        if self.crawler.enable_random_delay {
            if self.crawler.min_sleep_seconds < 0.0 {
                return Err(ConfigError::Message("crawler.min_sleep_seconds must not be negative".into()));
            }
            if self.crawler.max_sleep_seconds < self.crawler.min_sleep_seconds {
                return Err(ConfigError::Message(
                    "crawler.max_sleep_seconds cannot be less than min_sleep_seconds".into(),
                ));
            }
        }

        if self.fetcher.wait_seconds == 0 {
            return Err(ConfigError::Message("fetcher.wait_seconds must be greater than 0".into()));
        }

        if self.fetcher.image_timeout_seconds == 0 {
            return Err(ConfigError::Message("fetcher.image_timeout_seconds must be greater than 0".into()));
        }

        Ok(())
    }
}
