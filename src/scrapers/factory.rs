use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::AppConfig;
use crate::core::site_resolver;
use crate::models::DEFAULT_URL_TAG;
use crate::scrapers::sites::{AmazonAdapter, FairpriceAdapter, ShopeeAdapter};
use crate::scrapers::traits::{AdapterContext, SiteAdapter};
use crate::utils::error::{AppError, Result};

pub type AdapterBox = Box<dyn SiteAdapter>;
pub type AdapterConstructor = fn(AdapterContext) -> AdapterBox;

/// Site name to adapter constructor.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    constructors: HashMap<String, AdapterConstructor>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("amazon", |ctx| Box::new(AmazonAdapter::new(ctx)));
        registry.register("fairprice", |ctx| Box::new(FairpriceAdapter::new(ctx)));
        registry.register("shopee", |ctx| Box::new(ShopeeAdapter::new(ctx)));
        registry
    }

    pub fn register(&mut self, site: &str, constructor: AdapterConstructor) {
        self.constructors.insert(site.to_string(), constructor);
    }

    pub fn get(&self, site: &str) -> Option<AdapterConstructor> {
        self.constructors.get(site).copied()
    }

    pub fn sites(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Builds product-bound adapters from URLs.
pub struct ScraperFactory {
    config: Arc<AppConfig>,
    registry: AdapterRegistry,
}

impl ScraperFactory {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self::with_registry(config, AdapterRegistry::with_defaults())
    }

    pub fn with_registry(config: Arc<AppConfig>, registry: AdapterRegistry) -> Self {
        Self { config, registry }
    }

    pub fn create(&self, url: &str, product_id: &str) -> Result<AdapterBox> {
        self.create_with_tag(url, product_id, DEFAULT_URL_TAG)
    }

    pub fn create_with_tag(&self, url: &str, product_id: &str, url_tag: &str) -> Result<AdapterBox> {
        let site = site_resolver::resolve(url, &self.config.sites)?;
        let constructor = self
            .registry
            .get(&site.name)
            .ok_or_else(|| AppError::AdapterNotImplemented {
                site: site.name.clone(),
            })?;

        debug!(product_id = %product_id, site = %site.name, "Creating adapter");
        let ctx = AdapterContext::new(site.clone(), self.config.output.clone(), product_id, url, url_tag);
        Ok(constructor(ctx))
    }

    pub fn registered_sites(&self) -> Vec<String> {
        self.registry.sites()
    }
}
