pub mod factory;
pub mod sites;
pub mod traits;

pub use factory::{AdapterRegistry, ScraperFactory};
pub use traits::{AdapterContext, ParseOutcome, SiteAdapter};
