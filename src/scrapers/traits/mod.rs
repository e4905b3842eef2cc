pub mod adapter;

pub use adapter::{AdapterContext, ParseOutcome, SiteAdapter, format_price};
