pub mod amazon;
pub mod fairprice;
pub mod shopee;

pub use amazon::AmazonAdapter;
pub use fairprice::FairpriceAdapter;
pub use shopee::ShopeeAdapter;
