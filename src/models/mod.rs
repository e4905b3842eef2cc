pub mod file_manager;
pub mod input;
pub mod product_data;

// Re-exports for convenience
pub use file_manager::*;
pub use input::*;
pub use product_data::*;
