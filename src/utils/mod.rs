pub mod error;
pub mod html;
pub mod relaxed_json;
pub mod time;

pub use error::{AppError, Result};
