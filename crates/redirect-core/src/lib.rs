pub mod config;
pub mod types;

pub use config::{ConfigError, RedirectConfig};
pub use types::*;
