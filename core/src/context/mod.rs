mod config;
mod error;
pub mod logging;

pub use config::{AppConfig, AppConfigExt, ChimeSettings, KitchenSettings};
pub use error::ConfigError;
