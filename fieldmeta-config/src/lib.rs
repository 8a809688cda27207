//! fieldmeta configuration management using Figment
//!
//! Loads [`EngineConfig`] from built-in defaults, an optional file
//! (`.toml`, `.yaml`/`.yml` or `.json`) and `FIELDMETA_` environment
//! variables, in that precedence order.
//!
//! ```no_run
//! use fieldmeta_config::load_configuration;
//!
//! let config = load_configuration(None)?;
//! println!("cache capacity: {}", config.cache.capacity);
//! # Ok::<(), fieldmeta_config::ConfigError>(())
//! ```
//!
//! Environment variables use `__` to reach nested keys:
//! `FIELDMETA_CACHE__CAPACITY=16`, `FIELDMETA_FILTER_TABLE__SEED_NEW_ROWS=false`.

pub mod error;
pub mod provider;
pub mod types;

pub use error::ConfigError;
pub use provider::{ConfigFormat, ConfigProvider, ENV_PREFIX};
pub use types::{
    CacheConfig, EngineConfig, FilterTableConfig, LoggingConfig, DEFAULT_CACHE_CAPACITY,
    DEFAULT_LOG_FILTER,
};

use std::path::Path;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Load the engine configuration, optionally from a file
pub fn load_configuration(file: Option<&Path>) -> ConfigResult<EngineConfig> {
    let provider = match file {
        Some(path) => ConfigProvider::new().with_file(path),
        None => ConfigProvider::new(),
    };
    provider.load()
}
