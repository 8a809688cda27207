//! Typed engine configuration

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ConfigResult;

/// Default capacity of the reference list cache
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Default tracing filter when neither `RUST_LOG` nor `--debug` is given
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Complete configuration of the editing engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cache: CacheConfig,
    pub filter_table: FilterTableConfig,
    pub logging: LoggingConfig,
}

/// Reference list cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of reference lists kept (LRU eviction)
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Filter-table behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterTableConfig {
    /// Seed the reference columns of new rows with the first list item
    pub seed_new_rows: bool,
}

impl Default for FilterTableConfig {
    fn default() -> Self {
        Self {
            seed_new_rows: true,
        }
    }
}

/// Logging settings for the command-line tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EngineConfig {
    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.cache.capacity == 0 {
            return Err(ConfigError::validation("cache.capacity must be at least 1"));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::validation("logging.filter must not be empty"));
        }
        Ok(())
    }

    /// Cache capacity as the non-zero size the LRU needs
    pub fn cache_capacity(&self) -> ConfigResult<NonZeroUsize> {
        NonZeroUsize::new(self.cache.capacity)
            .ok_or_else(|| ConfigError::validation("cache.capacity must be at least 1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.cache.capacity, 64);
        assert!(config.filter_table.seed_new_rows);
        assert_eq!(config.logging.filter, "warn");
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_capacity().unwrap().get(), 64);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = EngineConfig::default();
        config.cache.capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
        assert!(config.cache_capacity().is_err());
    }

    #[test]
    fn test_blank_filter_rejected() {
        let mut config = EngineConfig::default();
        config.logging.filter = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
