//! Configuration provider using Figment for fieldmeta

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use tracing::{debug, trace};

use crate::{error::ConfigError, types::EngineConfig, ConfigResult};

/// Prefix of environment variables read by the provider
pub const ENV_PREFIX: &str = "FIELDMETA_";

/// Configuration file format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (.toml extension)
    Toml,
    /// YAML format (.yaml or .yml extensions)
    Yaml,
    /// JSON format (.json extension)
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Detect format from a file path
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| ConfigError::UnsupportedFormat {
            format: ext.to_string(),
        })
    }
}

/// Configuration provider using figment
///
/// Sources are merged in precedence order (later sources override earlier ones):
/// 1. Built-in defaults
/// 2. An optional configuration file
/// 3. `FIELDMETA_` environment variables, nested keys split on `__`
#[derive(Debug, Clone, Default)]
pub struct ConfigProvider {
    file: Option<PathBuf>,
}

impl ConfigProvider {
    /// Create a provider reading defaults and environment only
    pub fn new() -> Self {
        Self::default()
    }

    /// Also read the given configuration file
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Load and validate the engine configuration
    pub fn load(&self) -> ConfigResult<EngineConfig> {
        let config: EngineConfig = self.build_figment()?.extract()?;
        config.validate()?;
        debug!(
            cache_capacity = config.cache.capacity,
            seed_new_rows = config.filter_table.seed_new_rows,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Build the figment with all sources in precedence order
    pub fn build_figment(&self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()));

        if let Some(path) = &self.file {
            figment = figment.merge(Self::load_config_file(path)?);
        }

        trace!(prefix = ENV_PREFIX, "merging environment variables");
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load a single configuration file based on its extension
    fn load_config_file(path: &Path) -> ConfigResult<Figment> {
        if !path.is_file() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        trace!(path = %path.display(), "loading config file");

        Ok(match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => Figment::from(Toml::file(path)),
            ConfigFormat::Yaml => Figment::from(Yaml::file(path)),
            ConfigFormat::Json => Figment::from(Json::file(path)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("yml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("ini"), None);
        assert!(matches!(
            ConfigFormat::from_path(Path::new("engine.ini")),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let provider = ConfigProvider::new().with_file("/definitely/not/here.toml");
        assert!(matches!(
            provider.build_figment(),
            Err(ConfigError::FileNotFound { .. })
        ));
    }
}
