//! Top-level polyglot configuration with layered resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::NormalizerConfig;
use crate::constants::{PROJECT_CONFIG_FILE, SUPPORTED_LANGUAGES};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Programmatic overrides (applied via `apply_overrides`)
/// 2. Environment variables (`POLYGLOT_*`)
/// 3. Project config (`polyglot.toml` in project root)
/// 4. User config (`~/.polyglot/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PolyglotConfig {
    pub normalizer: NormalizerConfig,
}

/// Override arguments that take precedence over every file and env layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub cache_enabled: Option<bool>,
    pub cache_capacity: Option<u64>,
    pub max_source_bytes: Option<u64>,
    pub enabled_languages: Option<Vec<String>>,
}

impl PolyglotConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, overrides: Option<&ConfigOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        // Layer 3: project config
        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): overrides
        if let Some(overrides) = overrides {
            Self::apply_overrides(&mut config, overrides);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &PolyglotConfig) -> Result<(), ConfigError> {
        let normalizer = &config.normalizer;
        if normalizer.cache_capacity == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "normalizer.cache_capacity".to_string(),
                message: "must be greater than 0 (disable the cache with cache_enabled = false)"
                    .to_string(),
            });
        }
        if normalizer.max_source_bytes == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "normalizer.max_source_bytes".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(unknown) = normalizer
            .enabled_languages
            .iter()
            .find(|l| !SUPPORTED_LANGUAGES.contains(&l.as_str()))
        {
            return Err(ConfigError::InvalidValue {
                field: "normalizer.enabled_languages".to_string(),
                message: format!("unknown language `{unknown}`"),
            });
        }
        Ok(())
    }

    fn user_config_path() -> Option<std::path::PathBuf> {
        home_dir().map(|h| h.join(".polyglot").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are ignored.
    fn merge_toml_file(config: &mut PolyglotConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: PolyglotConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins wherever it has a value.
    fn merge(base: &mut PolyglotConfig, other: &PolyglotConfig) {
        let (b, o) = (&mut base.normalizer, &other.normalizer);
        if o.cache_enabled.is_some() {
            b.cache_enabled = o.cache_enabled;
        }
        if o.cache_capacity.is_some() {
            b.cache_capacity = o.cache_capacity;
        }
        if o.max_source_bytes.is_some() {
            b.max_source_bytes = o.max_source_bytes;
        }
        if !o.enabled_languages.is_empty() {
            b.enabled_languages = o.enabled_languages.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `POLYGLOT_NORMALIZER_CACHE_CAPACITY`, etc.
    fn apply_env_overrides(config: &mut PolyglotConfig) {
        if let Ok(val) = std::env::var("POLYGLOT_NORMALIZER_CACHE_ENABLED") {
            if let Ok(v) = val.parse::<bool>() {
                config.normalizer.cache_enabled = Some(v);
            }
        }
        if let Ok(val) = std::env::var("POLYGLOT_NORMALIZER_CACHE_CAPACITY") {
            if let Ok(v) = val.parse::<u64>() {
                config.normalizer.cache_capacity = Some(v);
            }
        }
        if let Ok(val) = std::env::var("POLYGLOT_NORMALIZER_MAX_SOURCE_BYTES") {
            if let Ok(v) = val.parse::<u64>() {
                config.normalizer.max_source_bytes = Some(v);
            }
        }
        if let Ok(val) = std::env::var("POLYGLOT_NORMALIZER_LANGUAGES") {
            let languages: Vec<String> = val
                .split(',')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !languages.is_empty() {
                config.normalizer.enabled_languages = languages;
            }
        }
    }

    /// Apply programmatic overrides (highest priority).
    pub fn apply_overrides(config: &mut PolyglotConfig, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.cache_enabled {
            config.normalizer.cache_enabled = Some(v);
        }
        if let Some(v) = overrides.cache_capacity {
            config.normalizer.cache_capacity = Some(v);
        }
        if let Some(v) = overrides.max_source_bytes {
            config.normalizer.max_source_bytes = Some(v);
        }
        if let Some(ref v) = overrides.enabled_languages {
            config.normalizer.enabled_languages = v.clone();
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<std::path::PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(std::path::PathBuf::from)
}
