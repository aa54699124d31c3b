//! Normalizer configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_SOURCE_BYTES, DEFAULT_PARSE_CACHE_CAPACITY, SUPPORTED_LANGUAGES};

/// Configuration for the normalizer subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Cache grammar-shaped parse trees by source hash. Default: true.
    pub cache_enabled: Option<bool>,
    /// Parse cache capacity in entries. Default: 16.
    pub cache_capacity: Option<u64>,
    /// Largest accepted source unit in bytes. Default: 4MB.
    pub max_source_bytes: Option<u64>,
    /// Language tags to normalize. Empty means all supported languages.
    #[serde(default)]
    pub enabled_languages: Vec<String>,
}

impl NormalizerConfig {
    /// Returns whether the parse cache is enabled, defaulting to true.
    pub fn effective_cache_enabled(&self) -> bool {
        self.cache_enabled.unwrap_or(true)
    }

    /// Returns the effective cache capacity, defaulting to 16.
    pub fn effective_cache_capacity(&self) -> u64 {
        self.cache_capacity.unwrap_or(DEFAULT_PARSE_CACHE_CAPACITY)
    }

    /// Returns the effective source size limit, defaulting to 4MB.
    pub fn effective_max_source_bytes(&self) -> u64 {
        self.max_source_bytes.unwrap_or(DEFAULT_MAX_SOURCE_BYTES)
    }

    /// Whether the language with tag `language` should be normalized.
    pub fn is_language_enabled(&self, language: &str) -> bool {
        if self.enabled_languages.is_empty() {
            return SUPPORTED_LANGUAGES.contains(&language);
        }
        self.enabled_languages.iter().any(|l| l == language)
    }
}
