//! Shared constants for the polyglot engine.

/// polyglot version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default capacity of the grammar-shaped parse cache (entries).
pub const DEFAULT_PARSE_CACHE_CAPACITY: u64 = 16;

/// Largest source unit accepted for normalization (default: 4MB).
pub const DEFAULT_MAX_SOURCE_BYTES: u64 = 4 * 1_048_576;

/// Largest string (bytes) or sequence (elements) constant folding will build
/// by repetition.
pub const MAX_FOLDED_SEQUENCE_LEN: usize = 1_048_576;

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "polyglot.toml";

/// Environment variable holding the tracing filter.
pub const LOG_ENV_VAR: &str = "POLYGLOT_LOG";

// ---- Supported Languages ----

/// Number of supported input languages.
pub const SUPPORTED_LANGUAGE_COUNT: usize = 3;

/// Language tags as they appear in `source_language`.
pub const SUPPORTED_LANGUAGES: [&str; SUPPORTED_LANGUAGE_COUNT] = ["python", "javascript", "java"];
