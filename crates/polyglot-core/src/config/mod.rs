//! Configuration system for polyglot.
//! TOML-based, layered resolution: overrides > env > project > user > defaults.

pub mod normalizer_config;
pub mod polyglot_config;

pub use normalizer_config::NormalizerConfig;
pub use polyglot_config::{ConfigOverrides, PolyglotConfig};
