//! polyglot-core: errors, configuration, tracing, and shared constants for the
//! polyglot IR engine.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
