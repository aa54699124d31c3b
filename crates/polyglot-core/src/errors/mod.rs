//! Error handling for polyglot.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod error_code;
pub mod normalize_error;
pub mod parse_error;
pub mod semantics_error;

pub use config_error::ConfigError;
pub use error_code::PolyglotErrorCode;
pub use normalize_error::{NormalizeError, NormalizeResult};
pub use parse_error::ParseError;
pub use semantics_error::{SemanticsError, SemanticsResult};
