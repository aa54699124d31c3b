//! PolyglotErrorCode trait: stable, machine-readable error codes.

/// Every error enum implements this to expose a structured error code string
/// that callers can match on without parsing messages.
pub trait PolyglotErrorCode {
    /// Returns the error code string (e.g., "UNSUPPORTED_CONSTRUCT").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

// Error code constants.
pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const SYNTAX_ERROR: &str = "SYNTAX_ERROR";
pub const SOURCE_TOO_LARGE: &str = "SOURCE_TOO_LARGE";
pub const UNSUPPORTED_CONSTRUCT: &str = "UNSUPPORTED_CONSTRUCT";
pub const MISSING_FIELD: &str = "MISSING_FIELD";
pub const INVALID_LITERAL: &str = "INVALID_LITERAL";
pub const UNSUPPORTED_LANGUAGE: &str = "UNSUPPORTED_LANGUAGE";
pub const LANGUAGE_DISABLED: &str = "LANGUAGE_DISABLED";
pub const IO_ERROR: &str = "IO_ERROR";
pub const TYPE_ERROR: &str = "TYPE_ERROR";
pub const VALUE_ERROR: &str = "VALUE_ERROR";
pub const ZERO_DIVISION: &str = "ZERO_DIVISION";
pub const UNSUPPORTED_OPERATOR: &str = "UNSUPPORTED_OPERATOR";
pub const SYMBOLIC_ERROR: &str = "SYMBOLIC_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
