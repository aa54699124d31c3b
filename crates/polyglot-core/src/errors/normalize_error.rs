//! Normalization errors.

use super::error_code::{self, PolyglotErrorCode};
use super::ParseError;

/// Errors raised while converting a native tree into IR.
///
/// `UnsupportedConstruct` is always fatal for the unit: a construct with no
/// registered handler is never skipped.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Parse failure: {0}")]
    Parse(#[from] ParseError),

    #[error("Unsupported {language} construct `{kind}` at {line}:{column}")]
    UnsupportedConstruct {
        language: String,
        kind: String,
        line: u32,
        column: u32,
    },

    #[error("{language} node `{kind}` at line {line} has no `{field}` field")]
    MissingField {
        language: String,
        kind: String,
        field: String,
        line: u32,
    },

    #[error("Invalid {language} literal `{text}` at line {line}")]
    InvalidLiteral {
        language: String,
        text: String,
        line: u32,
    },

    #[error("Language {language} is disabled by configuration")]
    LanguageDisabled { language: String },

    #[error("Cannot determine language for {path}")]
    UnknownLanguage { path: String },

    #[error("I/O error reading {path}: {message}")]
    Io { path: String, message: String },
}

impl NormalizeError {
    /// The native node kind named by an `UnsupportedConstruct`, if this is one.
    pub fn unsupported_kind(&self) -> Option<&str> {
        match self {
            Self::UnsupportedConstruct { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

impl PolyglotErrorCode for NormalizeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(e) => e.error_code(),
            Self::UnsupportedConstruct { .. } => error_code::UNSUPPORTED_CONSTRUCT,
            Self::MissingField { .. } => error_code::MISSING_FIELD,
            Self::InvalidLiteral { .. } => error_code::INVALID_LITERAL,
            Self::LanguageDisabled { .. } => error_code::LANGUAGE_DISABLED,
            Self::UnknownLanguage { .. } => error_code::UNSUPPORTED_LANGUAGE,
            Self::Io { .. } => error_code::IO_ERROR,
        }
    }
}

/// Result alias used throughout the normalizers.
pub type NormalizeResult<T> = Result<T, NormalizeError>;
