//! Semantics-layer errors.
//!
//! These are the runtime errors of the modelled languages (a Python
//! `TypeError`, a division by zero) surfaced as typed values. The semantics
//! layer never recovers from them; that policy belongs to the caller.

use super::error_code::{self, PolyglotErrorCode};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SemanticsError {
    #[error("{language}: unsupported operand types for {operation}: '{left}' and '{right}'")]
    TypeError {
        language: String,
        operation: String,
        left: String,
        right: String,
    },

    #[error("{language}: {message}")]
    ValueError { language: String, message: String },

    #[error("{language}: division by zero in {operation}")]
    ZeroDivision { language: String, operation: String },

    #[error("{language}: operator {operator} has no semantics in this language")]
    UnsupportedOperator { language: String, operator: String },

    #[error("No semantics registered for language {language}")]
    UnknownLanguage { language: String },

    #[error("Cannot build symbolic {operation}: {message}")]
    Symbolic { operation: String, message: String },
}

impl PolyglotErrorCode for SemanticsError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::TypeError { .. } => error_code::TYPE_ERROR,
            Self::ValueError { .. } => error_code::VALUE_ERROR,
            Self::ZeroDivision { .. } => error_code::ZERO_DIVISION,
            Self::UnsupportedOperator { .. } => error_code::UNSUPPORTED_OPERATOR,
            Self::UnknownLanguage { .. } => error_code::UNSUPPORTED_LANGUAGE,
            Self::Symbolic { .. } => error_code::SYMBOLIC_ERROR,
        }
    }
}

pub type SemanticsResult<T> = Result<T, SemanticsError>;
