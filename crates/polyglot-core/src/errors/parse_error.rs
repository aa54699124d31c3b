//! Native parser errors.

use std::path::PathBuf;

use super::error_code::{self, PolyglotErrorCode};

/// Errors raised while handing source text to a native parser.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The parser rejected the unit. Only AST-shaped front-ends raise this;
    /// grammar-shaped parsers are error-tolerant.
    #[error("Syntax error in {path} at {line}:{column}: {message} (`{text}`)")]
    Syntax {
        path: PathBuf,
        line: u32,
        column: u32,
        message: String,
        text: String,
    },

    #[error("Failed to load grammar for {language}: {message}")]
    LanguageSetup { language: String, message: String },

    #[error("Parser produced no tree for {path}")]
    NoTree { path: PathBuf },

    #[error("Source {path} is {size} bytes, limit is {limit}")]
    SourceTooLarge { path: PathBuf, size: u64, limit: u64 },
}

impl PolyglotErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => error_code::SYNTAX_ERROR,
            Self::SourceTooLarge { .. } => error_code::SOURCE_TOO_LARGE,
            _ => error_code::PARSE_ERROR,
        }
    }
}
