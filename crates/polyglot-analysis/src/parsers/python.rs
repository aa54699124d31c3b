//! Python front-end over `rustpython-parser`.
//!
//! The AST-shaped parser is not error-tolerant: any syntax error fails the
//! whole unit.

use std::path::Path;
use std::time::Instant;

use polyglot_core::errors::ParseError;
use rustpython_parser::{ast, Parse};

use crate::ir::LineIndex;

/// Parse a Python module into its statement list.
pub fn parse_python(source: &str, path: &Path, index: &LineIndex) -> Result<ast::Suite, ParseError> {
    let start = Instant::now();
    let source_path = path.to_string_lossy();
    let suite = ast::Suite::parse(source, &source_path).map_err(|e| {
        let (line, column) = index.position(usize::from(e.offset).min(source.len()));
        ParseError::Syntax {
            path: path.to_path_buf(),
            line,
            column,
            message: e.error.to_string(),
            text: index.line_text(source, line).trim().to_string(),
        }
    })?;
    tracing::debug!(
        filename = %source_path,
        statements = suite.len(),
        parse_time_us = start.elapsed().as_micros() as u64,
        "parsed python module"
    );
    Ok(suite)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_module_parses() {
        let source = "x = 1\ndef f():\n    return x\n";
        let suite = parse_python(source, Path::new("m.py"), &LineIndex::new(source)).unwrap();
        assert_eq!(suite.len(), 2);
    }

    #[test]
    fn syntax_error_carries_position_and_line_text() {
        let source = "x = 1\ny = (2 +\n";
        let err = parse_python(source, Path::new("bad.py"), &LineIndex::new(source)).unwrap_err();
        match err {
            ParseError::Syntax { path, line, message, .. } => {
                assert_eq!(path, Path::new("bad.py"));
                assert!(line >= 2);
                assert!(!message.is_empty());
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
    }
}
