//! Source locations attached to IR nodes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Position of a node in its source unit.
///
/// `line` is 1-based, `column` is a 0-based byte column. Built by the
/// normalizer when the node is created; consumers never synthesize one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub end_line: Option<u32>,
    pub end_column: Option<u32>,
    pub filename: Option<Arc<str>>,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            end_line: None,
            end_column: None,
            filename: None,
        }
    }

    pub fn with_end(mut self, end_line: u32, end_column: u32) -> Self {
        self.end_line = Some(end_line);
        self.end_column = Some(end_column);
        self
    }

    pub fn with_filename(mut self, filename: Arc<str>) -> Self {
        self.filename = Some(filename);
        self
    }

    /// Build from a tree-sitter node (rows are 0-based there).
    pub fn from_ts_node(node: &tree_sitter::Node<'_>, filename: Option<Arc<str>>) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            line: start.row as u32 + 1,
            column: start.column as u32,
            end_line: Some(end.row as u32 + 1),
            end_column: Some(end.column as u32),
            filename,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref filename) = self.filename {
            write!(f, "{filename}:")?;
        }
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets to 1-based lines and 0-based byte columns.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// `(line, column)` of a byte offset.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert - 1,
        };
        let column = offset - self.line_starts[line];
        (line as u32 + 1, column as u32)
    }

    /// The full text of a 1-based line, without its terminator.
    pub fn line_text<'s>(&self, source: &'s str, line: u32) -> &'s str {
        let idx = (line as usize).saturating_sub(1);
        let Some(&start) = self.line_starts.get(idx) else {
            return "";
        };
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&next| next - 1)
            .unwrap_or(source.len());
        source
            .get(start..end.max(start))
            .unwrap_or("")
            .trim_end_matches('\r')
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_map_to_lines_and_columns() {
        let source = "a = 1\nbb = 2\n\nc";
        let index = LineIndex::new(source);
        assert_eq!(index.position(0), (1, 0));
        assert_eq!(index.position(4), (1, 4));
        assert_eq!(index.position(6), (2, 0));
        assert_eq!(index.position(8), (2, 2));
        assert_eq!(index.position(13), (3, 0));
        assert_eq!(index.position(14), (4, 0));
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn line_text_strips_terminators() {
        let source = "first\r\nsecond\nthird";
        let index = LineIndex::new(source);
        assert_eq!(index.line_text(source, 1), "first");
        assert_eq!(index.line_text(source, 2), "second");
        assert_eq!(index.line_text(source, 3), "third");
        assert_eq!(index.line_text(source, 9), "");
    }

    #[test]
    fn display_includes_filename() {
        let loc = SourceLocation::new(3, 7).with_filename(Arc::from("m.py"));
        assert_eq!(loc.to_string(), "m.py:3:7");
        assert_eq!(SourceLocation::new(1, 0).to_string(), "1:0");
    }
}
