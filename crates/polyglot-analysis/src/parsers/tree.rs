//! Tree-sitter parsing with one parser instance per thread and grammar.

use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::path::Path;
use std::time::Instant;

use polyglot_core::errors::ParseError;
use rustc_hash::FxHashMap;
use tree_sitter::{Parser, Tree};

use super::error_tolerant::count_errors;
use crate::ir::SourceLocation;
use crate::language::Language;

thread_local! {
    static PARSERS: RefCell<FxHashMap<Language, Parser>> = RefCell::new(FxHashMap::default());
}

/// A grammar tree together with the exact text it was parsed from.
#[derive(Debug)]
pub struct ParsedTree {
    pub language: Language,
    pub tree: Tree,
    pub source: String,
    /// ERROR and MISSING nodes in the tree.
    pub error_count: u32,
    /// Where each of those nodes starts, in tree order. No filename: a
    /// cached tree is shared by every file with the same text.
    pub error_locations: Vec<SourceLocation>,
}

impl ParsedTree {
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }
}

/// Parse `source` with the calling thread's parser for `language`.
///
/// Never fails on malformed input: tree-sitter embeds ERROR nodes instead.
pub fn parse_tree(language: Language, source: &str, path: &Path) -> Result<ParsedTree, ParseError> {
    let grammar = language.ts_language().ok_or_else(|| ParseError::LanguageSetup {
        language: language.tag().to_string(),
        message: "no tree-sitter grammar".to_string(),
    })?;

    let start = Instant::now();
    let tree = PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(language) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let mut parser = Parser::new();
                parser
                    .set_language(&grammar)
                    .map_err(|e| ParseError::LanguageSetup {
                        language: language.tag().to_string(),
                        message: e.to_string(),
                    })?;
                entry.insert(parser)
            }
        };
        parser.parse(source, None).ok_or_else(|| ParseError::NoTree {
            path: path.to_path_buf(),
        })
    })?;

    let (error_count, error_locations) = count_errors(tree.root_node());
    tracing::debug!(
        language = %language,
        filename = %path.display(),
        error_count,
        first_error_line = error_locations.first().map(|l| l.line),
        parse_time_us = start.elapsed().as_micros() as u64,
        "parsed grammar tree"
    );

    Ok(ParsedTree {
        language,
        tree,
        source: source.to_string(),
        error_count,
        error_locations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_java_and_javascript() {
        let js = parse_tree(Language::JavaScript, "const x = 1;", Path::new("a.js")).unwrap();
        assert_eq!(js.root_node().kind(), "program");
        assert_eq!(js.error_count, 0);
        assert!(js.error_locations.is_empty());

        let java = parse_tree(Language::Java, "class A {}", Path::new("A.java")).unwrap();
        assert_eq!(java.root_node().kind(), "program");
    }

    #[test]
    fn python_has_no_grammar_tree() {
        let err = parse_tree(Language::Python, "x = 1", Path::new("a.py")).unwrap_err();
        assert!(matches!(err, ParseError::LanguageSetup { .. }));
    }

    #[test]
    fn malformed_input_still_yields_a_tree() {
        let tree = parse_tree(Language::Java, "class A { void f( }", Path::new("A.java")).unwrap();
        assert!(tree.error_count > 0);
        assert!(tree.root_node().has_error());
        assert_eq!(tree.error_locations.len(), tree.error_count as usize);
        assert!(tree.error_locations.iter().all(|l| l.line == 1 && l.filename.is_none()));
    }
}
