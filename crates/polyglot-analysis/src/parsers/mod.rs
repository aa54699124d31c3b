//! Native parser front-ends: tree-sitter for grammar-shaped languages,
//! rustpython for Python, plus the bounded parse cache.

pub mod cache;
pub mod error_tolerant;
pub mod hasher;
pub mod python;
pub mod tree;

pub use cache::ParseCache;
pub use tree::{parse_tree, ParsedTree};
