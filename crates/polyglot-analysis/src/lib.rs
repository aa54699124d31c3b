//! polyglot-analysis: one IR for Python, JavaScript and Java, the
//! normalizers that produce it, and per-language operator semantics over it.

pub mod ir;
pub mod language;
pub mod normalizers;
pub mod parsers;
pub mod semantics;

pub use ir::{IrNode, Module, Node, NodeKind};
pub use language::Language;
pub use normalizers::{normalizer_for, Normalizer, NormalizerRegistry};
pub use semantics::{semantics_for, semantics_for_node, LanguageSemantics};
