//! Unified IR, one node model for every input language.
//!
//! Nodes model *shape* (what is a class, a call, a loop). Richer type-system
//! detail travels as plain strings in [`Metadata`]. Constructs without a node
//! kind of their own are desugared into reserved synthetic calls
//! ([`SyntheticCall`]).

pub mod location;
pub mod metadata;
pub mod nodes;
pub mod operators;
pub mod synthetic;
pub mod visit;

pub use location::{LineIndex, SourceLocation};
pub use metadata::Metadata;
pub use nodes::{ExceptHandler, IrNode, Literal, Module, Node, NodeKind, Parameter, SwitchCase};
pub use operators::{AugAssignOperator, BinaryOperator, BoolOperator, CompareOperator, UnaryOperator};
pub use synthetic::SyntheticCall;
