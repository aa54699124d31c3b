//! IR node model: a closed set of statement and expression kinds rooted at
//! [`Module`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::location::SourceLocation;
use super::metadata::Metadata;
use super::operators::{AugAssignOperator, BinaryOperator, BoolOperator, CompareOperator, UnaryOperator};
use super::synthetic::SyntheticCall;
use crate::language::Language;

/// Capability shared by every IR node.
pub trait IrNode {
    fn language(&self) -> Language;

    fn loc(&self) -> Option<&SourceLocation>;

    fn metadata(&self) -> &Metadata;

    /// The `source_language` tag, e.g. `"python"`.
    fn source_language(&self) -> &'static str {
        self.language().tag()
    }
}

/// A constant value as written in source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    /// JavaScript `undefined`, and the value of a bare Python annotation.
    Undefined,
    Bool(bool),
    Int(i64),
    /// Integer outside the `i64` range, as decimal text.
    BigInt(String),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Ellipsis,
}

/// A function or lambda parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_annotation: Option<String>,
    pub default: Option<Node>,
    /// `*args`, `...rest`, `String... xs`.
    pub is_rest: bool,
    /// Keyword-only. Python `**kwargs` is both rest and keyword-only.
    pub is_keyword_only: bool,
}

impl Parameter {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_annotation: None,
            default: None,
            is_rest: false,
            is_keyword_only: false,
        }
    }
}

/// One `except`/`catch` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptHandler {
    pub exc_type: Option<Node>,
    pub name: Option<String>,
    pub body: Vec<Node>,
    pub loc: Option<SourceLocation>,
}

/// One arm of a `Switch`. `value == None` is the default arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub value: Option<Node>,
    pub body: Vec<Node>,
    pub loc: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // ---- Statements ----
    FunctionDef {
        name: String,
        params: Vec<Parameter>,
        body: Vec<Node>,
        return_type: Option<String>,
        is_async: bool,
        is_generator: bool,
        decorators: Vec<Node>,
        docstring: Option<String>,
    },
    ClassDef {
        name: String,
        bases: Vec<Node>,
        body: Vec<Node>,
        decorators: Vec<Node>,
    },
    Assign {
        targets: Vec<Node>,
        value: Box<Node>,
        /// `"let"`, `"const"`, `"var"`, a Java type, `"annotation"`.
        declaration_kind: Option<String>,
    },
    AugAssign {
        target: Box<Node>,
        op: AugAssignOperator,
        value: Box<Node>,
    },
    If {
        test: Box<Node>,
        body: Vec<Node>,
        orelse: Vec<Node>,
    },
    For {
        target: Box<Node>,
        iter: Box<Node>,
        body: Vec<Node>,
        orelse: Vec<Node>,
    },
    While {
        test: Box<Node>,
        body: Vec<Node>,
        orelse: Vec<Node>,
    },
    Try {
        body: Vec<Node>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Node>,
        finalbody: Vec<Node>,
    },
    Raise {
        exc: Option<Box<Node>>,
        cause: Option<Box<Node>>,
    },
    Switch {
        discriminant: Box<Node>,
        cases: Vec<SwitchCase>,
    },
    Return {
        value: Option<Box<Node>>,
    },
    Break,
    Continue,
    Pass,
    ExprStmt {
        value: Box<Node>,
    },
    Import {
        module: String,
        names: Vec<String>,
        is_star: bool,
    },

    // ---- Expressions ----
    BinaryOp {
        left: Box<Node>,
        op: BinaryOperator,
        right: Box<Node>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Node>,
    },
    BoolOp {
        op: BoolOperator,
        values: Vec<Node>,
    },
    Compare {
        left: Box<Node>,
        ops: Vec<CompareOperator>,
        comparators: Vec<Node>,
    },
    Call {
        func: Box<Node>,
        args: Vec<Node>,
        /// Keyword arguments in source order.
        kwargs: Vec<(String, Node)>,
    },
    Attribute {
        value: Box<Node>,
        attr: String,
    },
    Subscript {
        value: Box<Node>,
        slice: Box<Node>,
    },
    Name {
        id: String,
    },
    Constant {
        value: Literal,
        raw: Option<String>,
    },
    List {
        elements: Vec<Node>,
    },
    Dict {
        /// `None` marks a `**spread` entry.
        keys: Vec<Option<Node>>,
        values: Vec<Node>,
    },

    // ---- Malformed input ----
    /// A region the error-tolerant parser could not parse. `recovered` holds
    /// whatever fragments inside it could still be normalized.
    Error {
        text: String,
        recovered: Vec<Node>,
    },
}

impl NodeKind {
    /// Variant name, as used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::FunctionDef { .. } => "FunctionDef",
            NodeKind::ClassDef { .. } => "ClassDef",
            NodeKind::Assign { .. } => "Assign",
            NodeKind::AugAssign { .. } => "AugAssign",
            NodeKind::If { .. } => "If",
            NodeKind::For { .. } => "For",
            NodeKind::While { .. } => "While",
            NodeKind::Try { .. } => "Try",
            NodeKind::Raise { .. } => "Raise",
            NodeKind::Switch { .. } => "Switch",
            NodeKind::Return { .. } => "Return",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::Pass => "Pass",
            NodeKind::ExprStmt { .. } => "ExprStmt",
            NodeKind::Import { .. } => "Import",
            NodeKind::BinaryOp { .. } => "BinaryOp",
            NodeKind::UnaryOp { .. } => "UnaryOp",
            NodeKind::BoolOp { .. } => "BoolOp",
            NodeKind::Compare { .. } => "Compare",
            NodeKind::Call { .. } => "Call",
            NodeKind::Attribute { .. } => "Attribute",
            NodeKind::Subscript { .. } => "Subscript",
            NodeKind::Name { .. } => "Name",
            NodeKind::Constant { .. } => "Constant",
            NodeKind::List { .. } => "List",
            NodeKind::Dict { .. } => "Dict",
            NodeKind::Error { .. } => "Error",
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDef { .. }
                | NodeKind::ClassDef { .. }
                | NodeKind::Assign { .. }
                | NodeKind::AugAssign { .. }
                | NodeKind::If { .. }
                | NodeKind::For { .. }
                | NodeKind::While { .. }
                | NodeKind::Try { .. }
                | NodeKind::Raise { .. }
                | NodeKind::Switch { .. }
                | NodeKind::Return { .. }
                | NodeKind::Break
                | NodeKind::Continue
                | NodeKind::Pass
                | NodeKind::ExprStmt { .. }
                | NodeKind::Import { .. }
        )
    }
}

/// One IR node. The language tag is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    language: Language,
    pub loc: Option<SourceLocation>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Node {
    pub fn new(language: Language, kind: NodeKind, loc: Option<SourceLocation>) -> Self {
        Self {
            kind,
            language,
            loc,
            metadata: Metadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn name(language: Language, id: impl Into<String>, loc: Option<SourceLocation>) -> Self {
        Self::new(language, NodeKind::Name { id: id.into() }, loc)
    }

    pub fn constant(language: Language, value: Literal, loc: Option<SourceLocation>) -> Self {
        Self::new(language, NodeKind::Constant { value, raw: None }, loc)
    }

    pub fn list(language: Language, elements: Vec<Node>, loc: Option<SourceLocation>) -> Self {
        Self::new(language, NodeKind::List { elements }, loc)
    }

    /// Build a call to a reserved synthetic name.
    pub fn synthetic_call(
        language: Language,
        call: SyntheticCall,
        args: Vec<Node>,
        kwargs: Vec<(String, Node)>,
        loc: Option<SourceLocation>,
    ) -> Self {
        let func = Node::name(language, call.name(), loc.clone());
        Self::new(
            language,
            NodeKind::Call {
                func: Box::new(func),
                args,
                kwargs,
            },
            loc,
        )
    }

    /// Recognize a synthetic call, returning its marker, positional and
    /// keyword arguments.
    pub fn as_synthetic_call(&self) -> Option<(SyntheticCall, &[Node], &[(String, Node)])> {
        let NodeKind::Call { func, args, kwargs } = &self.kind else {
            return None;
        };
        let NodeKind::Name { id } = &func.kind else {
            return None;
        };
        SyntheticCall::from_name(id).map(|s| (s, args.as_slice(), kwargs.as_slice()))
    }

    /// The identifier of a `Name` node.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Name { id } => Some(id),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            NodeKind::Constant { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, NodeKind::Error { .. })
    }
}

impl IrNode for Node {
    fn language(&self) -> Language {
        self.language
    }

    fn loc(&self) -> Option<&SourceLocation> {
        self.loc.as_ref()
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// Root of a normalized tree. Exactly one per parsed unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub body: Vec<Node>,
    pub docstring: Option<String>,
    language: Language,
    pub filename: Arc<str>,
    pub loc: Option<SourceLocation>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    /// Error regions reported by the parser. Always 0 for AST-shaped input.
    pub error_count: u32,
}

impl Module {
    pub fn new(language: Language, filename: Arc<str>, body: Vec<Node>) -> Self {
        Self {
            body,
            docstring: None,
            language,
            loc: Some(SourceLocation::new(1, 0).with_filename(filename.clone())),
            filename,
            metadata: Metadata::default(),
            error_count: 0,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

impl IrNode for Module {
    fn language(&self) -> Language {
        self.language
    }

    fn loc(&self) -> Option<&SourceLocation> {
        self.loc.as_ref()
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_call_is_recognized() {
        let test = Node::name(Language::Python, "c", None);
        let a = Node::constant(Language::Python, Literal::Int(1), None);
        let b = Node::constant(Language::Python, Literal::Int(2), None);
        let call = Node::synthetic_call(
            Language::Python,
            SyntheticCall::Ternary,
            vec![test, a, b],
            vec![],
            None,
        );
        let (marker, args, kwargs) = call.as_synthetic_call().unwrap();
        assert_eq!(marker, SyntheticCall::Ternary);
        assert_eq!(args.len(), 3);
        assert!(kwargs.is_empty());
        assert_eq!(args[0].as_name(), Some("c"));
    }

    #[test]
    fn plain_call_is_not_synthetic() {
        let func = Node::name(Language::JavaScript, "ternary", None);
        let call = Node::new(
            Language::JavaScript,
            NodeKind::Call {
                func: Box::new(func),
                args: vec![],
                kwargs: vec![],
            },
            None,
        );
        assert!(call.as_synthetic_call().is_none());
    }

    #[test]
    fn tag_matches_language() {
        let n = Node::name(Language::Java, "x", None);
        assert_eq!(n.source_language(), "java");
        assert_eq!(IrNode::language(&n), Language::Java);
    }

    #[test]
    fn empty_metadata_is_omitted_from_json() {
        let n = Node::name(Language::Python, "x", None);
        let json = serde_json::to_string(&n).unwrap();
        assert!(!json.contains("metadata"));
    }
}
