//! Shared machinery for grammar-shaped (tree-sitter) normalizers.
//!
//! Grammar trees expose every token. Lowering walks only named, non-extra
//! children (no punctuation, keywords or comments) and reads children by
//! grammar field name, never by position.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use polyglot_core::errors::{NormalizeError, NormalizeResult, ParseError};
use smallvec::smallvec;
use tree_sitter::Node as TsNode;

use super::Lowered;
use crate::ir::{
    BinaryOperator, BoolOperator, CompareOperator, Literal, Metadata, Module, Node, NodeKind, SourceLocation,
    SyntheticCall,
};
use crate::language::Language;
use crate::parsers::error_tolerant::{is_error_region, is_in_error};
use crate::parsers::{parse_tree, ParseCache, ParsedTree};

/// Parse side of a grammar-shaped normalizer: the per-thread parser, an
/// optional bounded cache and a count of real parser invocations.
pub struct GrammarFrontend {
    language: Language,
    cache: Option<ParseCache>,
    parses: AtomicU64,
}

impl GrammarFrontend {
    pub fn new(language: Language, cache: Option<ParseCache>) -> Self {
        Self {
            language,
            cache,
            parses: AtomicU64::new(0),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Return the tree for `source`, from the cache when possible.
    pub fn parse(&self, source: &str, filename: &str) -> Result<Arc<ParsedTree>, ParseError> {
        let path = Path::new(filename);
        let Some(cache) = &self.cache else {
            return Ok(Arc::new(self.parse_uncached(source, path)?));
        };
        let (tree, cache_hit) = cache.get_or_parse(source, || self.parse_uncached(source, path))?;
        tracing::debug!(language = %self.language, filename, cache_hit, "grammar tree ready");
        Ok(tree)
    }

    fn parse_uncached(&self, source: &str, path: &Path) -> Result<ParsedTree, ParseError> {
        self.parses.fetch_add(1, Ordering::Relaxed);
        parse_tree(self.language, source, path)
    }

    /// How many times the native parser actually ran.
    pub fn parse_count(&self) -> u64 {
        self.parses.load(Ordering::Relaxed)
    }

    pub fn cache(&self) -> Option<&ParseCache> {
        self.cache.as_ref()
    }
}

struct LoopFrame {
    /// Statements replayed before every `continue` targeting this loop.
    continue_prelude: Vec<Node>,
}

/// Per-call lowering state shared by every grammar-shaped language.
pub struct GrammarCtx<'s> {
    pub language: Language,
    pub source: &'s str,
    pub filename: Arc<str>,
    loops: Vec<LoopFrame>,
    outer_loops: Vec<Vec<LoopFrame>>,
}

impl<'s> GrammarCtx<'s> {
    pub fn new(language: Language, source: &'s str, filename: &str) -> Self {
        Self {
            language,
            source,
            filename: Arc::from(filename),
            loops: Vec::new(),
            outer_loops: Vec::new(),
        }
    }

    pub fn text(&self, node: &TsNode<'_>) -> &'s str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    pub fn loc(&self, node: &TsNode<'_>) -> Option<SourceLocation> {
        Some(SourceLocation::from_ts_node(node, Some(self.filename.clone())))
    }

    /// The one constructor every grammar-shaped handler builds nodes with.
    pub fn node(&self, kind: NodeKind, at: &TsNode<'_>) -> Node {
        Node::new(self.language, kind, self.loc(at))
    }

    pub fn name(&self, id: impl Into<String>, at: &TsNode<'_>) -> Node {
        Node::name(self.language, id, self.loc(at))
    }

    pub fn constant(&self, value: Literal, at: &TsNode<'_>) -> Node {
        self.node(
            NodeKind::Constant {
                value,
                raw: Some(self.text(at).to_string()),
            },
            at,
        )
    }

    /// A constant with no source spelling of its own, e.g. the `true` test
    /// of a desugared `do`/`while`.
    pub fn implicit(&self, value: Literal, at: &TsNode<'_>) -> Node {
        Node::constant(self.language, value, self.loc(at))
    }

    pub fn synthetic(&self, call: SyntheticCall, args: Vec<Node>, at: &TsNode<'_>) -> Node {
        Node::synthetic_call(self.language, call, args, Vec::new(), self.loc(at))
    }

    pub fn unsupported(&self, node: &TsNode<'_>) -> NormalizeError {
        let start = node.start_position();
        NormalizeError::UnsupportedConstruct {
            language: self.language.tag().to_string(),
            kind: node.kind().to_string(),
            line: start.row as u32 + 1,
            column: start.column as u32,
        }
    }

    pub fn invalid_literal(&self, node: &TsNode<'_>) -> NormalizeError {
        NormalizeError::InvalidLiteral {
            language: self.language.tag().to_string(),
            text: self.text(node).to_string(),
            line: node.start_position().row as u32 + 1,
        }
    }

    /// Look up a field the grammar declares as required.
    pub fn required<'t>(&self, node: &TsNode<'t>, field: &str) -> NormalizeResult<TsNode<'t>> {
        node.child_by_field_name(field)
            .ok_or_else(|| NormalizeError::MissingField {
                language: self.language.tag().to_string(),
                kind: node.kind().to_string(),
                field: field.to_string(),
                line: node.start_position().row as u32 + 1,
            })
    }

    /// Collect `Name` nodes for annotations and their raw text.
    pub fn collect_annotations(&self, node: &TsNode<'_>) -> (Vec<Node>, Vec<String>) {
        let mut decorators = Vec::new();
        let mut raw = Vec::new();
        let Some(mods) = find_child_by_kind(node, "modifiers") else {
            return (decorators, raw);
        };
        for child in named_children(&mods) {
            if matches!(child.kind(), "marker_annotation" | "annotation") {
                if let Some(name) = child.child_by_field_name("name") {
                    decorators.push(self.name(self.text(&name), &child));
                }
                raw.push(self.text(&child).to_string());
            }
        }
        (decorators, raw)
    }

    /// Modifier keywords (visibility, static, final, sealed...) in source order.
    pub fn collect_modifiers(&self, node: &TsNode<'_>) -> Vec<String> {
        let Some(mods) = find_child_by_kind(node, "modifiers") else {
            return Vec::new();
        };
        let mut cursor = mods.walk();
        mods.children(&mut cursor)
            .filter(|c| !matches!(c.kind(), "marker_annotation" | "annotation") && !c.is_extra())
            .map(|c| self.text(&c).to_string())
            .collect()
    }

    pub fn collect_type_params(&self, node: &TsNode<'_>) -> Vec<String> {
        node.child_by_field_name("type_parameters")
            .map(|tp| {
                named_children(&tp)
                    .iter()
                    .map(|p| self.text(p).to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn collect_throws(&self, node: &TsNode<'_>) -> Vec<String> {
        find_child_by_kind(node, "throws")
            .map(|t| named_children(&t).iter().map(|c| self.text(c).to_string()).collect())
            .unwrap_or_default()
    }

    /// The `/** ... */` block immediately preceding a declaration.
    pub fn doc_comment(&self, node: &TsNode<'_>) -> Option<String> {
        let prev = node.prev_sibling()?;
        if prev.kind() != "block_comment" && prev.kind() != "comment" {
            return None;
        }
        let text = self.text(&prev);
        let inner = text.strip_prefix("/**")?.strip_suffix("*/")?;
        let lines: Vec<&str> = inner
            .lines()
            .map(|l| l.trim().trim_start_matches('*').trim())
            .filter(|l| !l.is_empty())
            .collect();
        Some(lines.join("\n"))
    }

    /// Lower an ERROR or MISSING node in place, keeping its raw text.
    pub fn error_node(&self, node: &TsNode<'_>, recovered: Vec<Node>) -> Node {
        self.node(
            NodeKind::Error {
                text: self.text(node).to_string(),
                recovered,
            },
            node,
        )
    }

    // ---- Loop context ----

    pub fn enter_loop(&mut self, continue_prelude: Vec<Node>) {
        self.loops.push(LoopFrame { continue_prelude });
    }

    pub fn exit_loop(&mut self) {
        self.loops.pop();
    }

    /// What an unlabelled `continue` lowers to in the current loop.
    pub fn lower_continue(&self, at: &TsNode<'_>) -> Lowered {
        let mut out: Lowered = self
            .loops
            .last()
            .map(|frame| frame.continue_prelude.iter().cloned().collect())
            .unwrap_or_default();
        out.push(self.node(NodeKind::Continue, at));
        out
    }

    /// Function bodies start a fresh loop context.
    pub fn enter_function(&mut self) {
        self.outer_loops.push(std::mem::take(&mut self.loops));
    }

    pub fn exit_function(&mut self) {
        self.loops = self.outer_loops.pop().unwrap_or_default();
    }
}

/// Named children that are not extras (comments).
pub fn named_children<'t>(node: &TsNode<'t>) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).filter(|c| !c.is_extra()).collect()
}

pub fn children_by_field<'t>(node: &TsNode<'t>, field: &str) -> Vec<TsNode<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor)
        .filter(|c| c.is_named() && !c.is_extra())
        .collect()
}

/// Find the first child of a given kind.
pub fn find_child_by_kind<'t>(node: &TsNode<'t>, kind: &str) -> Option<TsNode<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}

/// Whether an anonymous token (keyword) is among a node's direct children.
pub fn has_token(node: &TsNode<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| !c.is_named() && c.kind() == token);
    found
}

/// The per-language dispatch a grammar-shaped lowerer provides.
pub trait GrammarRules {
    fn ctx(&self) -> &GrammarCtx<'_>;

    /// Lower one node by its grammar rule name. The default arm must return
    /// `UnsupportedConstruct`.
    fn dispatch(&mut self, node: TsNode<'_>) -> NormalizeResult<Lowered>;
}

/// Lower `node`, tolerating malformed input.
///
/// ERROR and MISSING nodes become `NodeKind::Error` with whatever their
/// named children lower to. A failure caused by a malformed region is
/// absorbed into such a node; any other failure propagates.
pub fn lower<R: GrammarRules>(rules: &mut R, node: TsNode<'_>) -> NormalizeResult<Lowered> {
    if is_error_region(&node) {
        let mut recovered = Vec::new();
        for child in named_children(&node) {
            match lower(rules, child) {
                Ok(nodes) => recovered.extend(nodes),
                Err(e) => {
                    tracing::debug!(error = %e, kind = child.kind(), "fragment absorbed into error region");
                }
            }
        }
        return Ok(smallvec![rules.ctx().error_node(&node, recovered)]);
    }
    match rules.dispatch(node) {
        Err(e) if caused_by_error_region(&node, &e) => {
            tracing::debug!(error = %e, kind = node.kind(), "malformed construct lowered as error region");
            Ok(smallvec![rules.ctx().error_node(&node, Vec::new())])
        }
        other => other,
    }
}

fn caused_by_error_region(node: &TsNode<'_>, err: &NormalizeError) -> bool {
    if !node.has_error() {
        return false;
    }
    match err {
        NormalizeError::MissingField { .. } => true,
        NormalizeError::UnsupportedConstruct { line, column, .. } => {
            let point = tree_sitter::Point::new(line.saturating_sub(1) as usize, *column as usize);
            node.named_descendant_for_point_range(point, point)
                .is_some_and(|d| is_error_region(&d) || d.has_error() || is_in_error(&d))
        }
        _ => false,
    }
}

/// Lower a node that must produce exactly one expression.
pub fn lower_expr<R: GrammarRules>(rules: &mut R, node: TsNode<'_>) -> NormalizeResult<Node> {
    let mut lowered = lower(rules, node)?;
    if lowered.len() == 1 {
        if let Some(only) = lowered.pop() {
            return Ok(only);
        }
    }
    Err(rules.ctx().unsupported(&node))
}

/// Lower every named child of a block-like node as statements.
pub fn lower_block<R: GrammarRules>(rules: &mut R, node: TsNode<'_>) -> NormalizeResult<Vec<Node>> {
    let mut body = Vec::new();
    for child in named_children(&node) {
        body.extend(lower(rules, child)?);
    }
    Ok(body)
}

/// Lower a statement position that may or may not be a block.
pub fn lower_body<R: GrammarRules>(rules: &mut R, node: TsNode<'_>, block_kind: &str) -> NormalizeResult<Vec<Node>> {
    if node.kind() == block_kind {
        lower_block(rules, node)
    } else {
        Ok(lower(rules, node)?.into_vec())
    }
}

/// Lower a whole program into a module.
pub fn lower_program<R: GrammarRules>(rules: &mut R, root: TsNode<'_>, error_count: u32) -> NormalizeResult<Module> {
    let body = lower_block(rules, root)?;
    let ctx = rules.ctx();
    let mut module = Module::new(ctx.language, ctx.filename.clone(), body);
    module.error_count = error_count;
    module.loc = ctx.loc(&root);
    Ok(module)
}

/// Wrap an expression for statement position. Assignments are statements
/// already and pass through.
pub fn expression_statement(ctx: &GrammarCtx<'_>, value: Node, at: &TsNode<'_>) -> Node {
    if value.kind.is_statement() {
        return value;
    }
    ctx.node(NodeKind::ExprStmt { value: Box::new(value) }, at)
}

/// `x++` / `--x` as `x = x ± 1`.
pub fn update_assignment(ctx: &GrammarCtx<'_>, target: Node, increment: bool, at: &TsNode<'_>) -> Node {
    let one = ctx.implicit(Literal::Int(1), at);
    let op = if increment { BinaryOperator::Add } else { BinaryOperator::Sub };
    let value = ctx.node(
        NodeKind::BinaryOp {
            left: Box::new(target.clone()),
            op,
            right: Box::new(one),
        },
        at,
    );
    ctx.node(
        NodeKind::Assign {
            targets: vec![target],
            value: Box::new(value),
            declaration_kind: None,
        },
        at,
    )
    .with_metadata(Metadata::desugared("update_expression"))
}

/// Fold a trailing assignment chain `a = b = c` into one `Assign` with
/// targets `[a, b]`.
pub fn chain_assignment(ctx: &GrammarCtx<'_>, target: Node, value: Node, at: &TsNode<'_>) -> Node {
    let mut targets = vec![target];
    let value = match value.kind {
        NodeKind::Assign {
            targets: inner,
            value: rhs,
            declaration_kind: None,
        } if value.metadata.desugared_from.is_none() => {
            targets.extend(inner);
            *rhs
        }
        kind => Node::new(ctx.language, kind, value.loc).with_metadata(value.metadata),
    };
    ctx.node(
        NodeKind::Assign {
            targets,
            value: Box::new(value),
            declaration_kind: None,
        },
        at,
    )
}

/// Map a C-family infix operator token onto the vocabulary. Tokens without
/// a variant become reserved synthetic calls.
pub fn infix(ctx: &GrammarCtx<'_>, operator: &str, left: Node, right: Node, at: &TsNode<'_>) -> Option<Node> {
    if let Some(op) = BoolOperator::from_token(operator) {
        let mut values = match left.kind {
            NodeKind::BoolOp { op: inner, values } if inner == op => values,
            kind => vec![Node::new(ctx.language, kind, left.loc).with_metadata(left.metadata)],
        };
        values.push(right);
        return Some(ctx.node(NodeKind::BoolOp { op, values }, at));
    }
    if let Some(op) = CompareOperator::from_token(operator) {
        return Some(ctx.node(
            NodeKind::Compare {
                left: Box::new(left),
                ops: vec![op],
                comparators: vec![right],
            },
            at,
        ));
    }
    if let Some(op) = BinaryOperator::from_token(operator) {
        return Some(ctx.node(
            NodeKind::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            at,
        ));
    }
    let synthetic = match operator {
        ">>>" => SyntheticCall::UnsignedRShift,
        "instanceof" => SyntheticCall::InstanceOf,
        "??" => SyntheticCall::Nullish,
        _ => return None,
    };
    Some(ctx.synthetic(synthetic, vec![left, right], at))
}

/// Decode backslash escapes shared by C-family string literals.
///
/// Handles the simple escapes, `\xHH`, `\uXXXX`, `\u{X...}` and Java octal
/// escapes. Returns `None` on a malformed escape.
pub fn unescape(inner: &str) -> Option<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next()?;
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            's' => out.push(' '),
            '\n' => {}
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            'u' => {
                while chars.peek() == Some(&'u') {
                    chars.next();
                }
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|&c| c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            '0'..='7' => {
                let mut value = escaped.to_digit(8)?;
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) if value * 8 + d <= 0o377 => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        _ => break,
                    }
                }
                out.push(char::from_u32(value)?);
            }
            other => out.push(other),
        }
    }
    Some(out)
}

/// Parse integer digits in a radix, `_` separators allowed.
///
/// Values beyond `i64` come back as `Literal::BigInt` in decimal.
pub fn parse_int(digits: &str, radix: u32) -> Option<Literal> {
    let clean: String = digits.chars().filter(|&c| c != '_').collect();
    if clean.is_empty() {
        return None;
    }
    match i64::from_str_radix(&clean, radix) {
        Ok(v) => Some(Literal::Int(v)),
        Err(_) => u128::from_str_radix(&clean, radix)
            .ok()
            .map(|v| Literal::BigInt(v.to_string())),
    }
}
