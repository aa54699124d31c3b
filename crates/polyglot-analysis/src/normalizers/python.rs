//! Python normalizer.
//!
//! The input is already an abstract tree, so lowering is close to one IR
//! node per AST node. Only conditional expressions, comprehensions,
//! generator/await forms and a few collection literals are desugared into
//! synthetic calls.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use polyglot_core::errors::{NormalizeError, NormalizeResult};
use rustpython_parser::ast::{self, Ranged};
use rustpython_parser::text_size::{TextRange, TextSize};
use smallvec::smallvec;

use super::{Lowered, NodeNormalizer, Normalizer};
use crate::ir::visit::children;
use crate::ir::{
    AugAssignOperator, BinaryOperator, BoolOperator, CompareOperator, ExceptHandler, LineIndex, Literal, Metadata,
    Module, Node, NodeKind, Parameter, SourceLocation, SyntheticCall, UnaryOperator,
};
use crate::language::Language;
use crate::parsers::python::parse_python;

/// Python has no grammar-tree front-end, so there is no parse cache here.
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonNormalizer;

impl PythonNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Normalizer for PythonNormalizer {
    fn language(&self) -> Language {
        Language::Python
    }

    fn normalize(&self, source: &str, filename: &str) -> NormalizeResult<Module> {
        let start = Instant::now();
        let index = LineIndex::new(source);
        let suite = parse_python(source, Path::new(filename), &index)?;

        let mut lowerer = PythonLowerer {
            source,
            index,
            filename: Arc::from(filename),
        };
        let mut body = Vec::with_capacity(suite.len());
        for stmt in &suite {
            body.extend(lowerer.normalize_node(stmt)?);
        }

        let mut module = Module::new(Language::Python, lowerer.filename.clone(), body);
        module.docstring = docstring(&suite);
        module.loc = lowerer.loc(TextRange::up_to(TextSize::of(source)));
        tracing::debug!(
            language = "python",
            filename,
            statements = module.body.len(),
            normalize_time_us = start.elapsed().as_micros() as u64,
            "normalized module"
        );
        Ok(module)
    }
}

struct PythonLowerer<'s> {
    source: &'s str,
    index: LineIndex,
    filename: Arc<str>,
}

impl NodeNormalizer<&ast::Stmt> for PythonLowerer<'_> {
    fn normalize_node(&mut self, stmt: &ast::Stmt) -> NormalizeResult<Lowered> {
        self.stmt(stmt)
    }
}

impl NodeNormalizer<&ast::Expr> for PythonLowerer<'_> {
    fn normalize_node(&mut self, expr: &ast::Expr) -> NormalizeResult<Lowered> {
        Ok(smallvec![self.expr(expr)?])
    }
}

impl<'s> PythonLowerer<'s> {
    fn loc(&self, range: TextRange) -> Option<SourceLocation> {
        let (line, column) = self.index.position(usize::from(range.start()));
        let (end_line, end_column) = self.index.position(usize::from(range.end()));
        Some(
            SourceLocation::new(line, column)
                .with_end(end_line, end_column)
                .with_filename(self.filename.clone()),
        )
    }

    fn node(&self, kind: NodeKind, range: TextRange) -> Node {
        Node::new(Language::Python, kind, self.loc(range))
    }

    fn synthetic(&self, call: SyntheticCall, args: Vec<Node>, kwargs: Vec<(String, Node)>, range: TextRange) -> Node {
        Node::synthetic_call(Language::Python, call, args, kwargs, self.loc(range))
    }

    fn null(&self, range: TextRange) -> Node {
        Node::constant(Language::Python, Literal::Null, self.loc(range))
    }

    /// Source text covered by `range`.
    fn segment(&self, range: TextRange) -> &'s str {
        self.source
            .get(usize::from(range.start())..usize::from(range.end()))
            .unwrap_or_default()
    }

    fn unsupported(&self, kind: &str, range: TextRange) -> NormalizeError {
        let (line, column) = self.index.position(usize::from(range.start()));
        NormalizeError::UnsupportedConstruct {
            language: Language::Python.tag().to_string(),
            kind: kind.to_string(),
            line,
            column,
        }
    }

    fn block(&mut self, stmts: &[ast::Stmt]) -> NormalizeResult<Vec<Node>> {
        let mut out = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            out.extend(self.stmt(stmt)?);
        }
        Ok(out)
    }

    fn exprs(&mut self, exprs: &[ast::Expr]) -> NormalizeResult<Vec<Node>> {
        exprs.iter().map(|e| self.expr(e)).collect()
    }

    fn opt_expr(&mut self, expr: Option<&ast::Expr>) -> NormalizeResult<Option<Box<Node>>> {
        expr.map(|e| self.expr(e).map(Box::new)).transpose()
    }

    fn stmt(&mut self, stmt: &ast::Stmt) -> NormalizeResult<Lowered> {
        let range = stmt.range();
        let kind = match stmt {
            ast::Stmt::FunctionDef(f) => {
                return Ok(smallvec![self.function(
                    f.name.as_str(),
                    &f.args,
                    &f.body,
                    &f.decorator_list,
                    f.returns.as_deref(),
                    &f.type_params,
                    false,
                    range,
                )?])
            }
            ast::Stmt::AsyncFunctionDef(f) => {
                return Ok(smallvec![self.function(
                    f.name.as_str(),
                    &f.args,
                    &f.body,
                    &f.decorator_list,
                    f.returns.as_deref(),
                    &f.type_params,
                    true,
                    range,
                )?])
            }
            ast::Stmt::ClassDef(c) => return Ok(smallvec![self.class(c)?]),
            ast::Stmt::Return(r) => NodeKind::Return {
                value: self.opt_expr(r.value.as_deref())?,
            },
            ast::Stmt::Assign(a) => NodeKind::Assign {
                targets: self.exprs(&a.targets)?,
                value: Box::new(self.expr(&a.value)?),
                declaration_kind: None,
            },
            ast::Stmt::AnnAssign(a) => {
                let value = match a.value.as_deref() {
                    Some(v) => self.expr(v)?,
                    None => Node::constant(Language::Python, Literal::Undefined, self.loc(range)),
                };
                let target = self.expr(&a.target)?;
                let metadata = Metadata {
                    type_annotation: Some(self.segment(a.annotation.range()).to_string()),
                    ..Default::default()
                };
                return Ok(smallvec![self
                    .node(
                        NodeKind::Assign {
                            targets: vec![target],
                            value: Box::new(value),
                            declaration_kind: Some("annotation".to_string()),
                        },
                        range,
                    )
                    .with_metadata(metadata)]);
            }
            ast::Stmt::AugAssign(a) => NodeKind::AugAssign {
                target: Box::new(self.expr(&a.target)?),
                op: AugAssignOperator::new(binary_operator(&a.op)),
                value: Box::new(self.expr(&a.value)?),
            },
            ast::Stmt::For(f) => NodeKind::For {
                target: Box::new(self.expr(&f.target)?),
                iter: Box::new(self.expr(&f.iter)?),
                body: self.block(&f.body)?,
                orelse: self.block(&f.orelse)?,
            },
            ast::Stmt::AsyncFor(f) => {
                let kind = NodeKind::For {
                    target: Box::new(self.expr(&f.target)?),
                    iter: Box::new(self.expr(&f.iter)?),
                    body: self.block(&f.body)?,
                    orelse: self.block(&f.orelse)?,
                };
                let metadata = Metadata {
                    modifiers: vec!["async".to_string()],
                    ..Default::default()
                };
                return Ok(smallvec![self.node(kind, range).with_metadata(metadata)]);
            }
            ast::Stmt::While(w) => NodeKind::While {
                test: Box::new(self.expr(&w.test)?),
                body: self.block(&w.body)?,
                orelse: self.block(&w.orelse)?,
            },
            ast::Stmt::If(i) => NodeKind::If {
                test: Box::new(self.expr(&i.test)?),
                body: self.block(&i.body)?,
                orelse: self.block(&i.orelse)?,
            },
            ast::Stmt::Raise(r) => NodeKind::Raise {
                exc: self.opt_expr(r.exc.as_deref())?,
                cause: self.opt_expr(r.cause.as_deref())?,
            },
            ast::Stmt::Try(t) => {
                let mut handlers = Vec::with_capacity(t.handlers.len());
                for handler in &t.handlers {
                    let ast::ExceptHandler::ExceptHandler(h) = handler;
                    handlers.push(ExceptHandler {
                        exc_type: self.opt_expr(h.type_.as_deref())?.map(|b| *b),
                        name: h.name.as_ref().map(|n| n.to_string()),
                        body: self.block(&h.body)?,
                        loc: self.loc(h.range),
                    });
                }
                NodeKind::Try {
                    body: self.block(&t.body)?,
                    handlers,
                    orelse: self.block(&t.orelse)?,
                    finalbody: self.block(&t.finalbody)?,
                }
            }
            ast::Stmt::Import(i) => return Ok(self.import(i)),
            ast::Stmt::ImportFrom(i) => return Ok(smallvec![self.import_from(i)]),
            ast::Stmt::Expr(e) => NodeKind::ExprStmt {
                value: Box::new(self.expr(&e.value)?),
            },
            ast::Stmt::Pass(_) => NodeKind::Pass,
            ast::Stmt::Break(_) => NodeKind::Break,
            ast::Stmt::Continue(_) => NodeKind::Continue,
            ast::Stmt::With(_) => return Err(self.unsupported("With", range)),
            ast::Stmt::AsyncWith(_) => return Err(self.unsupported("AsyncWith", range)),
            ast::Stmt::Match(_) => return Err(self.unsupported("Match", range)),
            ast::Stmt::TypeAlias(_) => return Err(self.unsupported("TypeAlias", range)),
            ast::Stmt::TryStar(_) => return Err(self.unsupported("TryStar", range)),
            ast::Stmt::Delete(_) => return Err(self.unsupported("Delete", range)),
            ast::Stmt::Global(_) => return Err(self.unsupported("Global", range)),
            ast::Stmt::Nonlocal(_) => return Err(self.unsupported("Nonlocal", range)),
            ast::Stmt::Assert(_) => return Err(self.unsupported("Assert", range)),
        };
        Ok(smallvec![self.node(kind, range)])
    }

    #[allow(clippy::too_many_arguments)]
    fn function(
        &mut self,
        name: &str,
        args: &ast::Arguments,
        body: &[ast::Stmt],
        decorators: &[ast::Expr],
        returns: Option<&ast::Expr>,
        type_params: &[ast::TypeParam],
        is_async: bool,
        range: TextRange,
    ) -> NormalizeResult<Node> {
        let params = self.parameters(args)?;
        let body_ir = self.block(body)?;
        let decorators = self.exprs(decorators)?;
        let metadata = Metadata {
            type_params: type_params.iter().map(|tp| type_param_name(tp).to_string()).collect(),
            ..Default::default()
        };
        Ok(self
            .node(
                NodeKind::FunctionDef {
                    name: name.to_string(),
                    params,
                    is_generator: contains_yield(&body_ir),
                    body: body_ir,
                    return_type: returns.map(|r| self.segment(r.range()).to_string()),
                    is_async,
                    decorators,
                    docstring: docstring(body),
                },
                range,
            )
            .with_metadata(metadata))
    }

    fn parameters(&mut self, args: &ast::Arguments) -> NormalizeResult<Vec<Parameter>> {
        let mut params = Vec::new();
        for arg in args.posonlyargs.iter().chain(&args.args) {
            params.push(self.parameter(&arg.def, arg.default.as_deref())?);
        }
        if let Some(vararg) = &args.vararg {
            let mut param = self.parameter(vararg, None)?;
            param.is_rest = true;
            params.push(param);
        }
        for arg in &args.kwonlyargs {
            let mut param = self.parameter(&arg.def, arg.default.as_deref())?;
            param.is_keyword_only = true;
            params.push(param);
        }
        if let Some(kwarg) = &args.kwarg {
            let mut param = self.parameter(kwarg, None)?;
            param.is_rest = true;
            param.is_keyword_only = true;
            params.push(param);
        }
        Ok(params)
    }

    fn parameter(&mut self, arg: &ast::Arg, default: Option<&ast::Expr>) -> NormalizeResult<Parameter> {
        let mut param = Parameter::named(arg.arg.as_str());
        param.type_annotation = arg.annotation.as_ref().map(|a| self.segment(a.range()).to_string());
        param.default = default.map(|d| self.expr(d)).transpose()?;
        Ok(param)
    }

    /// Keyword bases such as `metaclass=Meta` have no IR slot and are kept
    /// as annotation text.
    fn class(&mut self, class: &ast::StmtClassDef) -> NormalizeResult<Node> {
        let metadata = Metadata {
            type_params: class.type_params.iter().map(|tp| type_param_name(tp).to_string()).collect(),
            annotations: class.keywords.iter().map(|k| self.segment(k.range).to_string()).collect(),
            ..Default::default()
        };
        let bases = self.exprs(&class.bases)?;
        let body = self.block(&class.body)?;
        let decorators = self.exprs(&class.decorator_list)?;
        Ok(self
            .node(
                NodeKind::ClassDef {
                    name: class.name.to_string(),
                    bases,
                    body,
                    decorators,
                },
                class.range,
            )
            .with_metadata(metadata))
    }

    /// `import a.b as c, d` yields one `Import` per alias.
    fn import(&self, import: &ast::StmtImport) -> Lowered {
        import
            .names
            .iter()
            .map(|alias| {
                let mut metadata = Metadata::default();
                if let Some(asname) = &alias.asname {
                    metadata.aliases.push((alias.name.to_string(), asname.to_string()));
                }
                self.node(
                    NodeKind::Import {
                        module: alias.name.to_string(),
                        names: Vec::new(),
                        is_star: false,
                    },
                    import.range,
                )
                .with_metadata(metadata)
            })
            .collect()
    }

    fn import_from(&self, import: &ast::StmtImportFrom) -> Node {
        let level = import.level.as_ref().map_or(0, |l| l.to_u32()) as usize;
        let mut module = ".".repeat(level);
        if let Some(name) = &import.module {
            module.push_str(name.as_str());
        }
        let mut metadata = Metadata::default();
        let mut names = Vec::new();
        let mut is_star = false;
        for alias in &import.names {
            if alias.name.as_str() == "*" {
                is_star = true;
                continue;
            }
            if let Some(asname) = &alias.asname {
                metadata.aliases.push((alias.name.to_string(), asname.to_string()));
            }
            names.push(alias.name.to_string());
        }
        self.node(NodeKind::Import { module, names, is_star }, import.range)
            .with_metadata(metadata)
    }

    fn expr(&mut self, expr: &ast::Expr) -> NormalizeResult<Node> {
        let range = expr.range();
        let kind = match expr {
            ast::Expr::BoolOp(b) => NodeKind::BoolOp {
                op: match b.op {
                    ast::BoolOp::And => BoolOperator::And,
                    ast::BoolOp::Or => BoolOperator::Or,
                },
                values: self.exprs(&b.values)?,
            },
            ast::Expr::BinOp(b) => NodeKind::BinaryOp {
                left: Box::new(self.expr(&b.left)?),
                op: binary_operator(&b.op),
                right: Box::new(self.expr(&b.right)?),
            },
            ast::Expr::UnaryOp(u) => NodeKind::UnaryOp {
                op: match u.op {
                    ast::UnaryOp::Invert => UnaryOperator::Invert,
                    ast::UnaryOp::Not => UnaryOperator::Not,
                    ast::UnaryOp::UAdd => UnaryOperator::Pos,
                    ast::UnaryOp::USub => UnaryOperator::Neg,
                },
                operand: Box::new(self.expr(&u.operand)?),
            },
            ast::Expr::Compare(c) => NodeKind::Compare {
                left: Box::new(self.expr(&c.left)?),
                ops: c.ops.iter().map(compare_operator).collect(),
                comparators: self.exprs(&c.comparators)?,
            },
            ast::Expr::Call(c) => {
                let mut args = self.exprs(&c.args)?;
                let mut kwargs = Vec::new();
                for keyword in &c.keywords {
                    let value = self.expr(&keyword.value)?;
                    match &keyword.arg {
                        Some(name) => kwargs.push((name.to_string(), value)),
                        None => args.push(self.synthetic(SyntheticCall::KwSpread, vec![value], Vec::new(), keyword.range)),
                    }
                }
                NodeKind::Call {
                    func: Box::new(self.expr(&c.func)?),
                    args,
                    kwargs,
                }
            }
            ast::Expr::Attribute(a) => NodeKind::Attribute {
                value: Box::new(self.expr(&a.value)?),
                attr: a.attr.to_string(),
            },
            ast::Expr::Subscript(s) => NodeKind::Subscript {
                value: Box::new(self.expr(&s.value)?),
                slice: Box::new(self.expr(&s.slice)?),
            },
            ast::Expr::Name(n) => NodeKind::Name { id: n.id.to_string() },
            ast::Expr::Constant(c) => match self.literal(&c.value, range)? {
                PyConstant::Tuple(elements) => return Ok(self.tuple_constant(elements, range)),
                PyConstant::Scalar(value) => NodeKind::Constant {
                    value,
                    raw: Some(self.segment(range).to_string()),
                },
            },
            ast::Expr::List(l) => NodeKind::List {
                elements: self.exprs(&l.elts)?,
            },
            ast::Expr::Tuple(t) => {
                let elements = self.exprs(&t.elts)?;
                return Ok(self
                    .node(NodeKind::List { elements }, range)
                    .with_metadata(Metadata::hint("tuple")));
            }
            ast::Expr::Dict(d) => {
                let mut keys = Vec::with_capacity(d.keys.len());
                for key in &d.keys {
                    keys.push(key.as_ref().map(|k| self.expr(k)).transpose()?);
                }
                NodeKind::Dict {
                    keys,
                    values: self.exprs(&d.values)?,
                }
            }
            ast::Expr::Set(s) => {
                let elements = self.exprs(&s.elts)?;
                return Ok(self.synthetic(SyntheticCall::Set, elements, Vec::new(), range));
            }
            ast::Expr::Starred(s) => {
                let value = self.expr(&s.value)?;
                return Ok(self.synthetic(SyntheticCall::Spread, vec![value], Vec::new(), range));
            }
            ast::Expr::Slice(s) => {
                let parts = [s.lower.as_deref(), s.upper.as_deref(), s.step.as_deref()];
                let mut args = Vec::with_capacity(3);
                for part in parts {
                    args.push(match part {
                        Some(p) => self.expr(p)?,
                        None => self.null(range),
                    });
                }
                return Ok(self.synthetic(SyntheticCall::Slice, args, Vec::new(), range));
            }
            ast::Expr::JoinedStr(j) => {
                let parts = self.exprs(&j.values)?;
                return Ok(self.synthetic(SyntheticCall::Format, parts, Vec::new(), range));
            }
            ast::Expr::FormattedValue(f) => return self.formatted_value(f),
            ast::Expr::Lambda(l) => {
                let params = self.parameters(&l.args)?;
                let value = self.expr(&l.body)?;
                let body = vec![self.node(
                    NodeKind::Return {
                        value: Some(Box::new(value)),
                    },
                    l.body.range(),
                )];
                NodeKind::FunctionDef {
                    name: SyntheticCall::Lambda.name().to_string(),
                    params,
                    is_generator: contains_yield(&body),
                    body,
                    return_type: None,
                    is_async: false,
                    decorators: Vec::new(),
                    docstring: None,
                }
            }
            ast::Expr::IfExp(i) => {
                let args = vec![self.expr(&i.test)?, self.expr(&i.body)?, self.expr(&i.orelse)?];
                return Ok(self.synthetic(SyntheticCall::Ternary, args, Vec::new(), range));
            }
            ast::Expr::ListComp(c) => return self.comprehension(SyntheticCall::ListComp, &c.elt, &c.generators, range),
            ast::Expr::SetComp(c) => return self.comprehension(SyntheticCall::SetComp, &c.elt, &c.generators, range),
            ast::Expr::GeneratorExp(c) => {
                return self.comprehension(SyntheticCall::GenExp, &c.elt, &c.generators, range)
            }
            ast::Expr::DictComp(c) => {
                let key = self.expr(&c.key)?;
                let value = self.expr(&c.value)?;
                let element = self.node(
                    NodeKind::Dict {
                        keys: vec![Some(key)],
                        values: vec![value],
                    },
                    c.key.range().cover(c.value.range()),
                );
                return self.comprehension_of(SyntheticCall::DictComp, element, &c.generators, range);
            }
            ast::Expr::Await(a) => {
                let value = self.expr(&a.value)?;
                return Ok(self.synthetic(SyntheticCall::Await, vec![value], Vec::new(), range));
            }
            ast::Expr::Yield(y) => {
                let args = self.opt_expr(y.value.as_deref())?.map(|b| vec![*b]).unwrap_or_default();
                return Ok(self.synthetic(SyntheticCall::Yield, args, Vec::new(), range));
            }
            ast::Expr::YieldFrom(y) => {
                let value = self.expr(&y.value)?;
                return Ok(self.synthetic(SyntheticCall::YieldFrom, vec![value], Vec::new(), range));
            }
            ast::Expr::NamedExpr(_) => return Err(self.unsupported("NamedExpr", range)),
        };
        Ok(self.node(kind, range))
    }

    fn literal(&self, constant: &ast::Constant, range: TextRange) -> NormalizeResult<PyConstant> {
        let value = match constant {
            ast::Constant::None => Literal::Null,
            ast::Constant::Bool(b) => Literal::Bool(*b),
            ast::Constant::Str(s) => Literal::Str(s.clone()),
            ast::Constant::Bytes(b) => Literal::Bytes(b.clone()),
            ast::Constant::Int(i) => match i64::try_from(i) {
                Ok(v) => Literal::Int(v),
                Err(_) => Literal::BigInt(i.to_string()),
            },
            ast::Constant::Float(f) => Literal::Float(*f),
            ast::Constant::Ellipsis => Literal::Ellipsis,
            ast::Constant::Tuple(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.literal(item, range)?);
                }
                return Ok(PyConstant::Tuple(out));
            }
            ast::Constant::Complex { .. } => return Err(self.unsupported("Complex", range)),
        };
        Ok(PyConstant::Scalar(value))
    }

    fn tuple_constant(&self, elements: Vec<PyConstant>, range: TextRange) -> Node {
        let elements = elements
            .into_iter()
            .map(|e| match e {
                PyConstant::Tuple(inner) => self.tuple_constant(inner, range),
                PyConstant::Scalar(value) => Node::constant(Language::Python, value, self.loc(range)),
            })
            .collect();
        self.node(NodeKind::List { elements }, range)
            .with_metadata(Metadata::hint("tuple"))
    }

    /// `f"{x!r:>10}"` parts. A plain `{x}` lowers to `x` itself.
    fn formatted_value(&mut self, value: &ast::ExprFormattedValue) -> NormalizeResult<Node> {
        let inner = self.expr(&value.value)?;
        let mut kwargs = Vec::new();
        let conversion = match value.conversion {
            ast::ConversionFlag::None => None,
            ast::ConversionFlag::Str => Some("s"),
            ast::ConversionFlag::Ascii => Some("a"),
            ast::ConversionFlag::Repr => Some("r"),
        };
        if let Some(flag) = conversion {
            kwargs.push((
                "conversion".to_string(),
                Node::constant(Language::Python, Literal::Str(flag.to_string()), self.loc(value.range)),
            ));
        }
        if let Some(spec) = value.format_spec.as_deref() {
            kwargs.push(("format_spec".to_string(), self.expr(spec)?));
        }
        if kwargs.is_empty() {
            return Ok(inner);
        }
        Ok(self.synthetic(SyntheticCall::FormatValue, vec![inner], kwargs, value.range))
    }

    fn comprehension(
        &mut self,
        call: SyntheticCall,
        element: &ast::Expr,
        generators: &[ast::Comprehension],
        range: TextRange,
    ) -> NormalizeResult<Node> {
        let element = self.expr(element)?;
        self.comprehension_of(call, element, generators, range)
    }

    /// `<listcomp>(element, target, iter, conditions=[..])`; further `for`
    /// clauses go to `generators=[<comprehension>(target, iter, conditions=[..]), ..]`.
    fn comprehension_of(
        &mut self,
        call: SyntheticCall,
        element: Node,
        generators: &[ast::Comprehension],
        range: TextRange,
    ) -> NormalizeResult<Node> {
        let Some((first, rest)) = generators.split_first() else {
            return Err(self.unsupported(call.name(), range));
        };
        let args = vec![element, self.expr(&first.target)?, self.expr(&first.iter)?];
        let conditions = self.exprs(&first.ifs)?;
        let mut kwargs = vec![(
            "conditions".to_string(),
            Node::list(Language::Python, conditions, self.loc(clause_range(first))),
        )];

        if !rest.is_empty() {
            let mut clauses = Vec::with_capacity(rest.len());
            for clause in rest {
                let clause_args = vec![self.expr(&clause.target)?, self.expr(&clause.iter)?];
                let conditions = self.exprs(&clause.ifs)?;
                let conditions = Node::list(Language::Python, conditions, self.loc(clause_range(clause)));
                clauses.push(self.synthetic(
                    SyntheticCall::Comprehension,
                    clause_args,
                    vec![("conditions".to_string(), conditions)],
                    clause_range(clause),
                ));
            }
            kwargs.push((
                "generators".to_string(),
                Node::list(Language::Python, clauses, self.loc(range)),
            ));
        }

        let mut metadata = Metadata {
            generator_count: Some(generators.len()),
            ..Default::default()
        };
        if generators.iter().any(|g| g.is_async) {
            metadata.modifiers.push("async".to_string());
        }
        Ok(self.synthetic(call, args, kwargs, range).with_metadata(metadata))
    }
}

/// A constant before it is placed in the tree; tuples only appear after
/// constant folding by the parser.
enum PyConstant {
    Scalar(Literal),
    Tuple(Vec<PyConstant>),
}

fn binary_operator(op: &ast::Operator) -> BinaryOperator {
    match op {
        ast::Operator::Add => BinaryOperator::Add,
        ast::Operator::Sub => BinaryOperator::Sub,
        ast::Operator::Mult => BinaryOperator::Mul,
        ast::Operator::MatMult => BinaryOperator::MatMul,
        ast::Operator::Div => BinaryOperator::Div,
        ast::Operator::Mod => BinaryOperator::Mod,
        ast::Operator::Pow => BinaryOperator::Pow,
        ast::Operator::LShift => BinaryOperator::LShift,
        ast::Operator::RShift => BinaryOperator::RShift,
        ast::Operator::BitOr => BinaryOperator::BitOr,
        ast::Operator::BitXor => BinaryOperator::BitXor,
        ast::Operator::BitAnd => BinaryOperator::BitAnd,
        ast::Operator::FloorDiv => BinaryOperator::FloorDiv,
    }
}

fn compare_operator(op: &ast::CmpOp) -> CompareOperator {
    match op {
        ast::CmpOp::Eq => CompareOperator::Eq,
        ast::CmpOp::NotEq => CompareOperator::NotEq,
        ast::CmpOp::Lt => CompareOperator::Lt,
        ast::CmpOp::LtE => CompareOperator::LtE,
        ast::CmpOp::Gt => CompareOperator::Gt,
        ast::CmpOp::GtE => CompareOperator::GtE,
        ast::CmpOp::Is => CompareOperator::Is,
        ast::CmpOp::IsNot => CompareOperator::IsNot,
        ast::CmpOp::In => CompareOperator::In,
        ast::CmpOp::NotIn => CompareOperator::NotIn,
    }
}

/// Comprehension clauses carry no range of their own.
fn clause_range(clause: &ast::Comprehension) -> TextRange {
    let end = clause.ifs.last().map_or(clause.iter.range(), |last| last.range());
    clause.target.range().cover(end)
}

fn type_param_name(param: &ast::TypeParam) -> &str {
    match param {
        ast::TypeParam::TypeVar(t) => t.name.as_str(),
        ast::TypeParam::ParamSpec(p) => p.name.as_str(),
        ast::TypeParam::TypeVarTuple(t) => t.name.as_str(),
    }
}

fn docstring(body: &[ast::Stmt]) -> Option<String> {
    let ast::Stmt::Expr(first) = body.first()? else {
        return None;
    };
    match first.value.as_ref() {
        ast::Expr::Constant(ast::ExprConstant {
            value: ast::Constant::Str(text),
            ..
        }) => Some(text.clone()),
        _ => None,
    }
}

/// Whether a lowered body yields, not counting nested functions and classes.
fn contains_yield(body: &[Node]) -> bool {
    body.iter().any(|node| match &node.kind {
        NodeKind::FunctionDef { .. } | NodeKind::ClassDef { .. } => false,
        _ => {
            matches!(
                node.as_synthetic_call(),
                Some((SyntheticCall::Yield | SyntheticCall::YieldFrom, _, _))
            ) || children(node).into_iter().any(|child| contains_yield(std::slice::from_ref(child)))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(source: &str) -> Module {
        PythonNormalizer::new().normalize(source, "test.py").unwrap()
    }

    fn only_stmt(source: &str) -> Node {
        let mut module = normalize(source);
        assert_eq!(module.body.len(), 1, "{:?}", module.body);
        module.body.remove(0)
    }

    #[test]
    fn generator_detection_ignores_nested_functions() {
        let outer = only_stmt("def f():\n    def g():\n        yield 1\n    return g\n");
        let NodeKind::FunctionDef { is_generator, body, .. } = &outer.kind else {
            panic!("expected function");
        };
        assert!(!is_generator);
        assert!(matches!(&body[0].kind, NodeKind::FunctionDef { is_generator: true, .. }));
    }

    #[test]
    fn parameters_cover_every_kind() {
        let f = only_stmt("def f(a, /, b: int = 1, *args, c, **kw) -> str:\n    pass\n");
        let NodeKind::FunctionDef { params, return_type, .. } = &f.kind else {
            panic!("expected function");
        };
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "args", "c", "kw"]);
        assert_eq!(params[1].type_annotation.as_deref(), Some("int"));
        assert!(params[1].default.is_some());
        assert!(params[2].is_rest && !params[2].is_keyword_only);
        assert!(params[3].is_keyword_only && !params[3].is_rest);
        assert!(params[4].is_rest && params[4].is_keyword_only);
        assert_eq!(return_type.as_deref(), Some("str"));
    }

    #[test]
    fn relative_star_import() {
        let import = only_stmt("from ..pkg import *\n");
        assert_eq!(
            import.kind,
            NodeKind::Import {
                module: "..pkg".into(),
                names: vec![],
                is_star: true,
            }
        );
    }

    #[test]
    fn plain_format_value_is_the_expression() {
        let stmt = only_stmt("f'{x} and {y!r}'\n");
        let NodeKind::ExprStmt { value } = &stmt.kind else {
            panic!("expected expression statement");
        };
        let (call, args, _) = value.as_synthetic_call().unwrap();
        assert_eq!(call, SyntheticCall::Format);
        assert!(args.iter().any(|a| a.as_name() == Some("x")));
        assert!(args
            .iter()
            .any(|a| matches!(a.as_synthetic_call(), Some((SyntheticCall::FormatValue, _, _)))));
    }

    #[test]
    fn big_integers_keep_their_digits() {
        let stmt = only_stmt("x = 123456789012345678901234567890\n");
        let NodeKind::Assign { value, .. } = &stmt.kind else {
            panic!("expected assignment");
        };
        assert_eq!(
            value.as_literal(),
            Some(&Literal::BigInt("123456789012345678901234567890".into()))
        );
    }

    #[test]
    fn nested_comprehension_keeps_every_clause() {
        let stmt = only_stmt("[b for a in xs if a for b in a]\n");
        let NodeKind::ExprStmt { value } = &stmt.kind else {
            panic!("expected expression statement");
        };
        let (call, args, kwargs) = value.as_synthetic_call().unwrap();
        assert_eq!(call, SyntheticCall::ListComp);
        let names: Vec<_> = args.iter().map(|a| a.as_name()).collect();
        assert_eq!(names, [Some("b"), Some("a"), Some("xs")]);

        let keys: Vec<_> = kwargs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["conditions", "generators"]);
        let NodeKind::List { elements } = &kwargs[1].1.kind else {
            panic!("expected clause list");
        };
        assert_eq!(elements.len(), 1);
        assert!(matches!(
            elements[0].as_synthetic_call(),
            Some((SyntheticCall::Comprehension, _, _))
        ));
        assert_eq!(value.metadata.generator_count, Some(2));
    }
}
