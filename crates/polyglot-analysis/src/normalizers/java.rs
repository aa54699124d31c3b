//! Java normalizer over tree-sitter-java.
//!
//! Modifiers, annotations, generic type parameters and `throws` lists are
//! collected into node metadata; annotations also become `decorators`.

use polyglot_core::errors::NormalizeResult;
use smallvec::smallvec;
use tree_sitter::Node as TsNode;

use super::grammar::{
    self, children_by_field, find_child_by_kind, has_token, named_children, parse_int, unescape, GrammarCtx,
    GrammarFrontend, GrammarRules,
};
use super::{Lowered, NodeNormalizer, Normalizer};
use crate::ir::{
    AugAssignOperator, ExceptHandler, Literal, Metadata, Module, Node, NodeKind, Parameter, SwitchCase, SyntheticCall,
    UnaryOperator,
};
use crate::language::Language;
use crate::parsers::ParseCache;

pub struct JavaNormalizer {
    frontend: GrammarFrontend,
}

impl JavaNormalizer {
    /// A normalizer with the default-capacity parse cache.
    pub fn new() -> Self {
        Self::with_cache(Some(ParseCache::default()))
    }

    pub fn with_cache(cache: Option<ParseCache>) -> Self {
        Self {
            frontend: GrammarFrontend::new(Language::Java, cache),
        }
    }

    pub fn frontend(&self) -> &GrammarFrontend {
        &self.frontend
    }
}

impl Default for JavaNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for JavaNormalizer {
    fn language(&self) -> Language {
        Language::Java
    }

    fn normalize(&self, source: &str, filename: &str) -> NormalizeResult<Module> {
        let parsed = self.frontend.parse(source, filename)?;
        let mut lowerer = JavaLowerer {
            ctx: GrammarCtx::new(Language::Java, &parsed.source, filename),
            package: None,
        };
        let mut module = grammar::lower_program(&mut lowerer, parsed.root_node(), parsed.error_count)?;
        module.metadata.namespace = lowerer.package;
        Ok(module)
    }
}

struct JavaLowerer<'s> {
    ctx: GrammarCtx<'s>,
    package: Option<String>,
}

impl<'t> NodeNormalizer<TsNode<'t>> for JavaLowerer<'_> {
    fn normalize_node(&mut self, node: TsNode<'t>) -> NormalizeResult<Lowered> {
        grammar::lower(self, node)
    }
}

impl GrammarRules for JavaLowerer<'_> {
    fn ctx(&self) -> &GrammarCtx<'_> {
        &self.ctx
    }

    fn dispatch(&mut self, node: TsNode<'_>) -> NormalizeResult<Lowered> {
        let lowered: Lowered = match node.kind() {
            "program" | "block" | "constructor_body" | "enum_body_declarations" => {
                grammar::lower_block(self, node)?.into()
            }
            "package_declaration" => {
                self.package = named_children(&node)
                    .into_iter()
                    .find(|c| matches!(c.kind(), "identifier" | "scoped_identifier"))
                    .map(|c| self.ctx.text(&c).to_string());
                Lowered::new()
            }
            "import_declaration" => smallvec![self.import(node)],

            // ---- Declarations ----
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration" => smallvec![self.class_like(node)?],
            "method_declaration"
            | "constructor_declaration"
            | "compact_constructor_declaration"
            | "annotation_type_element_declaration" => smallvec![self.method(node)?],
            "static_initializer" => smallvec![self.static_initializer(node)?],
            "field_declaration" | "local_variable_declaration" | "constant_declaration" => {
                self.variables(node)?
            }

            // ---- Statements ----
            "expression_statement" => {
                let inner = self.first_named(&node)?;
                let value = self.expr(inner)?;
                smallvec![grammar::expression_statement(&self.ctx, value, &node)]
            }
            "if_statement" => smallvec![self.if_statement(node)?],
            "while_statement" => {
                let test = self.condition(&node)?;
                let body_node = self.ctx.required(&node, "body")?;
                self.ctx.enter_loop(Vec::new());
                let body = self.statement_body(body_node);
                self.ctx.exit_loop();
                smallvec![self.ctx.node(
                    NodeKind::While {
                        test: Box::new(test),
                        body: body?,
                        orelse: Vec::new(),
                    },
                    &node,
                )]
            }
            "for_statement" => self.for_statement(node)?,
            "enhanced_for_statement" => smallvec![self.enhanced_for(node)?],
            "do_statement" => smallvec![self.do_statement(node)?],
            "break_statement" => {
                if !named_children(&node).is_empty() {
                    return Err(self.ctx.unsupported(&node));
                }
                smallvec![self.ctx.node(NodeKind::Break, &node)]
            }
            "continue_statement" => {
                if !named_children(&node).is_empty() {
                    return Err(self.ctx.unsupported(&node));
                }
                self.ctx.lower_continue(&node)
            }
            "return_statement" => {
                let value = match named_children(&node).into_iter().next() {
                    Some(v) => Some(Box::new(self.expr(v)?)),
                    None => None,
                };
                smallvec![self.ctx.node(NodeKind::Return { value }, &node)]
            }
            "throw_statement" => {
                let exc = self.expr(self.first_named(&node)?)?;
                smallvec![self.ctx.node(
                    NodeKind::Raise {
                        exc: Some(Box::new(exc)),
                        cause: None,
                    },
                    &node,
                )]
            }
            "try_statement" => smallvec![self.try_statement(node)?],
            "switch_expression" => smallvec![self.switch(node)?],
            "explicit_constructor_invocation" => {
                let call = self.constructor_invocation(node)?;
                smallvec![grammar::expression_statement(&self.ctx, call, &node)]
            }

            // ---- Expressions ----
            _ => smallvec![self.expression(node)?],
        };
        Ok(lowered)
    }
}

impl<'s> JavaLowerer<'s> {
    fn expr(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        grammar::lower_expr(self, node)
    }

    fn exprs(&mut self, nodes: Vec<TsNode<'_>>) -> NormalizeResult<Vec<Node>> {
        nodes.into_iter().map(|n| self.expr(n)).collect()
    }

    fn statement_body(&mut self, node: TsNode<'_>) -> NormalizeResult<Vec<Node>> {
        grammar::lower_body(self, node, "block")
    }

    fn first_named<'t>(&self, node: &TsNode<'t>) -> NormalizeResult<TsNode<'t>> {
        named_children(node)
            .into_iter()
            .next()
            .ok_or_else(|| self.ctx.unsupported(node))
    }

    /// The expression inside a `condition: parenthesized_expression` field.
    fn condition(&mut self, node: &TsNode<'_>) -> NormalizeResult<Node> {
        let cond = self.ctx.required(node, "condition")?;
        self.expr(cond)
    }

    fn type_name(&self, node: &TsNode<'_>) -> Node {
        let ty = if node.kind() == "generic_type" {
            named_children(node).into_iter().next().unwrap_or(*node)
        } else {
            *node
        };
        self.ctx.name(self.ctx.text(&ty), node)
    }

    fn import(&self, node: TsNode<'_>) -> Node {
        let path = named_children(&node)
            .into_iter()
            .find(|c| matches!(c.kind(), "identifier" | "scoped_identifier"))
            .map(|c| self.ctx.text(&c).to_string())
            .unwrap_or_default();
        let is_star = find_child_by_kind(&node, "asterisk").is_some();
        let (module, names) = if is_star {
            (path, Vec::new())
        } else {
            match path.rsplit_once('.') {
                Some((module, name)) => (module.to_string(), vec![name.to_string()]),
                None => (String::new(), vec![path]),
            }
        };
        let mut metadata = Metadata::default();
        if has_token(&node, "static") {
            metadata.modifiers.push("static".to_string());
        }
        self.ctx
            .node(NodeKind::Import { module, names, is_star }, &node)
            .with_metadata(metadata)
    }

    fn declaration_metadata(&self, node: &TsNode<'_>) -> (Vec<Node>, Metadata) {
        let (decorators, annotations) = self.ctx.collect_annotations(node);
        let metadata = Metadata {
            modifiers: self.ctx.collect_modifiers(node),
            annotations,
            type_params: self.ctx.collect_type_params(node),
            throws: self.ctx.collect_throws(node),
            ..Default::default()
        };
        (decorators, metadata)
    }

    fn class_like(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let name = self.ctx.text(&self.ctx.required(&node, "name")?).to_string();
        let (decorators, mut metadata) = self.declaration_metadata(&node);
        metadata.kind_hint = match node.kind() {
            "interface_declaration" => Some("interface".to_string()),
            "enum_declaration" => Some("enum".to_string()),
            "record_declaration" => Some("record".to_string()),
            "annotation_type_declaration" => Some("annotation".to_string()),
            _ => None,
        };

        let mut bases = Vec::new();
        if let Some(superclass) = node.child_by_field_name("superclass") {
            bases.extend(named_children(&superclass).iter().map(|t| self.type_name(t)));
        }
        let interfaces = node
            .child_by_field_name("interfaces")
            .or_else(|| find_child_by_kind(&node, "extends_interfaces"));
        if let Some(interfaces) = interfaces {
            for list in named_children(&interfaces) {
                bases.extend(named_children(&list).iter().map(|t| self.type_name(t)));
            }
        }

        let mut body = Vec::new();
        if let Some(params) = node.child_by_field_name("parameters") {
            for component in self.parameters(params)? {
                let value = self.ctx.implicit(Literal::Undefined, &params);
                let target = self.ctx.name(component.name.clone(), &params);
                body.push(self.ctx.node(
                    NodeKind::Assign {
                        targets: vec![target],
                        value: Box::new(value),
                        declaration_kind: component.type_annotation,
                    },
                    &params,
                ));
            }
        }
        let class_body = self.ctx.required(&node, "body")?;
        for member in named_children(&class_body) {
            if member.kind() == "enum_constant" {
                body.push(self.enum_constant(member, &name)?);
            } else {
                body.extend(self.normalize_node(member)?);
            }
        }

        Ok(self
            .ctx
            .node(
                NodeKind::ClassDef {
                    name,
                    bases,
                    body,
                    decorators,
                },
                &node,
            )
            .with_metadata(metadata))
    }

    fn enum_constant(&mut self, node: TsNode<'_>, enum_name: &str) -> NormalizeResult<Node> {
        let name = self.ctx.required(&node, "name")?;
        let args = match node.child_by_field_name("arguments") {
            Some(list) => self.exprs(named_children(&list))?,
            None => Vec::new(),
        };
        let call = self.ctx.node(
            NodeKind::Call {
                func: Box::new(self.ctx.name(enum_name, &node)),
                args,
                kwargs: Vec::new(),
            },
            &node,
        );
        Ok(self.ctx.node(
            NodeKind::Assign {
                targets: vec![self.ctx.name(self.ctx.text(&name), &name)],
                value: Box::new(call),
                declaration_kind: Some("enum_constant".to_string()),
            },
            &node,
        ))
    }

    fn parameters(&mut self, node: TsNode<'_>) -> NormalizeResult<Vec<Parameter>> {
        let mut params = Vec::new();
        for child in named_children(&node) {
            match child.kind() {
                "formal_parameter" => {
                    let mut param = Parameter::named(self.ctx.text(&self.ctx.required(&child, "name")?));
                    param.type_annotation = Some(self.ctx.text(&self.ctx.required(&child, "type")?).to_string());
                    params.push(param);
                }
                "spread_parameter" => {
                    let declarator = find_child_by_kind(&child, "variable_declarator")
                        .ok_or_else(|| self.ctx.unsupported(&child))?;
                    let mut param = Parameter::named(self.ctx.text(&self.ctx.required(&declarator, "name")?));
                    param.type_annotation = named_children(&child)
                        .into_iter()
                        .find(|c| c.kind() != "modifiers" && c.kind() != "variable_declarator")
                        .map(|t| format!("{}...", self.ctx.text(&t)));
                    param.is_rest = true;
                    params.push(param);
                }
                "identifier" => params.push(Parameter::named(self.ctx.text(&child))),
                "receiver_parameter" => {}
                _ => return Err(self.ctx.unsupported(&child)),
            }
        }
        Ok(params)
    }

    fn function_body(&mut self, node: Option<TsNode<'_>>) -> NormalizeResult<Vec<Node>> {
        let Some(body) = node else {
            return Ok(Vec::new());
        };
        self.ctx.enter_function();
        let lowered = grammar::lower_block(self, body);
        self.ctx.exit_function();
        lowered
    }

    fn method(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let name = self.ctx.text(&self.ctx.required(&node, "name")?).to_string();
        let (decorators, mut metadata) = self.declaration_metadata(&node);
        if node.kind() != "method_declaration" && node.kind() != "annotation_type_element_declaration" {
            metadata.kind_hint = Some("constructor".to_string());
        }
        let params = match node.child_by_field_name("parameters") {
            Some(p) => self.parameters(p)?,
            None => Vec::new(),
        };
        let return_type = node
            .child_by_field_name("type")
            .map(|t| self.ctx.text(&t).to_string());
        let docstring = self.ctx.doc_comment(&node);
        let body = self.function_body(node.child_by_field_name("body"))?;
        Ok(self
            .ctx
            .node(
                NodeKind::FunctionDef {
                    name,
                    params,
                    body,
                    return_type,
                    is_async: false,
                    is_generator: false,
                    decorators,
                    docstring,
                },
                &node,
            )
            .with_metadata(metadata))
    }

    /// `static { ... }` as a function named like the JVM names it.
    fn static_initializer(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let block = find_child_by_kind(&node, "block");
        let body = self.function_body(block)?;
        let metadata = Metadata {
            modifiers: vec!["static".to_string()],
            kind_hint: Some("static_initializer".to_string()),
            ..Default::default()
        };
        Ok(self
            .ctx
            .node(
                NodeKind::FunctionDef {
                    name: "<clinit>".to_string(),
                    params: Vec::new(),
                    body,
                    return_type: None,
                    is_async: false,
                    is_generator: false,
                    decorators: Vec::new(),
                    docstring: None,
                },
                &node,
            )
            .with_metadata(metadata))
    }

    /// One `Assign` per declarator. A declarator without initializer gets
    /// `Literal::Undefined`.
    fn variables(&mut self, node: TsNode<'_>) -> NormalizeResult<Lowered> {
        let type_text = self.ctx.text(&self.ctx.required(&node, "type")?).to_string();
        let (_, base) = self.declaration_metadata(&node);
        let mut out = Lowered::new();
        for declarator in children_by_field(&node, "declarator") {
            let name = self.ctx.required(&declarator, "name")?;
            let value = match declarator.child_by_field_name("value") {
                Some(v) => self.expr(v)?,
                None => self.ctx.implicit(Literal::Undefined, &declarator),
            };
            let metadata = Metadata {
                type_annotation: Some(type_text.clone()),
                ..base.clone()
            };
            out.push(
                self.ctx
                    .node(
                        NodeKind::Assign {
                            targets: vec![self.ctx.name(self.ctx.text(&name), &name)],
                            value: Box::new(value),
                            declaration_kind: Some(type_text.clone()),
                        },
                        &declarator,
                    )
                    .with_metadata(metadata),
            );
        }
        Ok(out)
    }

    fn if_statement(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let test = self.condition(&node)?;
        let body = self.statement_body(self.ctx.required(&node, "consequence")?)?;
        let orelse = match node.child_by_field_name("alternative") {
            Some(alt) => self.statement_body(alt)?,
            None => Vec::new(),
        };
        Ok(self.ctx.node(
            NodeKind::If {
                test: Box::new(test),
                body,
                orelse,
            },
            &node,
        ))
    }

    /// `for (init; cond; update) body` as `init; while (cond) { body; update }`.
    fn for_statement(&mut self, node: TsNode<'_>) -> NormalizeResult<Lowered> {
        let mut out = Lowered::new();
        for init in children_by_field(&node, "init") {
            if init.kind() == "local_variable_declaration" {
                out.extend(self.variables(init)?);
            } else {
                let value = self.expr(init)?;
                out.push(grammar::expression_statement(&self.ctx, value, &init));
            }
        }
        let test = match node.child_by_field_name("condition") {
            Some(cond) => self.expr(cond)?,
            None => self.ctx.implicit(Literal::Bool(true), &node),
        };
        let mut update = Vec::new();
        for u in children_by_field(&node, "update") {
            let value = self.expr(u)?;
            update.push(grammar::expression_statement(&self.ctx, value, &u));
        }

        let body_node = self.ctx.required(&node, "body")?;
        self.ctx.enter_loop(update.clone());
        let body = self.statement_body(body_node);
        self.ctx.exit_loop();
        let mut body = body?;
        body.extend(update);

        out.push(
            self.ctx
                .node(
                    NodeKind::While {
                        test: Box::new(test),
                        body,
                        orelse: Vec::new(),
                    },
                    &node,
                )
                .with_metadata(Metadata::desugared("for_statement")),
        );
        Ok(out)
    }

    fn enhanced_for(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let name = self.ctx.required(&node, "name")?;
        let target = self.ctx.name(self.ctx.text(&name), &name);
        let iter = self.expr(self.ctx.required(&node, "value")?)?;
        let type_annotation = node.child_by_field_name("type").map(|t| self.ctx.text(&t).to_string());

        let body_node = self.ctx.required(&node, "body")?;
        self.ctx.enter_loop(Vec::new());
        let body = self.statement_body(body_node);
        self.ctx.exit_loop();

        Ok(self
            .ctx
            .node(
                NodeKind::For {
                    target: Box::new(target),
                    iter: Box::new(iter),
                    body: body?,
                    orelse: Vec::new(),
                },
                &node,
            )
            .with_metadata(Metadata {
                type_annotation,
                ..Default::default()
            }))
    }

    /// `do body while (cond)` as `while (true) { body; if (!cond) break; }`.
    fn do_statement(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let cond = self.condition(&node)?;
        let exit_check = self.loop_exit_check(cond, &node);

        let body_node = self.ctx.required(&node, "body")?;
        self.ctx.enter_loop(vec![exit_check.clone()]);
        let body = self.statement_body(body_node);
        self.ctx.exit_loop();
        let mut body = body?;
        body.push(exit_check);

        Ok(self
            .ctx
            .node(
                NodeKind::While {
                    test: Box::new(self.ctx.implicit(Literal::Bool(true), &node)),
                    body,
                    orelse: Vec::new(),
                },
                &node,
            )
            .with_metadata(Metadata::desugared("do_statement")))
    }

    fn loop_exit_check(&self, cond: Node, at: &TsNode<'_>) -> Node {
        let negated = self.ctx.node(
            NodeKind::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(cond),
            },
            at,
        );
        self.ctx.node(
            NodeKind::If {
                test: Box::new(negated),
                body: vec![self.ctx.node(NodeKind::Break, at)],
                orelse: Vec::new(),
            },
            at,
        )
    }

    fn try_statement(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let body = grammar::lower_block(self, self.ctx.required(&node, "body")?)?;
        let mut handlers = Vec::new();
        let mut finalbody = Vec::new();
        for child in named_children(&node) {
            match child.kind() {
                "catch_clause" => handlers.push(self.catch_clause(child)?),
                "finally_clause" => {
                    if let Some(block) = find_child_by_kind(&child, "block") {
                        finalbody = grammar::lower_block(self, block)?;
                    }
                }
                _ => {}
            }
        }
        Ok(self.ctx.node(
            NodeKind::Try {
                body,
                handlers,
                orelse: Vec::new(),
                finalbody,
            },
            &node,
        ))
    }

    fn catch_clause(&mut self, node: TsNode<'_>) -> NormalizeResult<ExceptHandler> {
        let param = find_child_by_kind(&node, "catch_formal_parameter").ok_or_else(|| self.ctx.unsupported(&node))?;
        let types: Vec<Node> = find_child_by_kind(&param, "catch_type")
            .map(|ct| named_children(&ct).iter().map(|t| self.type_name(t)).collect())
            .unwrap_or_default();
        let exc_type = match types.len() {
            0 => None,
            1 => types.into_iter().next(),
            _ => Some(
                self.ctx
                    .node(NodeKind::List { elements: types }, &param)
                    .with_metadata(Metadata::hint("union")),
            ),
        };
        let name = param
            .child_by_field_name("name")
            .map(|n| self.ctx.text(&n).to_string());
        let body = grammar::lower_block(self, self.ctx.required(&node, "body")?)?;
        Ok(ExceptHandler {
            exc_type,
            name,
            body,
            loc: self.ctx.loc(&node),
        })
    }

    /// Statement groups fall through; arrow rules get an explicit `Break`.
    /// Several labels on one group become empty fall-through cases.
    fn switch(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let discriminant = self.condition(&node)?;
        let block = self.ctx.required(&node, "body")?;
        let mut cases = Vec::new();
        for entry in named_children(&block) {
            let is_rule = match entry.kind() {
                "switch_block_statement_group" => false,
                "switch_rule" => true,
                _ => return Err(self.ctx.unsupported(&entry)),
            };
            let mut values = Vec::new();
            let mut body = Vec::new();
            for child in named_children(&entry) {
                if child.kind() == "switch_label" {
                    let exprs = named_children(&child);
                    if exprs.is_empty() {
                        values.push(None);
                    }
                    for e in exprs {
                        values.push(Some(self.expr(e)?));
                    }
                } else {
                    body.extend(self.normalize_node(child)?);
                }
            }
            if is_rule {
                body.push(self.ctx.node(NodeKind::Break, &entry));
            }
            let last = values.len().saturating_sub(1);
            for (i, value) in values.into_iter().enumerate() {
                let case_body = if i == last { std::mem::take(&mut body) } else { Vec::new() };
                cases.push(SwitchCase {
                    value,
                    body: case_body,
                    loc: self.ctx.loc(&entry),
                });
            }
        }
        Ok(self.ctx.node(
            NodeKind::Switch {
                discriminant: Box::new(discriminant),
                cases,
            },
            &node,
        ))
    }

    /// `this(..)` / `super(..)` at the top of a constructor.
    fn constructor_invocation(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let constructor = self.ctx.required(&node, "constructor")?;
        let mut func = self.ctx.name(self.ctx.text(&constructor), &constructor);
        if let Some(object) = node.child_by_field_name("object") {
            let object = self.expr(object)?;
            func = self.ctx.node(
                NodeKind::Attribute {
                    value: Box::new(object),
                    attr: "super".to_string(),
                },
                &constructor,
            );
        }
        let args = self.arguments(&node)?;
        Ok(self.ctx.node(
            NodeKind::Call {
                func: Box::new(func),
                args,
                kwargs: Vec::new(),
            },
            &node,
        ))
    }

    fn arguments(&mut self, node: &TsNode<'_>) -> NormalizeResult<Vec<Node>> {
        match node.child_by_field_name("arguments") {
            Some(list) => self.exprs(named_children(&list)),
            None => Ok(Vec::new()),
        }
    }

    fn expression(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let kind = match node.kind() {
            "parenthesized_expression" => return self.expr(self.first_named(&node)?),
            "identifier" | "type_identifier" => NodeKind::Name {
                id: self.ctx.text(&node).to_string(),
            },
            "this" | "super" => NodeKind::Name {
                id: node.kind().to_string(),
            },
            "scoped_identifier" => NodeKind::Attribute {
                value: Box::new(self.expr(self.ctx.required(&node, "scope")?)?),
                attr: self.ctx.text(&self.ctx.required(&node, "name")?).to_string(),
            },
            "assignment_expression" => return self.assignment(node),
            "binary_expression" => return self.binary(node),
            "unary_expression" => {
                let operator = self.ctx.required(&node, "operator")?;
                let op = UnaryOperator::from_token(self.ctx.text(&operator)).ok_or_else(|| self.ctx.unsupported(&node))?;
                NodeKind::UnaryOp {
                    op,
                    operand: Box::new(self.expr(self.ctx.required(&node, "operand")?)?),
                }
            }
            "update_expression" => {
                let target = self.expr(self.first_named(&node)?)?;
                return Ok(grammar::update_assignment(&self.ctx, target, has_token(&node, "++"), &node));
            }
            "ternary_expression" => {
                let args = vec![
                    self.expr(self.ctx.required(&node, "condition")?)?,
                    self.expr(self.ctx.required(&node, "consequence")?)?,
                    self.expr(self.ctx.required(&node, "alternative")?)?,
                ];
                return Ok(self.ctx.synthetic(SyntheticCall::Ternary, args, &node));
            }
            "instanceof_expression" => {
                let left = self.expr(self.ctx.required(&node, "left")?)?;
                let right = node
                    .child_by_field_name("right")
                    .ok_or_else(|| self.ctx.unsupported(&node))?;
                let mut kwargs = Vec::new();
                if let Some(binding) = node.child_by_field_name("name") {
                    kwargs.push(("binding".to_string(), self.ctx.name(self.ctx.text(&binding), &binding)));
                }
                return Ok(Node::synthetic_call(
                    Language::Java,
                    SyntheticCall::InstanceOf,
                    vec![left, self.type_name(&right)],
                    kwargs,
                    self.ctx.loc(&node),
                ));
            }
            "cast_expression" => {
                let ty = self.ctx.required(&node, "type")?;
                let value = self.expr(self.ctx.required(&node, "value")?)?;
                return Ok(self
                    .ctx
                    .synthetic(SyntheticCall::Cast, vec![self.type_name(&ty), value], &node));
            }
            "method_invocation" => {
                let name = self.ctx.required(&node, "name")?;
                let attr = self.ctx.text(&name).to_string();
                let func = match node.child_by_field_name("object") {
                    Some(object) => {
                        let value = self.expr(object)?;
                        self.ctx.node(
                            NodeKind::Attribute {
                                value: Box::new(value),
                                attr,
                            },
                            &name,
                        )
                    }
                    None => self.ctx.name(attr, &name),
                };
                NodeKind::Call {
                    func: Box::new(func),
                    args: self.arguments(&node)?,
                    kwargs: Vec::new(),
                }
            }
            "object_creation_expression" => return self.object_creation(node),
            "field_access" => NodeKind::Attribute {
                value: Box::new(self.expr(self.ctx.required(&node, "object")?)?),
                attr: self.ctx.text(&self.ctx.required(&node, "field")?).to_string(),
            },
            "array_access" => NodeKind::Subscript {
                value: Box::new(self.expr(self.ctx.required(&node, "array")?)?),
                slice: Box::new(self.expr(self.ctx.required(&node, "index")?)?),
            },
            "array_creation_expression" => return self.array_creation(node),
            "array_initializer" => {
                let elements = self.exprs(named_children(&node))?;
                return Ok(self
                    .ctx
                    .node(NodeKind::List { elements }, &node)
                    .with_metadata(Metadata::hint("array")));
            }
            "lambda_expression" => return self.lambda(node),
            "method_reference" => {
                let target = self.first_named(&node)?;
                let value = if target.kind().ends_with("type") || target.kind().ends_with("type_identifier") {
                    self.type_name(&target)
                } else {
                    self.expr(target)?
                };
                let attr = self
                    .ctx
                    .text(&node)
                    .rsplit("::")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                return Ok(self
                    .ctx
                    .node(
                        NodeKind::Attribute {
                            value: Box::new(value),
                            attr,
                        },
                        &node,
                    )
                    .with_metadata(Metadata::hint("method_reference")));
            }
            "class_literal" => NodeKind::Attribute {
                value: Box::new(self.type_name(&self.first_named(&node)?)),
                attr: "class".to_string(),
            },
            "switch_expression" => return self.switch(node),

            // ---- Literals ----
            "true" => return Ok(self.ctx.constant(Literal::Bool(true), &node)),
            "false" => return Ok(self.ctx.constant(Literal::Bool(false), &node)),
            "null_literal" => return Ok(self.ctx.constant(Literal::Null, &node)),
            "decimal_integer_literal" | "hex_integer_literal" | "octal_integer_literal" | "binary_integer_literal" => {
                let value = java_integer(self.ctx.text(&node)).ok_or_else(|| self.ctx.invalid_literal(&node))?;
                return Ok(self.ctx.constant(value, &node));
            }
            "decimal_floating_point_literal" => {
                let text: String = self
                    .ctx
                    .text(&node)
                    .trim_end_matches(['f', 'F', 'd', 'D'])
                    .chars()
                    .filter(|&c| c != '_')
                    .collect();
                let value: f64 = text.parse().map_err(|_| self.ctx.invalid_literal(&node))?;
                return Ok(self.ctx.constant(Literal::Float(value), &node));
            }
            "character_literal" | "string_literal" | "text_block" => {
                let value = java_string(self.ctx.text(&node)).ok_or_else(|| self.ctx.invalid_literal(&node))?;
                return Ok(self.ctx.constant(Literal::Str(value), &node));
            }
            _ => return Err(self.ctx.unsupported(&node)),
        };
        Ok(self.ctx.node(kind, &node))
    }

    fn assignment(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let target = self.expr(self.ctx.required(&node, "left")?)?;
        let value = self.expr(self.ctx.required(&node, "right")?)?;
        let operator = self.ctx.text(&self.ctx.required(&node, "operator")?);
        if operator == "=" {
            return Ok(grammar::chain_assignment(&self.ctx, target, value, &node));
        }
        if operator == ">>>=" {
            let shifted = self
                .ctx
                .synthetic(SyntheticCall::UnsignedRShift, vec![target.clone(), value], &node);
            return Ok(self
                .ctx
                .node(
                    NodeKind::Assign {
                        targets: vec![target],
                        value: Box::new(shifted),
                        declaration_kind: None,
                    },
                    &node,
                )
                .with_metadata(Metadata::desugared("assignment_expression")));
        }
        let op = AugAssignOperator::from_token(operator).ok_or_else(|| self.ctx.unsupported(&node))?;
        Ok(self.ctx.node(
            NodeKind::AugAssign {
                target: Box::new(target),
                op,
                value: Box::new(value),
            },
            &node,
        ))
    }

    fn binary(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let left = self.expr(self.ctx.required(&node, "left")?)?;
        let right = self.expr(self.ctx.required(&node, "right")?)?;
        let operator = self.ctx.text(&self.ctx.required(&node, "operator")?);
        grammar::infix(&self.ctx, operator, left, right, &node).ok_or_else(|| self.ctx.unsupported(&node))
    }

    fn object_creation(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let ty = self.ctx.required(&node, "type")?;
        let func = self.type_name(&ty);
        let args = self.arguments(&node)?;
        let mut metadata = Metadata::desugared("object_creation_expression");
        if ty.kind() == "generic_type" {
            if let Some(type_args) = find_child_by_kind(&ty, "type_arguments") {
                metadata.type_params = named_children(&type_args)
                    .iter()
                    .map(|t| self.ctx.text(t).to_string())
                    .collect();
            }
        }
        let mut kwargs = Vec::new();
        if let Some(body) = find_child_by_kind(&node, "class_body") {
            let members = grammar::lower_block(self, body)?;
            let class = self.ctx.node(
                NodeKind::ClassDef {
                    name: "<anonymous>".to_string(),
                    bases: vec![func.clone()],
                    body: members,
                    decorators: Vec::new(),
                },
                &body,
            );
            kwargs.push(("class_body".to_string(), class));
        }
        Ok(self
            .ctx
            .node(
                NodeKind::Call {
                    func: Box::new(func),
                    args,
                    kwargs,
                },
                &node,
            )
            .with_metadata(metadata))
    }

    fn array_creation(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        if let Some(value) = node.child_by_field_name("value") {
            return self.expr(value);
        }
        let ty = self.ctx.required(&node, "type")?;
        let mut args = vec![self.type_name(&ty)];
        for dim in named_children(&node).into_iter().filter(|c| c.kind() == "dimensions_expr") {
            args.push(self.expr(self.first_named(&dim)?)?);
        }
        Ok(self.ctx.synthetic(SyntheticCall::NewArray, args, &node))
    }

    /// Lambdas become a `FunctionDef` named `<lambda>`; an expression body
    /// becomes `[Return(expr)]`.
    fn lambda(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let params_node = self.ctx.required(&node, "parameters")?;
        let params = match params_node.kind() {
            "identifier" => vec![Parameter::named(self.ctx.text(&params_node))],
            _ => self.parameters(params_node)?,
        };
        let body_node = self.ctx.required(&node, "body")?;
        self.ctx.enter_function();
        let body = if body_node.kind() == "block" {
            grammar::lower_block(self, body_node)
        } else {
            self.expr(body_node).map(|value| {
                vec![self.ctx.node(
                    NodeKind::Return {
                        value: Some(Box::new(value)),
                    },
                    &body_node,
                )]
            })
        };
        self.ctx.exit_function();
        Ok(self.ctx.node(
            NodeKind::FunctionDef {
                name: SyntheticCall::Lambda.name().to_string(),
                params,
                body: body?,
                return_type: None,
                is_async: false,
                is_generator: false,
                decorators: Vec::new(),
                docstring: None,
            },
            &node,
        ))
    }
}

fn java_integer(text: &str) -> Option<Literal> {
    let text = text.trim_end_matches(['l', 'L']);
    let lower = text.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        parse_int(hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        parse_int(bin, 2)
    } else if lower.len() > 1 && lower.starts_with('0') {
        parse_int(&lower[1..], 8)
    } else {
        parse_int(&lower, 10)
    }
}

/// Decode a string, text block or character literal.
fn java_string(text: &str) -> Option<String> {
    if let Some(block) = text.strip_prefix("\"\"\"").and_then(|t| t.strip_suffix("\"\"\"")) {
        return unescape(&strip_text_block_indent(block));
    }
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')))?;
    unescape(inner)
}

/// Remove the opening line break and the common indentation of a text block.
fn strip_text_block_indent(block: &str) -> String {
    let body = block.split_once('\n').map(|(_, rest)| rest).unwrap_or(block);
    let lines: Vec<&str> = body.split('\n').collect();
    let indent = lines
        .iter()
        .enumerate()
        .filter(|(i, l)| !l.trim().is_empty() || *i == lines.len() - 1)
        .map(|(_, l)| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| l.get(indent..).unwrap_or("").trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_literal_forms() {
        assert_eq!(java_integer("42"), Some(Literal::Int(42)));
        assert_eq!(java_integer("0"), Some(Literal::Int(0)));
        assert_eq!(java_integer("0x1F"), Some(Literal::Int(31)));
        assert_eq!(java_integer("0b1010"), Some(Literal::Int(10)));
        assert_eq!(java_integer("017"), Some(Literal::Int(15)));
        assert_eq!(java_integer("1_000_000L"), Some(Literal::Int(1_000_000)));
    }

    #[test]
    fn string_literal_forms() {
        assert_eq!(java_string(r#""a\tb""#).as_deref(), Some("a\tb"));
        assert_eq!(java_string("'x'").as_deref(), Some("x"));
        assert_eq!(java_string("\"\"\"\n    hello\n      world\n    \"\"\"").as_deref(), Some("hello\n  world\n"));
    }
}
