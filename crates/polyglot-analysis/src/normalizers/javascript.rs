//! JavaScript normalizer over tree-sitter-javascript.

use polyglot_core::errors::NormalizeResult;
use smallvec::smallvec;
use tree_sitter::Node as TsNode;

use super::grammar::{
    self, children_by_field, find_child_by_kind, has_token, named_children, parse_int, unescape, GrammarCtx,
    GrammarFrontend, GrammarRules,
};
use super::{Lowered, NodeNormalizer, Normalizer};
use crate::ir::{
    AugAssignOperator, BoolOperator, ExceptHandler, Literal, Metadata, Module, Node, NodeKind, Parameter, SwitchCase,
    SyntheticCall, UnaryOperator,
};
use crate::language::Language;
use crate::parsers::ParseCache;

pub struct JavaScriptNormalizer {
    frontend: GrammarFrontend,
}

impl JavaScriptNormalizer {
    /// A normalizer with the default-capacity parse cache.
    pub fn new() -> Self {
        Self::with_cache(Some(ParseCache::default()))
    }

    pub fn with_cache(cache: Option<ParseCache>) -> Self {
        Self {
            frontend: GrammarFrontend::new(Language::JavaScript, cache),
        }
    }

    pub fn frontend(&self) -> &GrammarFrontend {
        &self.frontend
    }
}

impl Default for JavaScriptNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for JavaScriptNormalizer {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn normalize(&self, source: &str, filename: &str) -> NormalizeResult<Module> {
        let parsed = self.frontend.parse(source, filename)?;
        let mut lowerer = JsLowerer {
            ctx: GrammarCtx::new(Language::JavaScript, &parsed.source, filename),
        };
        grammar::lower_program(&mut lowerer, parsed.root_node(), parsed.error_count)
    }
}

struct JsLowerer<'s> {
    ctx: GrammarCtx<'s>,
}

impl<'t> NodeNormalizer<TsNode<'t>> for JsLowerer<'_> {
    fn normalize_node(&mut self, node: TsNode<'t>) -> NormalizeResult<Lowered> {
        grammar::lower(self, node)
    }
}

impl GrammarRules for JsLowerer<'_> {
    fn ctx(&self) -> &GrammarCtx<'_> {
        &self.ctx
    }

    fn dispatch(&mut self, node: TsNode<'_>) -> NormalizeResult<Lowered> {
        let lowered: Lowered = match node.kind() {
            "program" | "statement_block" => grammar::lower_block(self, node)?.into(),
            "hash_bang_line" | "empty_statement" => Lowered::new(),
            "expression_statement" => self.expression_statement(node)?,
            "lexical_declaration" | "variable_declaration" => self.declaration(node)?,
            "function_declaration" | "generator_function_declaration" => smallvec![self.function(node)?],
            "class_declaration" => smallvec![self.class(node)?],
            "if_statement" => smallvec![self.if_statement(node)?],
            "for_statement" => self.for_statement(node)?,
            "for_in_statement" => smallvec![self.for_in(node)?],
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
            "do_statement" => smallvec![self.do_statement(node)?],
            "break_statement" => {
                if node.child_by_field_name("label").is_some() {
                    return Err(self.ctx.unsupported(&node));
                }
                smallvec![self.ctx.node(NodeKind::Break, &node)]
            }
            "continue_statement" => {
                if node.child_by_field_name("label").is_some() {
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
            "switch_statement" => smallvec![self.switch(node)?],
            "import_statement" => smallvec![self.import(node)?],
            "export_statement" => self.export(node)?,
            _ => smallvec![self.expression(node)?],
        };
        Ok(lowered)
    }
}

impl<'s> JsLowerer<'s> {
    fn expr(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        grammar::lower_expr(self, node)
    }

    fn statement_body(&mut self, node: TsNode<'_>) -> NormalizeResult<Vec<Node>> {
        grammar::lower_body(self, node, "statement_block")
    }

    fn first_named<'t>(&self, node: &TsNode<'t>) -> NormalizeResult<TsNode<'t>> {
        named_children(node)
            .into_iter()
            .next()
            .ok_or_else(|| self.ctx.unsupported(node))
    }

    fn condition(&mut self, node: &TsNode<'_>) -> NormalizeResult<Node> {
        let cond = self.ctx.required(node, "condition")?;
        self.expr(cond)
    }

    fn str_constant(&self, value: impl Into<String>, at: &TsNode<'_>) -> Node {
        self.ctx.implicit(Literal::Str(value.into()), at)
    }

    /// Statement-position expressions; a top-level comma sequence becomes
    /// one statement per operand.
    fn expression_statement(&mut self, node: TsNode<'_>) -> NormalizeResult<Lowered> {
        let inner = self.first_named(&node)?;
        let parts = if inner.kind() == "sequence_expression" {
            flatten_sequence(inner)
        } else {
            vec![inner]
        };
        let mut out = Lowered::new();
        for part in parts {
            let value = self.expr(part)?;
            out.push(grammar::expression_statement(&self.ctx, value, &part));
        }
        Ok(out)
    }

    fn declaration(&mut self, node: TsNode<'_>) -> NormalizeResult<Lowered> {
        let kind = match node.child_by_field_name("kind") {
            Some(k) => self.ctx.text(&k).to_string(),
            None => "var".to_string(),
        };
        let mut out = Lowered::new();
        for declarator in named_children(&node).into_iter().filter(|c| c.kind() == "variable_declarator") {
            let target = self.pattern(self.ctx.required(&declarator, "name")?)?;
            let value = match declarator.child_by_field_name("value") {
                Some(v) => self.expr(v)?,
                None => self.ctx.implicit(Literal::Undefined, &declarator),
            };
            out.push(self.ctx.node(
                NodeKind::Assign {
                    targets: vec![target],
                    value: Box::new(value),
                    declaration_kind: Some(kind.clone()),
                },
                &declarator,
            ));
        }
        Ok(out)
    }

    /// Assignment targets: identifiers, member accesses and destructuring
    /// patterns (`Dict`/`List` with `kind_hint = "pattern"`).
    fn pattern(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        match node.kind() {
            "object_pattern" => {
                let mut keys = Vec::new();
                let mut values = Vec::new();
                for entry in named_children(&node) {
                    match entry.kind() {
                        "pair_pattern" => {
                            keys.push(Some(self.property_key(self.ctx.required(&entry, "key")?)?));
                            values.push(self.pattern(self.ctx.required(&entry, "value")?)?);
                        }
                        "shorthand_property_identifier_pattern" => {
                            let name = self.ctx.text(&entry);
                            keys.push(Some(self.str_constant(name, &entry)));
                            values.push(self.ctx.name(name, &entry));
                        }
                        "object_assignment_pattern" => {
                            let left = self.ctx.required(&entry, "left")?;
                            keys.push(Some(self.str_constant(self.ctx.text(&left), &left)));
                            values.push(self.defaulted(entry)?);
                        }
                        "rest_pattern" => {
                            keys.push(None);
                            values.push(self.pattern(self.first_named(&entry)?)?);
                        }
                        _ => return Err(self.ctx.unsupported(&entry)),
                    }
                }
                Ok(self
                    .ctx
                    .node(NodeKind::Dict { keys, values }, &node)
                    .with_metadata(Metadata::hint("pattern")))
            }
            "array_pattern" => {
                let mut elements = Vec::new();
                for element in named_children(&node) {
                    elements.push(self.pattern(element)?);
                }
                Ok(self
                    .ctx
                    .node(NodeKind::List { elements }, &node)
                    .with_metadata(Metadata::hint("pattern")))
            }
            "assignment_pattern" => self.defaulted(node),
            "rest_pattern" => {
                let inner = self.pattern(self.first_named(&node)?)?;
                Ok(self.ctx.synthetic(SyntheticCall::Spread, vec![inner], &node))
            }
            _ => self.expr(node),
        }
    }

    /// A destructuring target with a default, as
    /// `Assign { [target], default, declaration_kind: "default" }`.
    fn defaulted(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let target = self.pattern(self.ctx.required(&node, "left")?)?;
        let default = self.expr(self.ctx.required(&node, "right")?)?;
        Ok(self.ctx.node(
            NodeKind::Assign {
                targets: vec![target],
                value: Box::new(default),
                declaration_kind: Some("default".to_string()),
            },
            &node,
        ))
    }

    fn property_key(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        match node.kind() {
            "property_identifier" | "private_property_identifier" | "shorthand_property_identifier" => {
                Ok(self.str_constant(self.ctx.text(&node), &node))
            }
            "computed_property_name" => self.expr(self.first_named(&node)?),
            _ => self.expr(node),
        }
    }

    fn parameters(&mut self, node: TsNode<'_>) -> NormalizeResult<Vec<Parameter>> {
        let mut params = Vec::new();
        for child in named_children(&node) {
            let param = match child.kind() {
                "identifier" => Parameter::named(self.ctx.text(&child)),
                "assignment_pattern" => {
                    let left = self.ctx.required(&child, "left")?;
                    let mut param = Parameter::named(self.ctx.text(&left));
                    param.default = Some(self.expr(self.ctx.required(&child, "right")?)?);
                    param
                }
                "rest_pattern" => {
                    let inner = self.first_named(&child)?;
                    let mut param = Parameter::named(self.ctx.text(&inner));
                    param.is_rest = true;
                    param
                }
                "object_pattern" | "array_pattern" => Parameter::named(self.ctx.text(&child)),
                _ => return Err(self.ctx.unsupported(&child)),
            };
            params.push(param);
        }
        Ok(params)
    }

    fn decorators(&mut self, node: &TsNode<'_>) -> NormalizeResult<Vec<Node>> {
        let mut cursor = node.walk();
        let found: Vec<TsNode<'_>> = node.children(&mut cursor).filter(|c| c.kind() == "decorator").collect();
        let mut out = Vec::new();
        for decorator in found {
            out.push(self.expr(self.first_named(&decorator)?)?);
        }
        Ok(out)
    }

    /// Declarations, expressions, arrows and methods all become
    /// `FunctionDef`. Anonymous ones are named `<lambda>`; an arrow with an
    /// expression body gets `[Return(expr)]`.
    fn function(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let name = match node.child_by_field_name("name") {
            Some(n) => self.ctx.text(&n).to_string(),
            None => SyntheticCall::Lambda.name().to_string(),
        };
        let params = match (node.child_by_field_name("parameters"), node.child_by_field_name("parameter")) {
            (Some(list), _) => self.parameters(list)?,
            (None, Some(single)) => vec![Parameter::named(self.ctx.text(&single))],
            (None, None) => Vec::new(),
        };
        let is_async = has_token(&node, "async");
        let is_generator = node.kind().starts_with("generator_function") || has_token(&node, "*");
        let decorators = self.decorators(&node)?;

        let mut metadata = Metadata::default();
        for modifier in ["static", "get", "set", "async"] {
            if has_token(&node, modifier) {
                metadata.modifiers.push(modifier.to_string());
            }
        }
        if node.kind() == "arrow_function" {
            metadata.kind_hint = Some("arrow".to_string());
        } else if node.kind() == "method_definition" && name == "constructor" {
            metadata.kind_hint = Some("constructor".to_string());
        }

        let body_node = self.ctx.required(&node, "body")?;
        self.ctx.enter_function();
        let body = if body_node.kind() == "statement_block" {
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

        Ok(self
            .ctx
            .node(
                NodeKind::FunctionDef {
                    name,
                    params,
                    body: body?,
                    return_type: None,
                    is_async,
                    is_generator,
                    decorators,
                    docstring: self.ctx.doc_comment(&node),
                },
                &node,
            )
            .with_metadata(metadata))
    }

    fn class(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let name = match node.child_by_field_name("name") {
            Some(n) => self.ctx.text(&n).to_string(),
            None => "<anonymous>".to_string(),
        };
        let mut bases = Vec::new();
        if let Some(heritage) = find_child_by_kind(&node, "class_heritage") {
            for base in named_children(&heritage) {
                bases.push(self.expr(base)?);
            }
        }
        let decorators = self.decorators(&node)?;
        let mut body = Vec::new();
        for member in named_children(&self.ctx.required(&node, "body")?) {
            match member.kind() {
                "method_definition" => body.push(self.function(member)?),
                "field_definition" => body.push(self.field(member)?),
                _ => return Err(self.ctx.unsupported(&member)),
            }
        }
        Ok(self.ctx.node(
            NodeKind::ClassDef {
                name,
                bases,
                body,
                decorators,
            },
            &node,
        ))
    }

    fn field(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let property = self.ctx.required(&node, "property")?;
        let target = self.ctx.name(self.ctx.text(&property), &property);
        let value = match node.child_by_field_name("value") {
            Some(v) => self.expr(v)?,
            None => self.ctx.implicit(Literal::Undefined, &node),
        };
        let mut metadata = Metadata::default();
        if has_token(&node, "static") {
            metadata.modifiers.push("static".to_string());
        }
        Ok(self
            .ctx
            .node(
                NodeKind::Assign {
                    targets: vec![target],
                    value: Box::new(value),
                    declaration_kind: Some("field".to_string()),
                },
                &node,
            )
            .with_metadata(metadata))
    }

    fn if_statement(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let test = self.condition(&node)?;
        let body = self.statement_body(self.ctx.required(&node, "consequence")?)?;
        let orelse = match node.child_by_field_name("alternative") {
            Some(else_clause) => self.statement_body(self.first_named(&else_clause)?)?,
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

    /// `for (init; cond; step) body` as `init; while (cond) { body; step }`.
    fn for_statement(&mut self, node: TsNode<'_>) -> NormalizeResult<Lowered> {
        let mut out = Lowered::new();
        if let Some(init) = node.child_by_field_name("initializer") {
            match init.kind() {
                "lexical_declaration" | "variable_declaration" | "expression_statement" | "empty_statement" => {
                    out.extend(self.normalize_node(init)?)
                }
                _ => {
                    let value = self.expr(init)?;
                    out.push(grammar::expression_statement(&self.ctx, value, &init));
                }
            }
        }
        let test = match node.child_by_field_name("condition") {
            Some(c) if c.kind() == "empty_statement" => self.ctx.implicit(Literal::Bool(true), &c),
            Some(c) if c.kind() == "expression_statement" => self.expr(self.first_named(&c)?)?,
            Some(c) => self.expr(c)?,
            None => self.ctx.implicit(Literal::Bool(true), &node),
        };
        let mut step = Vec::new();
        for increment in children_by_field(&node, "increment") {
            let parts = if increment.kind() == "sequence_expression" {
                flatten_sequence(increment)
            } else {
                vec![increment]
            };
            for part in parts {
                let value = self.expr(part)?;
                step.push(grammar::expression_statement(&self.ctx, value, &part));
            }
        }

        let body_node = self.ctx.required(&node, "body")?;
        self.ctx.enter_loop(step.clone());
        let body = self.statement_body(body_node);
        self.ctx.exit_loop();
        let mut body = body?;
        body.extend(step);

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

    /// `for (x of xs)` iterates values; `for (k in obj)` iterates `<keys>(obj)`.
    fn for_in(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let target = self.pattern(self.ctx.required(&node, "left")?)?;
        let right = self.expr(self.ctx.required(&node, "right")?)?;
        let operator = self.ctx.text(&self.ctx.required(&node, "operator")?);
        let mut metadata = Metadata::default();
        if let Some(kind) = node.child_by_field_name("kind") {
            metadata.modifiers.push(self.ctx.text(&kind).to_string());
        }
        if has_token(&node, "await") {
            metadata.modifiers.push("await".to_string());
        }
        let iter = if operator == "in" {
            metadata.desugared_from = Some("for_in_statement".to_string());
            self.ctx.synthetic(SyntheticCall::Keys, vec![right], &node)
        } else {
            right
        };

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
            .with_metadata(metadata))
    }

    /// `do body while (cond)` as `while (true) { body; if (!cond) break; }`.
    fn do_statement(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let cond = self.condition(&node)?;
        let negated = self.ctx.node(
            NodeKind::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(cond),
            },
            &node,
        );
        let exit_check = self.ctx.node(
            NodeKind::If {
                test: Box::new(negated),
                body: vec![self.ctx.node(NodeKind::Break, &node)],
                orelse: Vec::new(),
            },
            &node,
        );

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

    fn try_statement(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let body = grammar::lower_block(self, self.ctx.required(&node, "body")?)?;
        let mut handlers = Vec::new();
        if let Some(handler) = node.child_by_field_name("handler") {
            let name = handler
                .child_by_field_name("parameter")
                .map(|p| self.ctx.text(&p).to_string());
            let body = grammar::lower_block(self, self.ctx.required(&handler, "body")?)?;
            handlers.push(ExceptHandler {
                exc_type: None,
                name,
                body,
                loc: self.ctx.loc(&handler),
            });
        }
        let finalbody = match node.child_by_field_name("finalizer") {
            Some(finalizer) => grammar::lower_block(self, self.ctx.required(&finalizer, "body")?)?,
            None => Vec::new(),
        };
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

    fn switch(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let discriminant = self.expr(self.ctx.required(&node, "value")?)?;
        let mut cases = Vec::new();
        for case in named_children(&self.ctx.required(&node, "body")?) {
            let value = match case.kind() {
                "switch_case" => Some(self.expr(self.ctx.required(&case, "value")?)?),
                "switch_default" => None,
                _ => return Err(self.ctx.unsupported(&case)),
            };
            let mut body = Vec::new();
            for stmt in children_by_field(&case, "body") {
                body.extend(self.normalize_node(stmt)?);
            }
            cases.push(SwitchCase {
                value,
                body,
                loc: self.ctx.loc(&case),
            });
        }
        Ok(self.ctx.node(
            NodeKind::Switch {
                discriminant: Box::new(discriminant),
                cases,
            },
            &node,
        ))
    }

    fn module_source(&self, node: &TsNode<'_>) -> Option<String> {
        let source = node.child_by_field_name("source").or_else(|| {
            find_child_by_kind(node, "from_clause").and_then(|f| f.child_by_field_name("source"))
        })?;
        js_string(self.ctx.text(&source))
    }

    /// `import a, { b as c } from "m"` as `Import { "m", [default, b] }` with
    /// local names in `metadata.aliases`.
    fn import(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let module = self.module_source(&node).ok_or_else(|| self.ctx.unsupported(&node))?;
        let mut names = Vec::new();
        let mut is_star = false;
        let mut metadata = Metadata::default();
        if let Some(clause) = find_child_by_kind(&node, "import_clause") {
            for part in named_children(&clause) {
                match part.kind() {
                    "identifier" => {
                        names.push("default".to_string());
                        metadata
                            .aliases
                            .push(("default".to_string(), self.ctx.text(&part).to_string()));
                    }
                    "namespace_import" => {
                        is_star = true;
                        let local = self.first_named(&part)?;
                        metadata.aliases.push(("*".to_string(), self.ctx.text(&local).to_string()));
                    }
                    "named_imports" => {
                        for spec in named_children(&part) {
                            let name = self.ctx.text(&self.ctx.required(&spec, "name")?).to_string();
                            if let Some(alias) = spec.child_by_field_name("alias") {
                                metadata.aliases.push((name.clone(), self.ctx.text(&alias).to_string()));
                            }
                            names.push(name);
                        }
                    }
                    _ => return Err(self.ctx.unsupported(&part)),
                }
            }
        }
        Ok(self
            .ctx
            .node(NodeKind::Import { module, names, is_star }, &node)
            .with_metadata(metadata))
    }

    /// Exported declarations keep their own node with an `export` modifier.
    /// Export lists and default expressions become `<export>(..)` calls.
    fn export(&mut self, node: TsNode<'_>) -> NormalizeResult<Lowered> {
        let mut modifiers = vec!["export".to_string()];
        if has_token(&node, "default") {
            modifiers.push("default".to_string());
        }
        if let Some(declaration) = node.child_by_field_name("declaration") {
            let mut lowered = self.normalize_node(declaration)?;
            for n in lowered.iter_mut() {
                n.metadata.modifiers.extend(modifiers.iter().cloned());
            }
            return Ok(lowered);
        }

        let mut args = Vec::new();
        let mut metadata = Metadata {
            modifiers,
            ..Default::default()
        };
        if let Some(value) = node.child_by_field_name("value") {
            args.push(self.expr(value)?);
        } else if let Some(clause) = find_child_by_kind(&node, "export_clause") {
            for spec in named_children(&clause) {
                let name = self.ctx.required(&spec, "name")?;
                args.push(self.ctx.name(self.ctx.text(&name), &name));
                if let Some(alias) = spec.child_by_field_name("alias") {
                    metadata
                        .aliases
                        .push((self.ctx.text(&name).to_string(), self.ctx.text(&alias).to_string()));
                }
            }
        } else {
            args.push(self.str_constant("*", &node));
        }
        let mut kwargs = Vec::new();
        if let Some(module) = self.module_source(&node) {
            kwargs.push(("source".to_string(), self.str_constant(module, &node)));
        }
        let call = Node::synthetic_call(Language::JavaScript, SyntheticCall::Export, args, kwargs, self.ctx.loc(&node));
        Ok(smallvec![self
            .ctx
            .node(NodeKind::ExprStmt { value: Box::new(call) }, &node)
            .with_metadata(metadata)])
    }

    fn arguments(&mut self, node: TsNode<'_>) -> NormalizeResult<Vec<Node>> {
        let mut args = Vec::new();
        for arg in named_children(&node) {
            args.push(self.expr(arg)?);
        }
        Ok(args)
    }

    fn expression(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let kind = match node.kind() {
            "parenthesized_expression" => return self.expr(self.first_named(&node)?),
            "identifier" | "shorthand_property_identifier" | "property_identifier" | "private_property_identifier" => {
                NodeKind::Name {
                    id: self.ctx.text(&node).to_string(),
                }
            }
            "this" | "super" | "import" => NodeKind::Name {
                id: node.kind().to_string(),
            },
            "assignment_expression" => {
                let target = self.pattern(self.ctx.required(&node, "left")?)?;
                let value = self.expr(self.ctx.required(&node, "right")?)?;
                return Ok(grammar::chain_assignment(&self.ctx, target, value, &node));
            }
            "augmented_assignment_expression" => return self.augmented_assignment(node),
            "binary_expression" => {
                let left = self.expr(self.ctx.required(&node, "left")?)?;
                let right = self.expr(self.ctx.required(&node, "right")?)?;
                let operator = self.ctx.text(&self.ctx.required(&node, "operator")?);
                return grammar::infix(&self.ctx, operator, left, right, &node).ok_or_else(|| self.ctx.unsupported(&node));
            }
            "unary_expression" => {
                let operator = self.ctx.text(&self.ctx.required(&node, "operator")?);
                let argument = self.expr(self.ctx.required(&node, "argument")?)?;
                let synthetic = match operator {
                    "typeof" => SyntheticCall::TypeOf,
                    "void" => SyntheticCall::Void,
                    "delete" => SyntheticCall::Delete,
                    token => {
                        let op = UnaryOperator::from_token(token).ok_or_else(|| self.ctx.unsupported(&node))?;
                        return Ok(self.ctx.node(
                            NodeKind::UnaryOp {
                                op,
                                operand: Box::new(argument),
                            },
                            &node,
                        ));
                    }
                };
                return Ok(self.ctx.synthetic(synthetic, vec![argument], &node));
            }
            "update_expression" => {
                let target = self.expr(self.ctx.required(&node, "argument")?)?;
                let operator = self.ctx.text(&self.ctx.required(&node, "operator")?);
                return Ok(grammar::update_assignment(&self.ctx, target, operator == "++", &node));
            }
            "ternary_expression" => {
                let args = vec![
                    self.expr(self.ctx.required(&node, "condition")?)?,
                    self.expr(self.ctx.required(&node, "consequence")?)?,
                    self.expr(self.ctx.required(&node, "alternative")?)?,
                ];
                return Ok(self.ctx.synthetic(SyntheticCall::Ternary, args, &node));
            }
            "call_expression" => return self.call(node),
            "new_expression" => {
                let func = self.expr(self.ctx.required(&node, "constructor")?)?;
                let args = match node.child_by_field_name("arguments") {
                    Some(a) => self.arguments(a)?,
                    None => Vec::new(),
                };
                return Ok(self
                    .ctx
                    .node(
                        NodeKind::Call {
                            func: Box::new(func),
                            args,
                            kwargs: Vec::new(),
                        },
                        &node,
                    )
                    .with_metadata(Metadata::desugared("new_expression")));
            }
            "member_expression" => {
                let value = self.expr(self.ctx.required(&node, "object")?)?;
                let attr = self.ctx.text(&self.ctx.required(&node, "property")?).to_string();
                let member = self.ctx.node(
                    NodeKind::Attribute {
                        value: Box::new(value),
                        attr,
                    },
                    &node,
                );
                return Ok(optional_chain(member, &node));
            }
            "subscript_expression" => {
                let value = self.expr(self.ctx.required(&node, "object")?)?;
                let slice = self.expr(self.ctx.required(&node, "index")?)?;
                let subscript = self.ctx.node(
                    NodeKind::Subscript {
                        value: Box::new(value),
                        slice: Box::new(slice),
                    },
                    &node,
                );
                return Ok(optional_chain(subscript, &node));
            }
            "await_expression" => {
                let value = self.expr(self.first_named(&node)?)?;
                return Ok(self.ctx.synthetic(SyntheticCall::Await, vec![value], &node));
            }
            "yield_expression" => {
                let delegate = has_token(&node, "*");
                let args = match named_children(&node).into_iter().next() {
                    Some(v) => vec![self.expr(v)?],
                    None => Vec::new(),
                };
                let call = if delegate { SyntheticCall::YieldFrom } else { SyntheticCall::Yield };
                return Ok(self.ctx.synthetic(call, args, &node));
            }
            "spread_element" => {
                let value = self.expr(self.first_named(&node)?)?;
                return Ok(self.ctx.synthetic(SyntheticCall::Spread, vec![value], &node));
            }
            "arrow_function" | "function_expression" | "function" | "generator_function" => {
                return self.function(node)
            }
            "class" => return self.class(node),
            "array" => NodeKind::List {
                elements: self.arguments(node)?,
            },
            "object" => return self.object(node),
            "template_string" => return self.template(node),
            "regex" => {
                let pattern = self.ctx.text(&self.ctx.required(&node, "pattern")?);
                let mut args = vec![self.str_constant(pattern, &node)];
                if let Some(flags) = node.child_by_field_name("flags") {
                    args.push(self.str_constant(self.ctx.text(&flags), &flags));
                }
                return Ok(self.ctx.synthetic(SyntheticCall::Regex, args, &node));
            }

            // ---- Literals ----
            "true" => return Ok(self.ctx.constant(Literal::Bool(true), &node)),
            "false" => return Ok(self.ctx.constant(Literal::Bool(false), &node)),
            "null" => return Ok(self.ctx.constant(Literal::Null, &node)),
            "undefined" => return Ok(self.ctx.constant(Literal::Undefined, &node)),
            "number" => {
                let value = js_number(self.ctx.text(&node)).ok_or_else(|| self.ctx.invalid_literal(&node))?;
                return Ok(self.ctx.constant(value, &node));
            }
            "string" => {
                let value = js_string(self.ctx.text(&node)).ok_or_else(|| self.ctx.invalid_literal(&node))?;
                return Ok(self.ctx.constant(Literal::Str(value), &node));
            }
            _ => return Err(self.ctx.unsupported(&node)),
        };
        Ok(self.ctx.node(kind, &node))
    }

    /// `a ||= b` as `a = a || b`, `a ??= b` as `a = <nullish>(a, b)`.
    fn augmented_assignment(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let target = self.expr(self.ctx.required(&node, "left")?)?;
        let value = self.expr(self.ctx.required(&node, "right")?)?;
        let operator = self.ctx.text(&self.ctx.required(&node, "operator")?);
        let base = operator.strip_suffix('=').unwrap_or(operator);
        let value = match base {
            "&&" | "||" => {
                let op = BoolOperator::from_token(base).ok_or_else(|| self.ctx.unsupported(&node))?;
                self.ctx.node(
                    NodeKind::BoolOp {
                        op,
                        values: vec![target.clone(), value],
                    },
                    &node,
                )
            }
            "??" => self
                .ctx
                .synthetic(SyntheticCall::Nullish, vec![target.clone(), value], &node),
            ">>>" => self
                .ctx
                .synthetic(SyntheticCall::UnsignedRShift, vec![target.clone(), value], &node),
            _ => {
                let op = AugAssignOperator::from_token(operator).ok_or_else(|| self.ctx.unsupported(&node))?;
                return Ok(self.ctx.node(
                    NodeKind::AugAssign {
                        target: Box::new(target),
                        op,
                        value: Box::new(value),
                    },
                    &node,
                ));
            }
        };
        Ok(self
            .ctx
            .node(
                NodeKind::Assign {
                    targets: vec![target],
                    value: Box::new(value),
                    declaration_kind: None,
                },
                &node,
            )
            .with_metadata(Metadata::desugared("augmented_assignment_expression")))
    }

    fn call(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let func = self.expr(self.ctx.required(&node, "function")?)?;
        let arguments = self.ctx.required(&node, "arguments")?;
        let mut metadata = Metadata::default();
        let args = if arguments.kind() == "template_string" {
            metadata.kind_hint = Some("tagged_template".to_string());
            vec![self.template(arguments)?]
        } else {
            self.arguments(arguments)?
        };
        if node.child_by_field_name("optional_chain").is_some() {
            metadata.kind_hint = Some("optional_chain".to_string());
        }
        Ok(self
            .ctx
            .node(
                NodeKind::Call {
                    func: Box::new(func),
                    args,
                    kwargs: Vec::new(),
                },
                &node,
            )
            .with_metadata(metadata))
    }

    /// Object literals become `Dict`; `...spread` entries get key `None`.
    fn object(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let mut keys = Vec::new();
        let mut values = Vec::new();
        for entry in named_children(&node) {
            match entry.kind() {
                "pair" => {
                    keys.push(Some(self.property_key(self.ctx.required(&entry, "key")?)?));
                    values.push(self.expr(self.ctx.required(&entry, "value")?)?);
                }
                "shorthand_property_identifier" => {
                    let name = self.ctx.text(&entry);
                    keys.push(Some(self.str_constant(name, &entry)));
                    values.push(self.ctx.name(name, &entry));
                }
                "spread_element" => {
                    keys.push(None);
                    values.push(self.expr(self.first_named(&entry)?)?);
                }
                "method_definition" => {
                    keys.push(Some(self.property_key(self.ctx.required(&entry, "name")?)?));
                    values.push(self.function(entry)?);
                }
                _ => return Err(self.ctx.unsupported(&entry)),
            }
        }
        Ok(self.ctx.node(NodeKind::Dict { keys, values }, &node))
    }

    /// Template literals without substitutions are plain strings; others
    /// become `<format>(part, ...)` alternating text and expressions.
    fn template(&mut self, node: TsNode<'_>) -> NormalizeResult<Node> {
        let substitutions: Vec<TsNode<'_>> = named_children(&node)
            .into_iter()
            .filter(|c| c.kind() == "template_substitution")
            .collect();
        let text_start = node.start_byte() + 1;
        let text_end = node.end_byte().saturating_sub(1).max(text_start);
        let source = self.ctx.source;
        let raw_text = |from: usize, to: usize| -> Option<String> { source.get(from..to).and_then(unescape) };

        if substitutions.is_empty() {
            let value = raw_text(text_start, text_end).ok_or_else(|| self.ctx.invalid_literal(&node))?;
            return Ok(self.ctx.constant(Literal::Str(value), &node));
        }

        let mut parts = Vec::new();
        let mut cursor = text_start;
        for sub in substitutions {
            let text = raw_text(cursor, sub.start_byte()).ok_or_else(|| self.ctx.invalid_literal(&node))?;
            if !text.is_empty() {
                parts.push(self.str_constant(text, &node));
            }
            parts.push(self.expr(self.first_named(&sub)?)?);
            cursor = sub.end_byte();
        }
        let tail = raw_text(cursor, text_end).ok_or_else(|| self.ctx.invalid_literal(&node))?;
        if !tail.is_empty() {
            parts.push(self.str_constant(tail, &node));
        }
        Ok(self.ctx.synthetic(SyntheticCall::Format, parts, &node))
    }
}

fn flatten_sequence(node: TsNode<'_>) -> Vec<TsNode<'_>> {
    let mut out = Vec::new();
    for child in named_children(&node) {
        if child.kind() == "sequence_expression" {
            out.extend(flatten_sequence(child));
        } else {
            out.push(child);
        }
    }
    out
}

fn optional_chain(node: Node, at: &TsNode<'_>) -> Node {
    if at.child_by_field_name("optional_chain").is_some() || find_child_by_kind(at, "optional_chain").is_some() {
        return node.with_metadata(Metadata::hint("optional_chain"));
    }
    node
}

/// Numeric literal: integers that fit `i64` stay integral, `123n` is a
/// `BigInt`, everything else is a double.
fn js_number(text: &str) -> Option<Literal> {
    let clean: String = text.chars().filter(|&c| c != '_').collect();
    if let Some(big) = clean.strip_suffix('n') {
        return match parse_radix_prefixed(big)? {
            Literal::Int(v) => Some(Literal::BigInt(v.to_string())),
            other => Some(other),
        };
    }
    let lower = clean.to_ascii_lowercase();
    if lower.starts_with("0x") || lower.starts_with("0o") || lower.starts_with("0b") {
        return parse_radix_prefixed(&lower);
    }
    if lower.len() > 1 && lower.starts_with('0') && lower.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return parse_int(&lower[1..], 8);
    }
    if lower.bytes().all(|b| b.is_ascii_digit()) {
        return match parse_int(&lower, 10)? {
            Literal::Int(v) => Some(Literal::Int(v)),
            _ => lower.parse().ok().map(Literal::Float),
        };
    }
    lower.parse().ok().map(Literal::Float)
}

fn parse_radix_prefixed(text: &str) -> Option<Literal> {
    let lower = text.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        parse_int(hex, 16)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        parse_int(oct, 8)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        parse_int(bin, 2)
    } else {
        parse_int(&lower, 10)
    }
}

fn js_string(text: &str) -> Option<String> {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')))?;
    unescape(inner)
}
