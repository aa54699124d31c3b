//! Read-only traversal over IR trees.

use super::nodes::{Module, Node, NodeKind};

/// Direct children of a node, in source order. Includes nodes held by
/// parameters, handlers, switch cases and keyword arguments.
pub fn children(node: &Node) -> Vec<&Node> {
    let mut out = Vec::new();
    match &node.kind {
        NodeKind::FunctionDef { params, body, decorators, .. } => {
            out.extend(decorators);
            out.extend(params.iter().filter_map(|p| p.default.as_ref()));
            out.extend(body);
        }
        NodeKind::ClassDef { bases, body, decorators, .. } => {
            out.extend(decorators);
            out.extend(bases);
            out.extend(body);
        }
        NodeKind::Assign { targets, value, .. } => {
            out.extend(targets);
            out.push(value.as_ref());
        }
        NodeKind::AugAssign { target, value, .. } => {
            out.push(target.as_ref());
            out.push(value.as_ref());
        }
        NodeKind::If { test, body, orelse } | NodeKind::While { test, body, orelse } => {
            out.push(test.as_ref());
            out.extend(body);
            out.extend(orelse);
        }
        NodeKind::For { target, iter, body, orelse } => {
            out.push(target.as_ref());
            out.push(iter.as_ref());
            out.extend(body);
            out.extend(orelse);
        }
        NodeKind::Try { body, handlers, orelse, finalbody } => {
            out.extend(body);
            for handler in handlers {
                out.extend(handler.exc_type.as_ref());
                out.extend(&handler.body);
            }
            out.extend(orelse);
            out.extend(finalbody);
        }
        NodeKind::Raise { exc, cause } => {
            out.extend(exc.as_deref());
            out.extend(cause.as_deref());
        }
        NodeKind::Switch { discriminant, cases } => {
            out.push(discriminant.as_ref());
            for case in cases {
                out.extend(case.value.as_ref());
                out.extend(&case.body);
            }
        }
        NodeKind::Return { value } => out.extend(value.as_deref()),
        NodeKind::ExprStmt { value } => out.push(value.as_ref()),
        NodeKind::BinaryOp { left, right, .. } => {
            out.push(left.as_ref());
            out.push(right.as_ref());
        }
        NodeKind::UnaryOp { operand, .. } => out.push(operand.as_ref()),
        NodeKind::BoolOp { values, .. } => out.extend(values),
        NodeKind::Compare { left, comparators, .. } => {
            out.push(left.as_ref());
            out.extend(comparators);
        }
        NodeKind::Call { func, args, kwargs } => {
            out.push(func.as_ref());
            out.extend(args);
            out.extend(kwargs.iter().map(|(_, v)| v));
        }
        NodeKind::Attribute { value, .. } => out.push(value.as_ref()),
        NodeKind::Subscript { value, slice } => {
            out.push(value.as_ref());
            out.push(slice.as_ref());
        }
        NodeKind::List { elements } => out.extend(elements),
        NodeKind::Dict { keys, values } => {
            for (key, value) in keys.iter().zip(values) {
                out.extend(key.as_ref());
                out.push(value);
            }
        }
        NodeKind::Error { recovered, .. } => out.extend(recovered),
        NodeKind::Break
        | NodeKind::Continue
        | NodeKind::Pass
        | NodeKind::Import { .. }
        | NodeKind::Name { .. }
        | NodeKind::Constant { .. } => {}
    }
    out
}

/// Pre-order walk over a node and everything below it.
pub fn walk<'a>(node: &'a Node, visit: &mut impl FnMut(&'a Node)) {
    visit(node);
    for child in children(node) {
        walk(child, visit);
    }
}

/// Pre-order walk over every node of a module.
pub fn walk_module<'a>(module: &'a Module, visit: &mut impl FnMut(&'a Node)) {
    for node in &module.body {
        walk(node, visit);
    }
}

/// Number of nodes below the module root.
pub fn node_count(module: &Module) -> usize {
    let mut count = 0;
    walk_module(module, &mut |_| count += 1);
    count
}

/// Collect every node matching a predicate.
pub fn find_all<'a>(module: &'a Module, pred: impl Fn(&Node) -> bool) -> Vec<&'a Node> {
    let mut found = Vec::new();
    walk_module(module, &mut |n| {
        if pred(n) {
            found.push(n);
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ir::{BinaryOperator, Literal};
    use crate::language::Language;

    fn int(v: i64) -> Node {
        Node::constant(Language::Python, Literal::Int(v), None)
    }

    #[test]
    fn walk_is_pre_order() {
        let sum = Node::new(
            Language::Python,
            NodeKind::BinaryOp {
                left: Box::new(int(1)),
                op: BinaryOperator::Add,
                right: Box::new(int(2)),
            },
            None,
        );
        let stmt = Node::new(Language::Python, NodeKind::ExprStmt { value: Box::new(sum) }, None);
        let module = Module::new(Language::Python, Arc::from("t.py"), vec![stmt]);

        let mut kinds = Vec::new();
        walk_module(&module, &mut |n| kinds.push(n.kind.name()));
        assert_eq!(kinds, ["ExprStmt", "BinaryOp", "Constant", "Constant"]);
        assert_eq!(node_count(&module), 4);
        assert_eq!(find_all(&module, |n| n.as_literal().is_some()).len(), 2);
    }

    #[test]
    fn dict_spread_keys_are_skipped() {
        let dict = Node::new(
            Language::Python,
            NodeKind::Dict {
                keys: vec![None, Some(int(1))],
                values: vec![int(2), int(3)],
            },
            None,
        );
        assert_eq!(children(&dict).len(), 3);
    }
}
