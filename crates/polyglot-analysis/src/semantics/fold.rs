//! Constant folding of literal-only expressions.
//!
//! Each node is evaluated with the semantics of the language it was
//! normalized from, so `"5" + 3` folds to `"53"` from JavaScript and fails
//! with a `TypeError` from Python. Anything that is not built from
//! literals folds to `None`.

use super::value::{Operand, Value};
use super::{concrete_bool, semantics_for_language, LanguageSemantics, SemanticsResult};
use crate::ir::{BoolOperator, Node, NodeKind, SyntheticCall};

pub fn fold_expr(node: &Node) -> SemanticsResult<Option<Value>> {
    let semantics = semantics_for_language(node.language());
    match &node.kind {
        NodeKind::Constant { value, .. } => Ok(Value::from_literal(value)),
        NodeKind::List { elements } => {
            let mut values = Vec::with_capacity(elements.len());
            for element in elements {
                let Some(value) = fold_expr(element)? else {
                    return Ok(None);
                };
                values.push(value);
            }
            Ok(Some(if node.metadata.kind_hint.as_deref() == Some("tuple") {
                Value::Tuple(values)
            } else {
                Value::List(values)
            }))
        }
        NodeKind::UnaryOp { op, operand } => {
            let Some(value) = fold_expr(operand)? else {
                return Ok(None);
            };
            Ok(semantics.apply_unary(*op, &Operand::Concrete(value))?.into_concrete())
        }
        NodeKind::BinaryOp { left, op, right } => {
            let Some(a) = fold_expr(left)? else {
                return Ok(None);
            };
            let Some(b) = fold_expr(right)? else {
                return Ok(None);
            };
            Ok(semantics
                .apply_binary(*op, &Operand::Concrete(a), &Operand::Concrete(b))?
                .into_concrete())
        }
        NodeKind::BoolOp { op, values } => fold_bool(semantics, *op, values),
        NodeKind::Compare { left, ops, comparators } => {
            let Some(mut current) = fold_expr(left)? else {
                return Ok(None);
            };
            let mut result = Value::Bool(true);
            for (op, comparator) in ops.iter().zip(comparators) {
                let Some(next) = fold_expr(comparator)? else {
                    return Ok(None);
                };
                let Some(outcome) = semantics
                    .apply_compare(*op, &Operand::Concrete(current), &Operand::Concrete(next.clone()))?
                    .into_concrete()
                else {
                    return Ok(None);
                };
                if !truthy(semantics, &outcome)? {
                    return Ok(Some(outcome));
                }
                result = outcome;
                current = next;
            }
            Ok(Some(result))
        }
        _ => match node.as_synthetic_call() {
            Some((SyntheticCall::Ternary, [test, then, otherwise], _)) => {
                let Some(test) = fold_expr(test)? else {
                    return Ok(None);
                };
                if truthy(semantics, &test)? {
                    fold_expr(then)
                } else {
                    fold_expr(otherwise)
                }
            }
            _ => Ok(None),
        },
    }
}

/// Left to right, stopping at the first operand that decides the result.
/// Operands after that point are never looked at.
fn fold_bool(semantics: &dyn LanguageSemantics, op: BoolOperator, values: &[Node]) -> SemanticsResult<Option<Value>> {
    let Some((first, rest)) = values.split_first() else {
        return Ok(None);
    };
    let Some(mut current) = fold_expr(first)? else {
        return Ok(None);
    };
    for value in rest {
        let decided = match op {
            BoolOperator::And => !truthy(semantics, &current)?,
            BoolOperator::Or => truthy(semantics, &current)?,
        };
        if decided {
            return Ok(Some(current));
        }
        let Some(next) = fold_expr(value)? else {
            return Ok(None);
        };
        // Runs the language's own checks, e.g. Java's boolean-only operands.
        let Some(joined) = semantics
            .apply_bool(op, &Operand::Concrete(current), &Operand::Concrete(next))?
            .into_concrete()
        else {
            return Ok(None);
        };
        current = joined;
    }
    Ok(Some(current))
}

fn truthy(semantics: &dyn LanguageSemantics, value: &Value) -> SemanticsResult<bool> {
    concrete_bool(semantics.to_boolean(&Operand::Concrete(value.clone()))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOperator, CompareOperator, Literal, Metadata, UnaryOperator};
    use crate::language::Language;
    use polyglot_core::errors::SemanticsError;

    fn lit(language: Language, value: Literal) -> Node {
        Node::constant(language, value, None)
    }

    fn binop(language: Language, left: Node, op: BinaryOperator, right: Node) -> Node {
        Node::new(
            language,
            NodeKind::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            None,
        )
    }

    #[test]
    fn same_tree_folds_differently_per_language() {
        let js = binop(
            Language::JavaScript,
            lit(Language::JavaScript, Literal::Str("5".into())),
            BinaryOperator::Add,
            lit(Language::JavaScript, Literal::Int(3)),
        );
        assert_eq!(fold_expr(&js).unwrap(), Some(Value::from("53")));

        let py = binop(
            Language::Python,
            lit(Language::Python, Literal::Str("5".into())),
            BinaryOperator::Add,
            lit(Language::Python, Literal::Int(3)),
        );
        assert!(matches!(fold_expr(&py), Err(SemanticsError::TypeError { .. })));
    }

    #[test]
    fn names_do_not_fold() {
        let node = binop(
            Language::Python,
            Node::name(Language::Python, "x", None),
            BinaryOperator::Add,
            lit(Language::Python, Literal::Int(1)),
        );
        assert_eq!(fold_expr(&node).unwrap(), None);
    }

    #[test]
    fn bool_op_short_circuits_before_unknown_operands() {
        let node = Node::new(
            Language::Python,
            NodeKind::BoolOp {
                op: BoolOperator::And,
                values: vec![lit(Language::Python, Literal::Int(0)), Node::name(Language::Python, "x", None)],
            },
            None,
        );
        assert_eq!(fold_expr(&node).unwrap(), Some(Value::Int(0)));
    }

    #[test]
    fn chained_comparison() {
        let py = |i| lit(Language::Python, Literal::Int(i));
        let node = Node::new(
            Language::Python,
            NodeKind::Compare {
                left: Box::new(py(1)),
                ops: vec![CompareOperator::Lt, CompareOperator::Lt],
                comparators: vec![py(2), py(3)],
            },
            None,
        );
        assert_eq!(fold_expr(&node).unwrap(), Some(Value::Bool(true)));
    }

    #[test]
    fn ternary_picks_a_branch() {
        let js = |v| lit(Language::JavaScript, v);
        let node = Node::synthetic_call(
            Language::JavaScript,
            SyntheticCall::Ternary,
            vec![js(Literal::Str(String::new())), js(Literal::Int(1)), js(Literal::Int(2))],
            vec![],
            None,
        );
        assert_eq!(fold_expr(&node).unwrap(), Some(Value::Int(2)));
    }

    #[test]
    fn tuple_hint_and_unary() {
        let py = |i| lit(Language::Python, Literal::Int(i));
        let tuple = Node::list(Language::Python, vec![py(1), py(2)], None).with_metadata(Metadata::hint("tuple"));
        assert_eq!(
            fold_expr(&tuple).unwrap(),
            Some(Value::Tuple(vec![Value::Int(1), Value::Int(2)]))
        );
        let neg = Node::new(
            Language::Java,
            NodeKind::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(lit(Language::Java, Literal::Int(1))),
            },
            None,
        );
        assert!(matches!(fold_expr(&neg), Err(SemanticsError::TypeError { .. })));
    }

    #[test]
    fn unknown_left_operand_stops_before_the_right_is_folded() {
        for language in [Language::Python, Language::Java] {
            let bad = binop(
                language,
                lit(language, Literal::Int(1)),
                BinaryOperator::Div,
                lit(language, Literal::Int(0)),
            );
            assert!(
                matches!(fold_expr(&bad), Err(SemanticsError::ZeroDivision { .. })),
                "{language}"
            );

            let node = binop(language, Node::name(language, "x", None), BinaryOperator::Add, bad);
            assert_eq!(fold_expr(&node).unwrap(), None, "{language}");
        }
    }
}
