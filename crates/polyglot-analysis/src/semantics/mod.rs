//! Per-language operator semantics.
//!
//! The IR says *which* operator was written; a [`LanguageSemantics`]
//! implementation says what it computes in the language the node came
//! from. Every operation accepts concrete values and solver expressions
//! alike and branches once on which it was given.

pub mod fold;
pub mod java;
pub mod javascript;
pub mod python;
pub mod symbolic;
pub mod value;

pub use polyglot_core::errors::{SemanticsError, SemanticsResult};

pub use fold::fold_expr;
pub use java::JavaSemantics;
pub use javascript::JavaScriptSemantics;
pub use python::PythonSemantics;
pub use symbolic::{Sort, SymExpr};
pub use value::{Operand, Operands, Value};

use crate::ir::{BinaryOperator, BoolOperator, CompareOperator, IrNode, UnaryOperator};
use crate::language::Language;

/// Operator behavior of one source language.
pub trait LanguageSemantics: Send + Sync {
    fn language(&self) -> Language;

    // ---- Arithmetic ----
    fn binary_add(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;
    fn binary_sub(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;
    fn binary_mul(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;
    fn binary_div(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;
    fn binary_floor_div(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;
    fn binary_mod(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;
    fn binary_pow(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;

    // ---- Comparison ----
    fn compare_eq(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;
    fn compare_strict_eq(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;
    fn compare_lt(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;
    fn compare_le(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;
    fn compare_gt(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;
    fn compare_ge(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;

    // ---- Boolean ----
    /// Returns `a` when it is falsy, `b` otherwise.
    fn bool_and(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;
    /// Returns `a` when it is truthy, `b` otherwise.
    fn bool_or(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand>;
    fn bool_not(&self, a: &Operand) -> SemanticsResult<Operand>;

    // ---- Unary ----
    fn unary_neg(&self, a: &Operand) -> SemanticsResult<Operand>;
    fn unary_pos(&self, a: &Operand) -> SemanticsResult<Operand>;
    fn unary_invert(&self, a: &Operand) -> SemanticsResult<Operand>;

    // ---- Coercion ----
    fn to_boolean(&self, a: &Operand) -> SemanticsResult<Operand>;
    fn to_string(&self, a: &Operand) -> SemanticsResult<Operand>;
    fn to_number(&self, a: &Operand) -> SemanticsResult<Operand>;

    fn unsupported(&self, operator: &str) -> SemanticsError {
        SemanticsError::UnsupportedOperator {
            language: self.language().tag().to_string(),
            operator: operator.to_string(),
        }
    }

    fn apply_binary(&self, op: BinaryOperator, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        match op {
            BinaryOperator::Add => self.binary_add(a, b),
            BinaryOperator::Sub => self.binary_sub(a, b),
            BinaryOperator::Mul => self.binary_mul(a, b),
            BinaryOperator::Div => self.binary_div(a, b),
            BinaryOperator::FloorDiv => self.binary_floor_div(a, b),
            BinaryOperator::Mod => self.binary_mod(a, b),
            BinaryOperator::Pow => self.binary_pow(a, b),
            BinaryOperator::BitAnd
            | BinaryOperator::BitOr
            | BinaryOperator::BitXor
            | BinaryOperator::LShift
            | BinaryOperator::RShift
            | BinaryOperator::MatMul => Err(self.unsupported(op.symbol())),
        }
    }

    fn apply_compare(&self, op: CompareOperator, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        match op {
            CompareOperator::Eq => self.compare_eq(a, b),
            CompareOperator::NotEq => self.bool_not(&self.compare_eq(a, b)?),
            CompareOperator::StrictEq => self.compare_strict_eq(a, b),
            CompareOperator::StrictNotEq => self.bool_not(&self.compare_strict_eq(a, b)?),
            CompareOperator::Lt => self.compare_lt(a, b),
            CompareOperator::LtE => self.compare_le(a, b),
            CompareOperator::Gt => self.compare_gt(a, b),
            CompareOperator::GtE => self.compare_ge(a, b),
            CompareOperator::Is | CompareOperator::IsNot | CompareOperator::In | CompareOperator::NotIn => {
                Err(self.unsupported(op.symbol()))
            }
        }
    }

    fn apply_unary(&self, op: UnaryOperator, a: &Operand) -> SemanticsResult<Operand> {
        match op {
            UnaryOperator::Neg => self.unary_neg(a),
            UnaryOperator::Pos => self.unary_pos(a),
            UnaryOperator::Not => self.bool_not(a),
            UnaryOperator::Invert => self.unary_invert(a),
        }
    }

    fn apply_bool(&self, op: BoolOperator, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        match op {
            BoolOperator::And => self.bool_and(a, b),
            BoolOperator::Or => self.bool_or(a, b),
        }
    }
}

static PYTHON: PythonSemantics = PythonSemantics;
static JAVASCRIPT: JavaScriptSemantics = JavaScriptSemantics;
static JAVA: JavaSemantics = JavaSemantics;

pub fn semantics_for_language(language: Language) -> &'static dyn LanguageSemantics {
    match language {
        Language::Python => &PYTHON,
        Language::JavaScript => &JAVASCRIPT,
        Language::Java => &JAVA,
    }
}

/// Look up semantics by `source_language` tag.
pub fn semantics_for(tag: &str) -> SemanticsResult<&'static dyn LanguageSemantics> {
    Language::from_tag(tag)
        .map(semantics_for_language)
        .ok_or_else(|| SemanticsError::UnknownLanguage {
            language: tag.to_string(),
        })
}

/// Semantics of the language a node was normalized from.
pub fn semantics_for_node(node: &impl IrNode) -> &'static dyn LanguageSemantics {
    semantics_for_language(node.language())
}

// ---- Helpers shared by the implementations ----

/// Branch a binary operation once on the operand representation.
pub(crate) fn binary(
    a: &Operand,
    b: &Operand,
    concrete: impl FnOnce(&Value, &Value) -> SemanticsResult<Value>,
    symbolic: impl FnOnce(SymExpr, SymExpr) -> SemanticsResult<SymExpr>,
) -> SemanticsResult<Operand> {
    match Operands::resolve(a, b)? {
        Operands::Concrete(x, y) => concrete(x, y).map(Operand::Concrete),
        Operands::Symbolic(x, y) => symbolic(x, y).map(Operand::Symbolic),
    }
}

pub(crate) fn unary(
    a: &Operand,
    concrete: impl FnOnce(&Value) -> SemanticsResult<Value>,
    symbolic: impl FnOnce(SymExpr) -> SemanticsResult<SymExpr>,
) -> SemanticsResult<Operand> {
    match a {
        Operand::Concrete(v) => concrete(v).map(Operand::Concrete),
        Operand::Symbolic(e) => symbolic(e.clone()).map(Operand::Symbolic),
    }
}

pub(crate) fn concrete_bool(operand: Operand) -> SemanticsResult<bool> {
    match operand {
        Operand::Concrete(Value::Bool(b)) => Ok(b),
        Operand::Concrete(other) => Err(SemanticsError::Symbolic {
            operation: "to_boolean".to_string(),
            message: format!("truthiness produced a {} value", other.kind()),
        }),
        Operand::Symbolic(_) => Err(SemanticsError::Symbolic {
            operation: "to_boolean".to_string(),
            message: "truthiness of a concrete value produced an expression".to_string(),
        }),
    }
}

/// Value-returning AND/OR. A concrete left operand decides statically; a
/// symbolic one becomes an `ite` over its truthiness, or a plain connective
/// when both sides are boolean.
pub(crate) fn short_circuit<S: LanguageSemantics + ?Sized>(
    semantics: &S,
    a: &Operand,
    b: &Operand,
    op: BoolOperator,
) -> SemanticsResult<Operand> {
    match a {
        Operand::Concrete(_) => {
            let truthy = concrete_bool(semantics.to_boolean(a)?)?;
            let keep_left = match op {
                BoolOperator::And => !truthy,
                BoolOperator::Or => truthy,
            };
            Ok(if keep_left { a.clone() } else { b.clone() })
        }
        Operand::Symbolic(left) => {
            let right = b.to_symbolic()?;
            if left.sort() == Sort::Bool && right.sort() == Sort::Bool {
                let joined = match op {
                    BoolOperator::And => SymExpr::and(left.clone(), right)?,
                    BoolOperator::Or => SymExpr::or(left.clone(), right)?,
                };
                return Ok(Operand::Symbolic(joined));
            }
            let cond = semantics.to_boolean(a)?.to_symbolic()?;
            let expr = match op {
                BoolOperator::And => SymExpr::ite(cond, right, left.clone())?,
                BoolOperator::Or => SymExpr::ite(cond, left.clone(), right)?,
            };
            Ok(Operand::Symbolic(expr))
        }
    }
}

/// `not` through the language's own truthiness.
pub(crate) fn negate<S: LanguageSemantics + ?Sized>(semantics: &S, a: &Operand) -> SemanticsResult<Operand> {
    match semantics.to_boolean(a)? {
        Operand::Concrete(v) => Ok(Operand::Concrete(Value::Bool(!concrete_bool(Operand::Concrete(v))?))),
        Operand::Symbolic(e) => Ok(Operand::Symbolic(SymExpr::not(e)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Literal, Node};

    #[test]
    fn lookup_by_tag() {
        assert_eq!(semantics_for("python").unwrap().language(), Language::Python);
        assert_eq!(semantics_for("javascript").unwrap().language(), Language::JavaScript);
        assert_eq!(semantics_for("java").unwrap().language(), Language::Java);
        assert!(matches!(
            semantics_for("cobol"),
            Err(SemanticsError::UnknownLanguage { .. })
        ));
    }

    #[test]
    fn lookup_by_node_language() {
        let node = Node::constant(Language::JavaScript, Literal::Int(1), None);
        assert_eq!(semantics_for_node(&node).language(), Language::JavaScript);
    }

    #[test]
    fn bitwise_operators_are_unsupported() {
        let one = Operand::Concrete(Value::Int(1));
        for tag in ["python", "javascript", "java"] {
            let err = semantics_for(tag)
                .unwrap()
                .apply_binary(BinaryOperator::BitAnd, &one, &one)
                .unwrap_err();
            assert!(matches!(err, SemanticsError::UnsupportedOperator { .. }), "{tag}: {err}");
        }
    }

    #[test]
    fn not_equal_negates_equality() {
        let py = semantics_for("python").unwrap();
        let result = py
            .apply_compare(
                CompareOperator::NotEq,
                &Operand::Concrete(Value::Int(1)),
                &Operand::Concrete(Value::Int(2)),
            )
            .unwrap();
        assert_eq!(result, Operand::Concrete(Value::Bool(true)));
    }
}
