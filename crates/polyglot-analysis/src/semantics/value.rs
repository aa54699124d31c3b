//! Concrete runtime values and the operand wrapper shared by every
//! semantics implementation.

use serde::{Deserialize, Serialize};

use super::symbolic::SymExpr;
use crate::ir::Literal;

/// A concrete runtime value, language-neutral.
///
/// `List` stands for Python lists, JavaScript arrays and Java arrays;
/// `Tuple`, `Dict` and `Set` only arise from Python. Dicts keep insertion
/// order as a plain pair list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Undefined,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(Vec<(Value, Value)>),
    Set(Vec<Value>),
}

impl Value {
    /// The value a literal denotes. Literals with no concrete model here
    /// (big integers, bytes, `...`) give `None`.
    pub fn from_literal(literal: &Literal) -> Option<Self> {
        Some(match literal {
            Literal::Null => Self::Null,
            Literal::Undefined => Self::Undefined,
            Literal::Bool(b) => Self::Bool(*b),
            Literal::Int(i) => Self::Int(*i),
            Literal::Float(f) => Self::Float(*f),
            Literal::Str(s) => Self::Str(s.clone()),
            Literal::BigInt(_) | Literal::Bytes(_) | Literal::Ellipsis => return None,
        })
    }

    pub fn nan() -> Self {
        Self::Float(f64::NAN)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Self::Float(f) if f.is_nan())
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::Str(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Tuple(_) | Self::Dict(_) | Self::Set(_))
    }

    /// Numeric view of `Int`/`Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Language-neutral kind name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Dict(_) => "dict",
            Self::Set(_) => "set",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

/// An operand of a semantics operation: a concrete value or a solver
/// expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Concrete(Value),
    Symbolic(SymExpr),
}

impl Operand {
    pub fn as_concrete(&self) -> Option<&Value> {
        match self {
            Self::Concrete(v) => Some(v),
            Self::Symbolic(_) => None,
        }
    }

    pub fn as_symbolic(&self) -> Option<&SymExpr> {
        match self {
            Self::Symbolic(e) => Some(e),
            Self::Concrete(_) => None,
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, Self::Symbolic(_))
    }

    pub fn into_concrete(self) -> Option<Value> {
        match self {
            Self::Concrete(v) => Some(v),
            Self::Symbolic(_) => None,
        }
    }

    /// This operand as a solver expression, lifting concrete scalars.
    pub fn to_symbolic(&self) -> super::SemanticsResult<SymExpr> {
        match self {
            Self::Symbolic(e) => Ok(e.clone()),
            Self::Concrete(v) => SymExpr::from_value(v),
        }
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Self::Concrete(v)
    }
}

impl From<SymExpr> for Operand {
    fn from(e: SymExpr) -> Self {
        Self::Symbolic(e)
    }
}

/// A pair of operands resolved to one representation: both concrete, or
/// both symbolic with concrete scalars lifted.
pub enum Operands<'a> {
    Concrete(&'a Value, &'a Value),
    Symbolic(SymExpr, SymExpr),
}

impl<'a> Operands<'a> {
    pub fn resolve(a: &'a Operand, b: &'a Operand) -> super::SemanticsResult<Self> {
        match (a, b) {
            (Operand::Concrete(x), Operand::Concrete(y)) => Ok(Self::Concrete(x, y)),
            _ => Ok(Self::Symbolic(a.to_symbolic()?, b.to_symbolic()?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantics::symbolic::Sort;

    #[test]
    fn literal_conversion_skips_unmodelled_literals() {
        assert_eq!(Value::from_literal(&Literal::Int(3)), Some(Value::Int(3)));
        assert_eq!(Value::from_literal(&Literal::Undefined), Some(Value::Undefined));
        assert_eq!(Value::from_literal(&Literal::BigInt("1".repeat(30))), None);
        assert_eq!(Value::from_literal(&Literal::Ellipsis), None);
    }

    #[test]
    fn mixed_operands_lift_the_concrete_side() {
        let x = Operand::Symbolic(SymExpr::var("x", Sort::Int));
        let three = Operand::Concrete(Value::Int(3));
        match Operands::resolve(&x, &three).unwrap() {
            Operands::Symbolic(_, right) => assert_eq!(right, SymExpr::Int(3)),
            Operands::Concrete(..) => panic!("expected symbolic pair"),
        }
    }

    #[test]
    fn collections_cannot_be_lifted() {
        let x = Operand::Symbolic(SymExpr::var("x", Sort::Int));
        let list = Operand::Concrete(Value::List(vec![]));
        assert!(Operands::resolve(&x, &list).is_err());
    }
}
