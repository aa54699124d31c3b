//! A small solver-expression language.
//!
//! Sorts follow SMT-LIB: `Bool`, `Int`, `Real` and `Str`. Builders check
//! sorts and insert `to_real` where an `Int` meets a `Real`; anything else
//! ill-sorted is a `SemanticsError::Symbolic`. `Display` renders
//! s-expressions close to SMT-LIB syntax.

use std::fmt;

use polyglot_core::errors::{SemanticsError, SemanticsResult};
use serde::{Deserialize, Serialize};

use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sort {
    Bool,
    Int,
    Real,
    Str,
}

impl Sort {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Real)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Int => "Int",
            Self::Real => "Real",
            Self::Str => "String",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymUnaryOp {
    Neg,
    Not,
    ToReal,
    /// Real to Int, rounding toward negative infinity.
    Floor,
    /// Real to Int, rounding toward zero.
    Trunc,
    ToStr,
    /// Str to Real; unparseable text has no defined value.
    ToNum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Concat,
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymExpr {
    Var { name: String, sort: Sort },
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
    Unary {
        op: SymUnaryOp,
        arg: Box<SymExpr>,
    },
    Binary {
        op: SymBinaryOp,
        left: Box<SymExpr>,
        right: Box<SymExpr>,
    },
    Ite {
        cond: Box<SymExpr>,
        then: Box<SymExpr>,
        otherwise: Box<SymExpr>,
    },
}

fn ill_sorted(operation: &str, message: String) -> SemanticsError {
    SemanticsError::Symbolic {
        operation: operation.to_string(),
        message,
    }
}

impl SymExpr {
    pub fn var(name: impl Into<String>, sort: Sort) -> Self {
        Self::Var {
            name: name.into(),
            sort,
        }
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    /// Lift a concrete scalar. Null, undefined and collections have no sort.
    pub fn from_value(value: &Value) -> SemanticsResult<Self> {
        match value {
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Int(i) => Ok(Self::Int(*i)),
            Value::Float(f) => Ok(Self::Real(*f)),
            Value::Str(s) => Ok(Self::Str(s.clone())),
            other => Err(ill_sorted("lift", format!("{} value has no solver sort", other.kind()))),
        }
    }

    pub fn sort(&self) -> Sort {
        match self {
            Self::Var { sort, .. } => *sort,
            Self::Bool(_) => Sort::Bool,
            Self::Int(_) => Sort::Int,
            Self::Real(_) => Sort::Real,
            Self::Str(_) => Sort::Str,
            Self::Unary { op, arg } => match op {
                SymUnaryOp::Neg => arg.sort(),
                SymUnaryOp::Not => Sort::Bool,
                SymUnaryOp::ToReal | SymUnaryOp::ToNum => Sort::Real,
                SymUnaryOp::Floor | SymUnaryOp::Trunc => Sort::Int,
                SymUnaryOp::ToStr => Sort::Str,
            },
            Self::Binary { op, left, right } => match op {
                SymBinaryOp::Add | SymBinaryOp::Sub | SymBinaryOp::Mul | SymBinaryOp::Pow => {
                    if left.sort() == Sort::Real || right.sort() == Sort::Real {
                        Sort::Real
                    } else {
                        Sort::Int
                    }
                }
                SymBinaryOp::Div => Sort::Real,
                SymBinaryOp::Concat => Sort::Str,
                _ => Sort::Bool,
            },
            Self::Ite { then, .. } => then.sort(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn unary(op: SymUnaryOp, arg: Self) -> Self {
        Self::Unary { op, arg: Box::new(arg) }
    }

    fn binary(op: SymBinaryOp, left: Self, right: Self) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn expect_sort(&self, sort: Sort, operation: &str) -> SemanticsResult<()> {
        if self.sort() == sort {
            Ok(())
        } else {
            Err(ill_sorted(
                operation,
                format!("expected {}, found {}", sort.name(), self.sort().name()),
            ))
        }
    }

    fn expect_numeric(&self, operation: &str) -> SemanticsResult<()> {
        if self.sort().is_numeric() {
            Ok(())
        } else {
            Err(ill_sorted(operation, format!("expected a number, found {}", self.sort().name())))
        }
    }

    /// Bring two numeric operands to a common sort.
    fn unify(a: Self, b: Self) -> (Self, Self) {
        match (a.sort(), b.sort()) {
            (Sort::Int, Sort::Real) => (a.to_real(), b),
            (Sort::Real, Sort::Int) => (a, b.to_real()),
            _ => (a, b),
        }
    }

    // ---- Arithmetic ----

    pub fn arith(op: SymBinaryOp, a: Self, b: Self) -> SemanticsResult<Self> {
        let operation = format!("{op:?}").to_lowercase();
        a.expect_numeric(&operation)?;
        b.expect_numeric(&operation)?;
        let (a, b) = Self::unify(a, b);
        Ok(match op {
            SymBinaryOp::Div => Self::binary(op, a.to_real(), b.to_real()),
            _ => Self::binary(op, a, b),
        })
    }

    pub fn add(a: Self, b: Self) -> SemanticsResult<Self> {
        Self::arith(SymBinaryOp::Add, a, b)
    }

    pub fn sub(a: Self, b: Self) -> SemanticsResult<Self> {
        Self::arith(SymBinaryOp::Sub, a, b)
    }

    pub fn mul(a: Self, b: Self) -> SemanticsResult<Self> {
        Self::arith(SymBinaryOp::Mul, a, b)
    }

    pub fn div(a: Self, b: Self) -> SemanticsResult<Self> {
        Self::arith(SymBinaryOp::Div, a, b)
    }

    pub fn pow(a: Self, b: Self) -> SemanticsResult<Self> {
        Self::arith(SymBinaryOp::Pow, a, b)
    }

    pub fn neg(a: Self) -> SemanticsResult<Self> {
        a.expect_numeric("neg")?;
        Ok(match a {
            Self::Int(i) => i.checked_neg().map_or_else(|| Self::unary(SymUnaryOp::Neg, Self::Int(i)), Self::Int),
            Self::Real(f) => Self::Real(-f),
            other => Self::unary(SymUnaryOp::Neg, other),
        })
    }

    /// `a - b * round(a / b)`, with `round` either `floor` or `trunc`.
    pub fn modulo(a: Self, b: Self, floored: bool) -> SemanticsResult<Self> {
        let quotient = Self::div(a.clone(), b.clone())?;
        let rounded = if floored {
            Self::floor(quotient)
        } else {
            Self::trunc(quotient)
        };
        let product = Self::mul(b, rounded)?;
        Self::sub(a, product)
    }

    pub fn to_real(self) -> Self {
        match self {
            Self::Int(i) => Self::Real(i as f64),
            other if other.sort() == Sort::Int => Self::unary(SymUnaryOp::ToReal, other),
            other => other,
        }
    }

    pub fn floor(a: Self) -> Self {
        if a.sort() == Sort::Real {
            Self::unary(SymUnaryOp::Floor, a)
        } else {
            a
        }
    }

    pub fn trunc(a: Self) -> Self {
        if a.sort() == Sort::Real {
            Self::unary(SymUnaryOp::Trunc, a)
        } else {
            a
        }
    }

    // ---- Strings ----

    pub fn concat(a: Self, b: Self) -> SemanticsResult<Self> {
        a.expect_sort(Sort::Str, "concat")?;
        b.expect_sort(Sort::Str, "concat")?;
        Ok(match (a, b) {
            (Self::Str(x), Self::Str(y)) => Self::Str(x + &y),
            (a, b) => Self::binary(SymBinaryOp::Concat, a, b),
        })
    }

    /// Neutral number-to-text conversion. Booleans are rendered by the
    /// caller, since their spelling is language-specific.
    pub fn to_str(a: Self) -> Self {
        if a.sort() == Sort::Str {
            a
        } else {
            Self::unary(SymUnaryOp::ToStr, a)
        }
    }

    /// Text or boolean to number; numbers pass through.
    pub fn to_num(a: Self) -> Self {
        match a.sort() {
            Sort::Str => Self::unary(SymUnaryOp::ToNum, a),
            Sort::Bool => Self::Ite {
                cond: Box::new(a),
                then: Box::new(Self::Int(1)),
                otherwise: Box::new(Self::Int(0)),
            },
            Sort::Int | Sort::Real => a,
        }
    }

    // ---- Comparisons ----

    pub fn eq(a: Self, b: Self) -> SemanticsResult<Self> {
        if a.sort().is_numeric() && b.sort().is_numeric() {
            let (a, b) = Self::unify(a, b);
            return Ok(Self::binary(SymBinaryOp::Eq, a, b));
        }
        b.expect_sort(a.sort(), "eq")?;
        Ok(Self::binary(SymBinaryOp::Eq, a, b))
    }

    /// Ordering over numbers, or lexicographic over strings.
    pub fn compare(op: SymBinaryOp, a: Self, b: Self) -> SemanticsResult<Self> {
        let operation = format!("{op:?}").to_lowercase();
        if a.sort() == Sort::Str && b.sort() == Sort::Str {
            return Ok(Self::binary(op, a, b));
        }
        a.expect_numeric(&operation)?;
        b.expect_numeric(&operation)?;
        let (a, b) = Self::unify(a, b);
        Ok(Self::binary(op, a, b))
    }

    // ---- Connectives ----

    pub fn not(a: Self) -> SemanticsResult<Self> {
        a.expect_sort(Sort::Bool, "not")?;
        Ok(match a {
            Self::Bool(b) => Self::Bool(!b),
            Self::Unary {
                op: SymUnaryOp::Not,
                arg,
            } => *arg,
            other => Self::unary(SymUnaryOp::Not, other),
        })
    }

    pub fn and(a: Self, b: Self) -> SemanticsResult<Self> {
        a.expect_sort(Sort::Bool, "and")?;
        b.expect_sort(Sort::Bool, "and")?;
        Ok(match (a.as_bool(), b.as_bool()) {
            (Some(false), _) | (_, Some(false)) => Self::Bool(false),
            (Some(true), _) => b,
            (_, Some(true)) => a,
            _ => Self::binary(SymBinaryOp::And, a, b),
        })
    }

    pub fn or(a: Self, b: Self) -> SemanticsResult<Self> {
        a.expect_sort(Sort::Bool, "or")?;
        b.expect_sort(Sort::Bool, "or")?;
        Ok(match (a.as_bool(), b.as_bool()) {
            (Some(true), _) | (_, Some(true)) => Self::Bool(true),
            (Some(false), _) => b,
            (_, Some(false)) => a,
            _ => Self::binary(SymBinaryOp::Or, a, b),
        })
    }

    pub fn ite(cond: Self, then: Self, otherwise: Self) -> SemanticsResult<Self> {
        cond.expect_sort(Sort::Bool, "ite")?;
        let (then, otherwise) = if then.sort().is_numeric() && otherwise.sort().is_numeric() {
            Self::unify(then, otherwise)
        } else {
            otherwise.expect_sort(then.sort(), "ite")?;
            (then, otherwise)
        };
        Ok(match cond.as_bool() {
            Some(true) => then,
            Some(false) => otherwise,
            None => Self::Ite {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
        })
    }
}

impl fmt::Display for SymExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var { name, .. } => write!(f, "{name}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) if *i < 0 => write!(f, "(- {})", i.unsigned_abs()),
            Self::Int(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r:?}"),
            Self::Str(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            Self::Unary { op, arg } => {
                let name = match op {
                    SymUnaryOp::Neg => "-",
                    SymUnaryOp::Not => "not",
                    SymUnaryOp::ToReal => "to_real",
                    SymUnaryOp::Floor => "to_int",
                    SymUnaryOp::Trunc => "trunc",
                    SymUnaryOp::ToStr => "to_str",
                    SymUnaryOp::ToNum => "str.to_num",
                };
                write!(f, "({name} {arg})")
            }
            Self::Binary { op, left, right } => {
                let name = match op {
                    SymBinaryOp::Add => "+",
                    SymBinaryOp::Sub => "-",
                    SymBinaryOp::Mul => "*",
                    SymBinaryOp::Div => "/",
                    SymBinaryOp::Pow => "^",
                    SymBinaryOp::Concat => "str.++",
                    SymBinaryOp::Eq => "=",
                    SymBinaryOp::Lt if left.sort() == Sort::Str => "str.<",
                    SymBinaryOp::Le if left.sort() == Sort::Str => "str.<=",
                    SymBinaryOp::Gt if left.sort() == Sort::Str => "str.>",
                    SymBinaryOp::Ge if left.sort() == Sort::Str => "str.>=",
                    SymBinaryOp::Lt => "<",
                    SymBinaryOp::Le => "<=",
                    SymBinaryOp::Gt => ">",
                    SymBinaryOp::Ge => ">=",
                    SymBinaryOp::And => "and",
                    SymBinaryOp::Or => "or",
                };
                write!(f, "({name} {left} {right})")
            }
            Self::Ite { cond, then, otherwise } => write!(f, "(ite {cond} {then} {otherwise})"),
        }
    }
}
