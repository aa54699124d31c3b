//! Python operator semantics.
//!
//! No implicit coercion between strings and numbers; `bool` is an `int`
//! subtype; `%` and `//` round toward negative infinity; empty
//! collections are falsy.

use std::cmp::Ordering;

use polyglot_core::constants::MAX_FOLDED_SEQUENCE_LEN;

use super::symbolic::{Sort, SymBinaryOp, SymExpr};
use super::value::{Operand, Value};
use super::{binary, negate, short_circuit, unary, LanguageSemantics, SemanticsError, SemanticsResult};
use crate::ir::BoolOperator;
use crate::language::Language;

const LANGUAGE: &str = "python";

#[derive(Debug, Default, Clone, Copy)]
pub struct PythonSemantics;

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null | Value::Undefined => "NoneType",
        Value::Bool(_) => "bool",
        Value::Int(_) => "int",
        Value::Float(_) => "float",
        Value::Str(_) => "str",
        Value::List(_) => "list",
        Value::Tuple(_) => "tuple",
        Value::Dict(_) => "dict",
        Value::Set(_) => "set",
    }
}

fn sort_name(sort: Sort) -> &'static str {
    match sort {
        Sort::Bool => "bool",
        Sort::Int => "int",
        Sort::Real => "float",
        Sort::Str => "str",
    }
}

fn type_error(operation: &str, left: &str, right: &str) -> SemanticsError {
    SemanticsError::TypeError {
        language: LANGUAGE.to_string(),
        operation: operation.to_string(),
        left: left.to_string(),
        right: right.to_string(),
    }
}

fn operand_error(operation: &str, a: &Value, b: &Value) -> SemanticsError {
    type_error(operation, type_name(a), type_name(b))
}

fn sym_error(operation: &str, a: &SymExpr, b: &SymExpr) -> SemanticsError {
    type_error(operation, sort_name(a.sort()), sort_name(b.sort()))
}

fn value_error(message: impl Into<String>) -> SemanticsError {
    SemanticsError::ValueError {
        language: LANGUAGE.to_string(),
        message: message.into(),
    }
}

fn zero_division(operation: &str) -> SemanticsError {
    SemanticsError::ZeroDivision {
        language: LANGUAGE.to_string(),
        operation: operation.to_string(),
    }
}

fn overflow(operation: &str) -> SemanticsError {
    value_error(format!("integer overflow in {operation}"))
}

/// Numeric view of a value; `bool` counts as `int`.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Int(i64::from(*b))),
            Value::Int(i) => Some(Self::Int(*i)),
            Value::Float(f) => Some(Self::Float(*f)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Self::Int(i) => i == 0,
            Self::Float(f) => f == 0.0,
        }
    }
}

fn numeric_pair(operation: &str, a: &Value, b: &Value) -> SemanticsResult<(Num, Num)> {
    match (Num::of(a), Num::of(b)) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(operand_error(operation, a, b)),
    }
}

/// Integer op when both sides are ints, float op otherwise.
fn arithmetic(
    operation: &str,
    a: &Value,
    b: &Value,
    int_op: impl FnOnce(i64, i64) -> Option<i64>,
    float_op: impl FnOnce(f64, f64) -> f64,
) -> SemanticsResult<Value> {
    match numeric_pair(operation, a, b)? {
        (Num::Int(x), Num::Int(y)) => int_op(x, y).map(Value::Int).ok_or_else(|| overflow(operation)),
        (x, y) => Ok(Value::Float(float_op(x.as_f64(), y.as_f64()))),
    }
}

fn repeat(operation: &str, items: &Value, count: &Value) -> SemanticsResult<Value> {
    let Some(Num::Int(n)) = Num::of(count) else {
        return Err(operand_error(operation, items, count));
    };
    let unit = match items {
        Value::Str(s) => s.len(),
        Value::List(v) | Value::Tuple(v) => v.len(),
        _ => return Err(operand_error(operation, items, count)),
    };
    // Non-positive counts give an empty sequence.
    let n = usize::try_from(n).unwrap_or(0);
    match unit.checked_mul(n) {
        Some(len) if len <= MAX_FOLDED_SEQUENCE_LEN => {}
        _ => {
            return Err(value_error(format!(
                "repeating a {} of length {unit} {n} times exceeds {MAX_FOLDED_SEQUENCE_LEN}",
                type_name(items)
            )))
        }
    }
    Ok(match items {
        Value::Str(s) => Value::Str(s.repeat(n)),
        Value::List(v) => Value::List(v.iter().cloned().cycle().take(v.len() * n).collect()),
        Value::Tuple(v) => Value::Tuple(v.iter().cloned().cycle().take(v.len() * n).collect()),
        _ => return Err(operand_error(operation, items, count)),
    })
}

fn add(a: &Value, b: &Value) -> SemanticsResult<Value> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Value::Str(format!("{x}{y}"))),
        (Value::List(x), Value::List(y)) => Ok(Value::List(x.iter().chain(y).cloned().collect())),
        (Value::Tuple(x), Value::Tuple(y)) => Ok(Value::Tuple(x.iter().chain(y).cloned().collect())),
        _ => arithmetic("+", a, b, i64::checked_add, |x, y| x + y),
    }
}

fn mul(a: &Value, b: &Value) -> SemanticsResult<Value> {
    match (a, b) {
        (Value::Str(_) | Value::List(_) | Value::Tuple(_), _) => repeat("*", a, b),
        (_, Value::Str(_) | Value::List(_) | Value::Tuple(_)) => repeat("*", b, a),
        _ => arithmetic("*", a, b, i64::checked_mul, |x, y| x * y),
    }
}

fn div(a: &Value, b: &Value) -> SemanticsResult<Value> {
    let (x, y) = numeric_pair("/", a, b)?;
    if y.is_zero() {
        return Err(zero_division("/"));
    }
    Ok(Value::Float(x.as_f64() / y.as_f64()))
}

fn floor_div(a: &Value, b: &Value) -> SemanticsResult<Value> {
    let (x, y) = numeric_pair("//", a, b)?;
    if y.is_zero() {
        return Err(zero_division("//"));
    }
    match (x, y) {
        (Num::Int(x), Num::Int(y)) => {
            let q = x.checked_div(y).ok_or_else(|| overflow("//"))?;
            let adjust = x % y != 0 && ((x < 0) != (y < 0));
            Ok(Value::Int(if adjust { q - 1 } else { q }))
        }
        (x, y) => Ok(Value::Float((x.as_f64() / y.as_f64()).floor())),
    }
}

/// Remainder with the sign of the divisor.
fn modulo(a: &Value, b: &Value) -> SemanticsResult<Value> {
    if a.is_string() {
        return Err(type_error("% (string formatting)", type_name(a), type_name(b)));
    }
    let (x, y) = numeric_pair("%", a, b)?;
    if y.is_zero() {
        return Err(zero_division("%"));
    }
    match (x, y) {
        (Num::Int(x), Num::Int(y)) => {
            let r = x.wrapping_rem(y);
            Ok(Value::Int(if r != 0 && ((r < 0) != (y < 0)) { r + y } else { r }))
        }
        (x, y) => {
            let (x, y) = (x.as_f64(), y.as_f64());
            let r = x % y;
            Ok(Value::Float(if r != 0.0 && ((r < 0.0) != (y < 0.0)) { r + y } else { r }))
        }
    }
}

fn pow(a: &Value, b: &Value) -> SemanticsResult<Value> {
    let (x, y) = numeric_pair("**", a, b)?;
    match (x, y) {
        (Num::Int(base), Num::Int(exp)) if exp >= 0 => {
            let exp = u32::try_from(exp).map_err(|_| overflow("**"))?;
            base.checked_pow(exp).map(Value::Int).ok_or_else(|| overflow("**"))
        }
        (x, y) => {
            let (base, exp) = (x.as_f64(), y.as_f64());
            if base == 0.0 && exp < 0.0 {
                return Err(zero_division("**"));
            }
            if base < 0.0 && exp.fract() != 0.0 {
                return Err(value_error("complex result of ** is not modelled"));
            }
            Ok(Value::Float(base.powf(exp)))
        }
    }
}

/// `==`: numbers compare across the int/float/bool tower, everything else
/// compares only within its own type.
fn equals(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (Num::of(a), Num::of(b)) {
        return match (x, y) {
            (Num::Int(x), Num::Int(y)) => x == y,
            (x, y) => x.as_f64() == y.as_f64(),
        };
    }
    match (a, b) {
        (Value::Null | Value::Undefined, Value::Null | Value::Undefined) => true,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::List(x), Value::List(y)) | (Value::Tuple(x), Value::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| equals(p, q))
        }
        (Value::Set(x), Value::Set(y)) => x.len() == y.len() && x.iter().all(|p| y.iter().any(|q| equals(p, q))),
        (Value::Dict(x), Value::Dict(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.iter().any(|(k2, v2)| equals(k, k2) && equals(v, v2)))
        }
        _ => false,
    }
}

/// Ordering for `<` and friends; `None` when unordered (NaN).
fn ordering(operation: &str, a: &Value, b: &Value) -> SemanticsResult<Option<Ordering>> {
    if let (Some(x), Some(y)) = (Num::of(a), Num::of(b)) {
        return Ok(match (x, y) {
            (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
            (x, y) => x.as_f64().partial_cmp(&y.as_f64()),
        });
    }
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Some(x.cmp(y))),
        (Value::List(x), Value::List(y)) | (Value::Tuple(x), Value::Tuple(y)) => {
            for (p, q) in x.iter().zip(y) {
                if !equals(p, q) {
                    return ordering(operation, p, q);
                }
            }
            Ok(Some(x.len().cmp(&y.len())))
        }
        _ => Err(operand_error(operation, a, b)),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Undefined => false,
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Str(s) => !s.is_empty(),
        Value::List(v) | Value::Tuple(v) | Value::Set(v) => !v.is_empty(),
        Value::Dict(d) => !d.is_empty(),
    }
}

/// `repr()` of a float: shortest round-trip digits, exponent outside
/// `[1e-4, 1e16)`.
fn float_repr(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let scientific = format!("{f:e}");
        if let Some((mantissa, exponent)) = scientific.split_once('e') {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            return format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs());
        }
        return scientific;
    }
    let plain = format!("{f}");
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}

fn string_repr(s: &str) -> String {
    if s.contains('\'') && !s.contains('"') {
        format!("\"{}\"", s.replace('\\', "\\\\"))
    } else {
        format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

fn join(items: &[Value]) -> String {
    items.iter().map(repr).collect::<Vec<_>>().join(", ")
}

fn repr(value: &Value) -> String {
    match value {
        Value::Str(s) => string_repr(s),
        other => str_of(other),
    }
}

/// `str()` of a value.
fn str_of(value: &Value) -> String {
    match value {
        Value::Null | Value::Undefined => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => float_repr(*f),
        Value::Str(s) => s.clone(),
        Value::List(v) => format!("[{}]", join(v)),
        Value::Tuple(v) if v.len() == 1 => format!("({},)", repr(&v[0])),
        Value::Tuple(v) => format!("({})", join(v)),
        Value::Set(v) if v.is_empty() => "set()".to_string(),
        Value::Set(v) => format!("{{{}}}", join(v)),
        Value::Dict(d) => {
            let entries: Vec<String> = d.iter().map(|(k, v)| format!("{}: {}", repr(k), repr(v))).collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// `int()` then `float()` parsing of text.
fn parse_number(text: &str) -> SemanticsResult<Value> {
    let trimmed = text.trim();
    let compact: String = if trimmed.contains('_') && !trimmed.starts_with('_') && !trimmed.ends_with('_') {
        trimmed.replace('_', "")
    } else {
        trimmed.to_string()
    };
    if let Ok(i) = compact.parse::<i64>() {
        return Ok(Value::Int(i));
    }
    compact
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|_| value_error(format!("could not convert string to float: {}", string_repr(text))))
}

fn to_number(value: &Value) -> SemanticsResult<Value> {
    match value {
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Int(_) | Value::Float(_) => Ok(value.clone()),
        Value::Str(s) => parse_number(s),
        other => Err(type_error("to_number", type_name(other), "")),
    }
}

// ---- Symbolic ----

/// Python booleans take part in arithmetic as 0/1.
fn sym_numeric(operation: &str, a: SymExpr, b: SymExpr) -> SemanticsResult<(SymExpr, SymExpr)> {
    if a.sort() == Sort::Str || b.sort() == Sort::Str {
        return Err(sym_error(operation, &a, &b));
    }
    Ok((SymExpr::to_num(a), SymExpr::to_num(b)))
}

fn sym_add(a: SymExpr, b: SymExpr) -> SemanticsResult<SymExpr> {
    match (a.sort(), b.sort()) {
        (Sort::Str, Sort::Str) => SymExpr::concat(a, b),
        _ => {
            let (a, b) = sym_numeric("+", a, b)?;
            SymExpr::add(a, b)
        }
    }
}

fn sym_truthy(a: SymExpr) -> SemanticsResult<SymExpr> {
    match a.sort() {
        Sort::Bool => Ok(a),
        Sort::Int => SymExpr::not(SymExpr::eq(a, SymExpr::Int(0))?),
        Sort::Real => SymExpr::not(SymExpr::eq(a, SymExpr::Real(0.0))?),
        Sort::Str => SymExpr::not(SymExpr::eq(a, SymExpr::string(""))?),
    }
}

fn sym_eq(a: SymExpr, b: SymExpr) -> SemanticsResult<SymExpr> {
    let (a_str, b_str) = (a.sort() == Sort::Str, b.sort() == Sort::Str);
    if a_str != b_str {
        return Ok(SymExpr::Bool(false));
    }
    if a_str || a.sort() == b.sort() {
        return SymExpr::eq(a, b);
    }
    SymExpr::eq(SymExpr::to_num(a), SymExpr::to_num(b))
}

fn sym_compare(op: SymBinaryOp, operation: &str, a: SymExpr, b: SymExpr) -> SemanticsResult<SymExpr> {
    match (a.sort(), b.sort()) {
        (Sort::Str, Sort::Str) => SymExpr::compare(op, a, b),
        (Sort::Str, _) | (_, Sort::Str) => Err(sym_error(operation, &a, &b)),
        _ => SymExpr::compare(op, SymExpr::to_num(a), SymExpr::to_num(b)),
    }
}

fn compare(
    a: &Operand,
    b: &Operand,
    operation: &str,
    op: SymBinaryOp,
    accept: fn(Ordering) -> bool,
) -> SemanticsResult<Operand> {
    binary(
        a,
        b,
        |x, y| Ok(Value::Bool(ordering(operation, x, y)?.is_some_and(accept))),
        |x, y| sym_compare(op, operation, x, y),
    )
}

fn sym_unary_numeric(operation: &str, a: SymExpr) -> SemanticsResult<SymExpr> {
    if a.sort() == Sort::Str {
        return Err(type_error(operation, "str", ""));
    }
    Ok(SymExpr::to_num(a))
}

impl LanguageSemantics for PythonSemantics {
    fn language(&self) -> Language {
        Language::Python
    }

    fn binary_add(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, add, sym_add)
    }

    fn binary_sub(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(
            a,
            b,
            |x, y| arithmetic("-", x, y, i64::checked_sub, |p, q| p - q),
            |x, y| {
                let (x, y) = sym_numeric("-", x, y)?;
                SymExpr::sub(x, y)
            },
        )
    }

    fn binary_mul(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, mul, |x, y| {
            let (x, y) = sym_numeric("*", x, y)?;
            SymExpr::mul(x, y)
        })
    }

    fn binary_div(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, div, |x, y| {
            let (x, y) = sym_numeric("/", x, y)?;
            SymExpr::div(x, y)
        })
    }

    fn binary_floor_div(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, floor_div, |x, y| {
            let (x, y) = sym_numeric("//", x, y)?;
            let integral = x.sort() == Sort::Int && y.sort() == Sort::Int;
            let floored = SymExpr::floor(SymExpr::div(x, y)?);
            Ok(if integral { floored } else { floored.to_real() })
        })
    }

    fn binary_mod(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, modulo, |x, y| {
            let (x, y) = sym_numeric("%", x, y)?;
            SymExpr::modulo(x, y, true)
        })
    }

    fn binary_pow(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, pow, |x, y| {
            let (x, y) = sym_numeric("**", x, y)?;
            SymExpr::pow(x, y)
        })
    }

    fn compare_eq(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, |x, y| Ok(Value::Bool(equals(x, y))), sym_eq)
    }

    /// Python has a single, non-coercing equality.
    fn compare_strict_eq(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        self.compare_eq(a, b)
    }

    fn compare_lt(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        compare(a, b, "<", SymBinaryOp::Lt, Ordering::is_lt)
    }

    fn compare_le(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        compare(a, b, "<=", SymBinaryOp::Le, Ordering::is_le)
    }

    fn compare_gt(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        compare(a, b, ">", SymBinaryOp::Gt, Ordering::is_gt)
    }

    fn compare_ge(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        compare(a, b, ">=", SymBinaryOp::Ge, Ordering::is_ge)
    }

    fn bool_and(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        short_circuit(self, a, b, BoolOperator::And)
    }

    fn bool_or(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        short_circuit(self, a, b, BoolOperator::Or)
    }

    fn bool_not(&self, a: &Operand) -> SemanticsResult<Operand> {
        negate(self, a)
    }

    fn unary_neg(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(
            a,
            |v| match Num::of(v) {
                Some(Num::Int(i)) => i.checked_neg().map(Value::Int).ok_or_else(|| overflow("unary -")),
                Some(Num::Float(f)) => Ok(Value::Float(-f)),
                None => Err(type_error("unary -", type_name(v), "")),
            },
            |e| SymExpr::neg(sym_unary_numeric("unary -", e)?),
        )
    }

    fn unary_pos(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(
            a,
            |v| match Num::of(v) {
                Some(Num::Int(i)) => Ok(Value::Int(i)),
                Some(Num::Float(f)) => Ok(Value::Float(f)),
                None => Err(type_error("unary +", type_name(v), "")),
            },
            |e| sym_unary_numeric("unary +", e),
        )
    }

    /// `~x == -x - 1` on integers.
    fn unary_invert(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(
            a,
            |v| match Num::of(v) {
                Some(Num::Int(i)) => Ok(Value::Int(!i)),
                _ => Err(type_error("unary ~", type_name(v), "")),
            },
            |e| {
                let e = sym_unary_numeric("unary ~", e)?;
                if e.sort() != Sort::Int {
                    return Err(type_error("unary ~", sort_name(e.sort()), ""));
                }
                SymExpr::sub(SymExpr::neg(e)?, SymExpr::Int(1))
            },
        )
    }

    fn to_boolean(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(a, |v| Ok(Value::Bool(truthy(v))), sym_truthy)
    }

    fn to_string(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(
            a,
            |v| Ok(Value::Str(str_of(v))),
            |e| match e.sort() {
                Sort::Bool => SymExpr::ite(e, SymExpr::string("True"), SymExpr::string("False")),
                _ => Ok(SymExpr::to_str(e)),
            },
        )
    }

    fn to_number(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(a, to_number, |e| Ok(SymExpr::to_num(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(v: impl Into<Value>) -> Operand {
        Operand::Concrete(v.into())
    }

    fn value(result: SemanticsResult<Operand>) -> Value {
        result.unwrap().into_concrete().unwrap()
    }

    const PY: PythonSemantics = PythonSemantics;

    #[test]
    fn string_plus_number_is_a_type_error() {
        let err = PY.binary_add(&c("5"), &c(3)).unwrap_err();
        assert!(matches!(err, SemanticsError::TypeError { ref left, ref right, .. } if left == "str" && right == "int"));
        assert_eq!(value(PY.binary_add(&c("a"), &c("b"))), Value::from("ab"));
    }

    #[test]
    fn modulo_and_floor_division_round_down() {
        assert_eq!(value(PY.binary_mod(&c(-7), &c(3))), Value::Int(2));
        assert_eq!(value(PY.binary_mod(&c(7), &c(-3))), Value::Int(-2));
        assert_eq!(value(PY.binary_floor_div(&c(-7), &c(2))), Value::Int(-4));
        assert_eq!(value(PY.binary_mod(&c(-7.5), &c(2.0))), Value::Float(0.5));
        assert!(matches!(
            PY.binary_mod(&c(1), &c(0)),
            Err(SemanticsError::ZeroDivision { .. })
        ));
    }

    #[test]
    fn true_division_always_floats() {
        assert_eq!(value(PY.binary_div(&c(7), &c(2))), Value::Float(3.5));
        assert_eq!(value(PY.binary_div(&c(4), &c(2))), Value::Float(2.0));
    }

    #[test]
    fn bool_participates_in_arithmetic() {
        assert_eq!(value(PY.binary_add(&c(true), &c(1))), Value::Int(2));
        assert_eq!(value(PY.compare_eq(&c(true), &c(1.0))), Value::Bool(true));
    }

    #[test]
    fn equality_never_coerces_text() {
        assert_eq!(value(PY.compare_eq(&c("5"), &c(5))), Value::Bool(false));
        assert_eq!(value(PY.compare_strict_eq(&c(1), &c(1.0))), Value::Bool(true));
    }

    #[test]
    fn ordering_across_types_is_a_type_error() {
        assert!(PY.compare_lt(&c("a"), &c(1)).is_err());
        assert_eq!(value(PY.compare_lt(&c("a"), &c("b"))), Value::Bool(true));
        let small = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let large = Value::List(vec![Value::Int(1), Value::Int(3)]);
        assert_eq!(value(PY.compare_lt(&c(small), &c(large))), Value::Bool(true));
    }

    #[test]
    fn short_circuit_returns_operands() {
        assert_eq!(value(PY.bool_and(&c(0), &c("x"))), Value::Int(0));
        assert_eq!(value(PY.bool_or(&c(""), &c("x"))), Value::from("x"));
        assert_eq!(value(PY.bool_or(&c(2), &c("x"))), Value::Int(2));
    }

    #[test]
    fn falsy_set() {
        for falsy in [
            Value::Null,
            Value::Bool(false),
            Value::Int(0),
            Value::Float(0.0),
            Value::from(""),
            Value::List(vec![]),
            Value::Tuple(vec![]),
            Value::Dict(vec![]),
            Value::Set(vec![]),
        ] {
            assert_eq!(value(PY.to_boolean(&c(falsy.clone()))), Value::Bool(false), "{falsy:?}");
        }
        assert_eq!(value(PY.to_boolean(&c(f64::NAN))), Value::Bool(true));
    }

    #[test]
    fn string_conversion_uses_python_spelling() {
        assert_eq!(value(PY.to_string(&c(true))), Value::from("True"));
        assert_eq!(value(PY.to_string(&c(Value::Null))), Value::from("None"));
        assert_eq!(value(PY.to_string(&c(3.0))), Value::from("3.0"));
        assert_eq!(value(PY.to_string(&c(1e16))), Value::from("1e+16"));
        let list = Value::List(vec![Value::Int(1), Value::from("a")]);
        assert_eq!(value(PY.to_string(&c(list))), Value::from("[1, 'a']"));
    }

    #[test]
    fn unparseable_number_raises() {
        assert_eq!(value(PY.to_number(&c(" 42 "))), Value::Int(42));
        assert_eq!(value(PY.to_number(&c("2.5"))), Value::Float(2.5));
        assert!(matches!(
            PY.to_number(&c("abc")),
            Err(SemanticsError::ValueError { .. })
        ));
    }

    #[test]
    fn symbolic_string_plus_int_is_a_type_error() {
        let s = Operand::Symbolic(SymExpr::var("s", Sort::Str));
        assert!(matches!(
            PY.binary_add(&s, &c(1)),
            Err(SemanticsError::TypeError { .. })
        ));
    }

    #[test]
    fn symbolic_modulo_uses_floor() {
        let x = Operand::Symbolic(SymExpr::var("x", Sort::Int));
        let result = PY.binary_mod(&x, &c(3)).unwrap();
        assert!(result.as_symbolic().unwrap().to_string().contains("to_int"));
    }

    #[test]
    fn symbolic_truthiness_of_int() {
        let x = Operand::Symbolic(SymExpr::var("x", Sort::Int));
        let t = PY.to_boolean(&x).unwrap();
        assert_eq!(t.as_symbolic().unwrap().to_string(), "(not (= x 0))");
    }
}
