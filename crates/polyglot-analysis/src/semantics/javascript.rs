//! JavaScript operator semantics.
//!
//! Every number is an IEEE double; results that are integral come back as
//! `Value::Int` so they compare equal to the literals that produced them.
//! `+` concatenates as soon as either primitive is a string, `==` coerces,
//! `===` does not, and only the seven falsy values are falsy.

use std::cmp::Ordering;

use super::symbolic::{Sort, SymBinaryOp, SymExpr};
use super::value::{Operand, Value};
use super::{binary, negate, short_circuit, unary, LanguageSemantics, SemanticsError, SemanticsResult};
use crate::ir::BoolOperator;
use crate::language::Language;

const LANGUAGE: &str = "javascript";

/// Largest magnitude below which an integral double is kept as `Int`.
const SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct JavaScriptSemantics;

fn type_error(operation: &str, left: &str, right: &str) -> SemanticsError {
    SemanticsError::TypeError {
        language: LANGUAGE.to_string(),
        operation: operation.to_string(),
        left: left.to_string(),
        right: right.to_string(),
    }
}

fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Undefined => "undefined",
        Value::Bool(_) => "boolean",
        Value::Int(_) | Value::Float(_) => "number",
        Value::Str(_) => "string",
        Value::List(_) | Value::Tuple(_) | Value::Set(_) => "array",
        Value::Dict(_) => "object",
    }
}

/// A double as a `Value`, integral results as `Int`. `-0` stays a float.
fn number(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() <= SAFE_INTEGER && !(f == 0.0 && f.is_sign_negative()) {
        Value::Int(f as i64)
    } else {
        Value::Float(f)
    }
}

/// `Number::toString`: shortest round-trip digits, exponent form outside
/// `[1e-6, 1e21)`.
fn number_string(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if f == 0.0 {
        return "0".to_string();
    }
    let magnitude = f.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format!("{f}");
    }
    let scientific = format!("{f:e}");
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
        Some((mantissa, exponent)) => format!("{mantissa}e{exponent}"),
        None => scientific,
    }
}

/// `ToPrimitive` for the values that have no primitive form.
fn primitive_string(value: &Value) -> Option<String> {
    match value {
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::Null | Value::Undefined => String::new(),
                    other => string_of(other),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Dict(_) => Some("[object Object]".to_string()),
        _ => None,
    }
}

fn string_of(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Undefined => "undefined".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => number_string(*f),
        Value::Str(s) => s.clone(),
        other => primitive_string(other).unwrap_or_default(),
    }
}

/// `StringToNumber`: whitespace trimmed, empty is 0, radix prefixes and
/// `Infinity` accepted, anything else NaN.
fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let radix = match trimmed.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return u64::from_str_radix(&trimmed[2..], radix).map_or(f64::NAN, |n| n as f64);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts "inf" and "nan", JavaScript does not.
        _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// `ToNumber`.
fn to_f64(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Undefined => f64::NAN,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Str(s) => parse_number(s),
        other => primitive_string(other).map_or(f64::NAN, |s| parse_number(&s)),
    }
}

/// `ToInt32`.
fn to_int32(f: f64) -> i32 {
    if !f.is_finite() {
        return 0;
    }
    let wrapped = f.trunc().rem_euclid(4_294_967_296.0);
    (wrapped as u32) as i32
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Undefined => false,
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0 && !f.is_nan(),
        Value::Str(s) => !s.is_empty(),
        Value::List(_) | Value::Tuple(_) | Value::Dict(_) | Value::Set(_) => true,
    }
}

fn numeric(a: &Value, b: &Value, op: impl FnOnce(f64, f64) -> f64) -> SemanticsResult<Value> {
    Ok(number(op(to_f64(a), to_f64(b))))
}

fn add(a: &Value, b: &Value) -> SemanticsResult<Value> {
    let left = primitive_string(a).map_or_else(|| a.clone(), Value::Str);
    let right = primitive_string(b).map_or_else(|| b.clone(), Value::Str);
    if left.is_string() || right.is_string() {
        return Ok(Value::Str(format!("{}{}", string_of(&left), string_of(&right))));
    }
    numeric(&left, &right, |x, y| x + y)
}

fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null | Value::Undefined, Value::Null | Value::Undefined) => true,
        (Value::Null | Value::Undefined, _) | (_, Value::Null | Value::Undefined) => false,
        // Object identity is not modelled.
        (x, y) if x.is_collection() && y.is_collection() => false,
        (Value::Str(x), Value::Str(y)) => x == y,
        (x, y) if x.is_collection() || y.is_collection() => {
            let x = primitive_string(x).map_or_else(|| x.clone(), Value::Str);
            let y = primitive_string(y).map_or_else(|| y.clone(), Value::Str);
            loose_equals(&x, &y)
        }
        _ => to_f64(a) == to_f64(b),
    }
}

fn strict_equals(a: &Value, b: &Value) -> bool {
    if type_of(a) != type_of(b) || a.is_collection() {
        return false;
    }
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Null, Value::Null) | (Value::Undefined, Value::Undefined) => true,
        _ => to_f64(a) == to_f64(b),
    }
}

/// Abstract relational comparison; `None` when either side is NaN.
fn ordering(a: &Value, b: &Value) -> Option<Ordering> {
    let left = primitive_string(a).map_or_else(|| a.clone(), Value::Str);
    let right = primitive_string(b).map_or_else(|| b.clone(), Value::Str);
    match (&left, &right) {
        (Value::Str(x), Value::Str(y)) => Some(x.encode_utf16().cmp(y.encode_utf16())),
        _ => to_f64(&left).partial_cmp(&to_f64(&right)),
    }
}

// ---- Symbolic ----

/// Numeric operand of arithmetic other than `+`: strings parse, booleans
/// become 0/1, and everything computes over reals.
fn sym_number(a: SymExpr) -> SymExpr {
    SymExpr::to_num(a).to_real()
}

fn sym_arith(
    a: SymExpr,
    b: SymExpr,
    op: fn(SymExpr, SymExpr) -> SemanticsResult<SymExpr>,
) -> SemanticsResult<SymExpr> {
    if a.sort() == Sort::Int && b.sort() == Sort::Int {
        return op(a, b);
    }
    op(sym_number(a), sym_number(b))
}

fn sym_string(a: SymExpr) -> SemanticsResult<SymExpr> {
    match a.sort() {
        Sort::Bool => SymExpr::ite(a, SymExpr::string("true"), SymExpr::string("false")),
        _ => Ok(SymExpr::to_str(a)),
    }
}

fn sym_add(a: SymExpr, b: SymExpr) -> SemanticsResult<SymExpr> {
    if a.sort() == Sort::Str || b.sort() == Sort::Str {
        return SymExpr::concat(sym_string(a)?, sym_string(b)?);
    }
    sym_arith(a, b, SymExpr::add)
}

fn sym_truthy(a: SymExpr) -> SemanticsResult<SymExpr> {
    match a.sort() {
        Sort::Bool => Ok(a),
        Sort::Int => SymExpr::not(SymExpr::eq(a, SymExpr::Int(0))?),
        Sort::Real => {
            let nonzero = SymExpr::not(SymExpr::eq(a.clone(), SymExpr::Real(0.0))?)?;
            let not_nan = SymExpr::eq(a.clone(), a)?;
            SymExpr::and(nonzero, not_nan)
        }
        Sort::Str => SymExpr::not(SymExpr::eq(a, SymExpr::string(""))?),
    }
}

fn sym_loose_eq(a: SymExpr, b: SymExpr) -> SemanticsResult<SymExpr> {
    if a.sort() == b.sort() {
        return SymExpr::eq(a, b);
    }
    SymExpr::eq(sym_number(a), sym_number(b))
}

fn sym_strict_eq(a: SymExpr, b: SymExpr) -> SemanticsResult<SymExpr> {
    if a.sort() == b.sort() || (a.sort().is_numeric() && b.sort().is_numeric()) {
        return SymExpr::eq(a, b);
    }
    Ok(SymExpr::Bool(false))
}

fn sym_compare(op: SymBinaryOp, a: SymExpr, b: SymExpr) -> SemanticsResult<SymExpr> {
    if a.sort() == Sort::Str && b.sort() == Sort::Str {
        return SymExpr::compare(op, a, b);
    }
    if a.sort().is_numeric() && b.sort().is_numeric() {
        return SymExpr::compare(op, a, b);
    }
    SymExpr::compare(op, sym_number(a), sym_number(b))
}

fn compare(a: &Operand, b: &Operand, op: SymBinaryOp, accept: fn(Ordering) -> bool) -> SemanticsResult<Operand> {
    binary(
        a,
        b,
        |x, y| Ok(Value::Bool(ordering(x, y).is_some_and(accept))),
        |x, y| sym_compare(op, x, y),
    )
}

impl LanguageSemantics for JavaScriptSemantics {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn binary_add(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, add, sym_add)
    }

    fn binary_sub(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, |x, y| numeric(x, y, |p, q| p - q), |x, y| sym_arith(x, y, SymExpr::sub))
    }

    fn binary_mul(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, |x, y| numeric(x, y, |p, q| p * q), |x, y| sym_arith(x, y, SymExpr::mul))
    }

    /// Division by zero gives `Infinity` or `NaN`, never an error.
    fn binary_div(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, |x, y| numeric(x, y, |p, q| p / q), |x, y| {
            SymExpr::div(sym_number(x), sym_number(y))
        })
    }

    fn binary_floor_div(&self, _a: &Operand, _b: &Operand) -> SemanticsResult<Operand> {
        Err(self.unsupported("//"))
    }

    /// Remainder with the sign of the dividend.
    fn binary_mod(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, |x, y| numeric(x, y, |p, q| p % q), |x, y| {
            SymExpr::modulo(sym_number(x), sym_number(y), false)
        })
    }

    fn binary_pow(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, |x, y| numeric(x, y, f64::powf), |x, y| sym_arith(x, y, SymExpr::pow))
    }

    fn compare_eq(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, |x, y| Ok(Value::Bool(loose_equals(x, y))), sym_loose_eq)
    }

    fn compare_strict_eq(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, |x, y| Ok(Value::Bool(strict_equals(x, y))), sym_strict_eq)
    }

    fn compare_lt(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        compare(a, b, SymBinaryOp::Lt, Ordering::is_lt)
    }

    fn compare_le(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        compare(a, b, SymBinaryOp::Le, Ordering::is_le)
    }

    fn compare_gt(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        compare(a, b, SymBinaryOp::Gt, Ordering::is_gt)
    }

    fn compare_ge(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        compare(a, b, SymBinaryOp::Ge, Ordering::is_ge)
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
        unary(a, |v| Ok(number(-to_f64(v))), |e| SymExpr::neg(SymExpr::to_num(e)))
    }

    fn unary_pos(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(a, |v| Ok(number(to_f64(v))), |e| Ok(SymExpr::to_num(e)))
    }

    /// `~x` works on the 32-bit integer view of `x`.
    fn unary_invert(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(
            a,
            |v| Ok(Value::Int(i64::from(!to_int32(to_f64(v))))),
            |e| match e.sort() {
                Sort::Int => SymExpr::sub(SymExpr::neg(e)?, SymExpr::Int(1)),
                other => Err(type_error("~", other.name(), "")),
            },
        )
    }

    fn to_boolean(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(a, |v| Ok(Value::Bool(truthy(v))), sym_truthy)
    }

    fn to_string(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(a, |v| Ok(Value::Str(string_of(v))), sym_string)
    }

    fn to_number(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(a, |v| Ok(number(to_f64(v))), |e| Ok(SymExpr::to_num(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JS: JavaScriptSemantics = JavaScriptSemantics;

    fn c(v: impl Into<Value>) -> Operand {
        Operand::Concrete(v.into())
    }

    fn value(result: SemanticsResult<Operand>) -> Value {
        result.unwrap().into_concrete().unwrap()
    }

    #[test]
    fn plus_concatenates_when_either_side_is_text() {
        assert_eq!(value(JS.binary_add(&c("5"), &c(3))), Value::from("53"));
        assert_eq!(value(JS.binary_add(&c(3), &c("5"))), Value::from("35"));
        assert_eq!(value(JS.binary_add(&c(1), &c(true))), Value::Int(2));
        assert_eq!(value(JS.binary_add(&c(Value::Null), &c(1))), Value::Int(1));
    }

    #[test]
    fn other_arithmetic_coerces_text() {
        assert_eq!(value(JS.binary_sub(&c("5"), &c(3))), Value::Int(2));
        assert_eq!(value(JS.binary_mul(&c("2"), &c("4"))), Value::Int(8));
        assert!(value(JS.binary_sub(&c("abc"), &c(1))).is_nan());
    }

    #[test]
    fn division_by_zero_is_not_an_error() {
        assert_eq!(value(JS.binary_div(&c(1), &c(0))), Value::Float(f64::INFINITY));
        assert!(value(JS.binary_div(&c(0), &c(0))).is_nan());
        assert_eq!(value(JS.binary_div(&c(7), &c(2))), Value::Float(3.5));
        assert_eq!(value(JS.binary_div(&c(6), &c(2))), Value::Int(3));
    }

    #[test]
    fn modulo_follows_the_dividend() {
        assert_eq!(value(JS.binary_mod(&c(-7), &c(3))), Value::Int(-1));
        assert_eq!(value(JS.binary_mod(&c(7), &c(-3))), Value::Int(1));
    }

    #[test]
    fn floor_division_does_not_exist() {
        assert!(matches!(
            JS.binary_floor_div(&c(7), &c(2)),
            Err(SemanticsError::UnsupportedOperator { .. })
        ));
    }

    #[test]
    fn loose_and_strict_equality() {
        assert_eq!(value(JS.compare_eq(&c("5"), &c(5))), Value::Bool(true));
        assert_eq!(value(JS.compare_strict_eq(&c("5"), &c(5))), Value::Bool(false));
        assert_eq!(value(JS.compare_eq(&c(Value::Null), &c(Value::Undefined))), Value::Bool(true));
        assert_eq!(value(JS.compare_eq(&c(Value::Null), &c(0))), Value::Bool(false));
        assert_eq!(value(JS.compare_eq(&c(true), &c(1))), Value::Bool(true));
        assert_eq!(value(JS.compare_eq(&c(f64::NAN), &c(f64::NAN))), Value::Bool(false));
        assert_eq!(value(JS.compare_strict_eq(&c(1), &c(1.0))), Value::Bool(true));
    }

    #[test]
    fn falsy_set_excludes_empty_collections() {
        for falsy in [
            Value::Null,
            Value::Undefined,
            Value::Bool(false),
            Value::Int(0),
            Value::Float(-0.0),
            Value::nan(),
            Value::from(""),
        ] {
            assert_eq!(value(JS.to_boolean(&c(falsy.clone()))), Value::Bool(false), "{falsy:?}");
        }
        assert_eq!(value(JS.to_boolean(&c(Value::List(vec![])))), Value::Bool(true));
        assert_eq!(value(JS.to_boolean(&c(Value::Dict(vec![])))), Value::Bool(true));
        assert_eq!(value(JS.to_boolean(&c("0"))), Value::Bool(true));
    }

    #[test]
    fn number_to_string() {
        assert_eq!(number_string(1e21), "1e+21");
        assert_eq!(number_string(1e-7), "1e-7");
        assert_eq!(number_string(0.5), "0.5");
        assert_eq!(number_string(-0.0), "0");
        assert_eq!(value(JS.to_string(&c(Value::List(vec![Value::Int(1), Value::Null])))), Value::from("1,"));
    }

    #[test]
    fn string_to_number() {
        assert_eq!(value(JS.to_number(&c("  12  "))), Value::Int(12));
        assert_eq!(value(JS.to_number(&c(""))), Value::Int(0));
        assert_eq!(value(JS.to_number(&c("0x1F"))), Value::Int(31));
        assert!(value(JS.to_number(&c("inf"))).is_nan());
        assert_eq!(value(JS.to_number(&c(Value::List(vec![Value::Int(5)])))), Value::Int(5));
        assert_eq!(value(JS.to_number(&c(Value::List(vec![])))), Value::Int(0));
    }

    #[test]
    fn invert_uses_int32() {
        assert_eq!(value(JS.unary_invert(&c(5))), Value::Int(-6));
        assert_eq!(value(JS.unary_invert(&c(4_294_967_296.0))), Value::Int(-1));
    }

    #[test]
    fn symbolic_real_truthiness_excludes_nan() {
        let x = Operand::Symbolic(SymExpr::var("x", Sort::Real));
        let t = JS.to_boolean(&x).unwrap();
        assert_eq!(t.as_symbolic().unwrap().to_string(), "(and (not (= x 0.0)) (= x x))");
    }

    #[test]
    fn symbolic_plus_with_text_concatenates() {
        let s = Operand::Symbolic(SymExpr::var("s", Sort::Str));
        let result = JS.binary_add(&s, &c(1)).unwrap();
        assert_eq!(result.as_symbolic().unwrap().sort(), Sort::Str);
    }
}
