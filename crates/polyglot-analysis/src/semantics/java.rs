//! Java operator semantics.
//!
//! Static typing shows through as `TypeError`s: booleans are not numbers,
//! conditions must be `boolean`, and `==` between unrelated types does not
//! compile. `Int` models `long` arithmetic, which wraps on overflow.

use std::cmp::Ordering;

use super::symbolic::{Sort, SymBinaryOp, SymExpr};
use super::value::{Operand, Value};
use super::{binary, unary, LanguageSemantics, SemanticsError, SemanticsResult};
use crate::language::Language;

const LANGUAGE: &str = "java";

#[derive(Debug, Default, Clone, Copy)]
pub struct JavaSemantics;

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null | Value::Undefined => "null",
        Value::Bool(_) => "boolean",
        Value::Int(_) => "long",
        Value::Float(_) => "double",
        Value::Str(_) => "String",
        Value::List(_) | Value::Tuple(_) | Value::Set(_) => "array",
        Value::Dict(_) => "Object",
    }
}

fn sort_name(sort: Sort) -> &'static str {
    match sort {
        Sort::Bool => "boolean",
        Sort::Int => "long",
        Sort::Real => "double",
        Sort::Str => "String",
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

fn zero_division(operation: &str) -> SemanticsError {
    SemanticsError::ZeroDivision {
        language: LANGUAGE.to_string(),
        operation: operation.to_string(),
    }
}

/// `Double.toString`: plain between 1e-3 and 1e7, `d.dddE±n` outside.
fn double_string(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = f.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let plain = format!("{f}");
        return if plain.contains('.') { plain } else { format!("{plain}.0") };
    }
    let scientific = format!("{f:e}");
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => format!("{mantissa}E{exponent}"),
        Some((mantissa, exponent)) => format!("{mantissa}.0E{exponent}"),
        None => scientific,
    }
}

fn string_of(value: &Value) -> String {
    match value {
        Value::Null | Value::Undefined => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => double_string(*f),
        Value::Str(s) => s.clone(),
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
            format!("[{}]", items.iter().map(string_of).collect::<Vec<_>>().join(", "))
        }
        Value::Dict(entries) => {
            let body: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}={}", string_of(k), string_of(v)))
                .collect();
            format!("{{{}}}", body.join(", "))
        }
    }
}

/// Binary numeric promotion: `long` op `long` stays integral, anything with
/// a `double` is computed in `double`.
fn arithmetic(
    operation: &str,
    a: &Value,
    b: &Value,
    long_op: impl FnOnce(i64, i64) -> SemanticsResult<i64>,
    double_op: impl FnOnce(f64, f64) -> f64,
) -> SemanticsResult<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => long_op(*x, *y).map(Value::Int),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let (x, y) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
            Ok(Value::Float(double_op(x, y)))
        }
        _ => Err(operand_error(operation, a, b)),
    }
}

fn add(a: &Value, b: &Value) -> SemanticsResult<Value> {
    if a.is_string() || b.is_string() {
        return Ok(Value::Str(format!("{}{}", string_of(a), string_of(b))));
    }
    arithmetic("+", a, b, |x, y| Ok(x.wrapping_add(y)), |x, y| x + y)
}

fn divide(operation: &str, a: &Value, b: &Value, rem: bool) -> SemanticsResult<Value> {
    arithmetic(
        operation,
        a,
        b,
        |x, y| {
            if y == 0 {
                return Err(zero_division(operation));
            }
            Ok(if rem { x.wrapping_rem(y) } else { x.wrapping_div(y) })
        },
        |x, y| if rem { x % y } else { x / y },
    )
}

fn is_reference(value: &Value) -> bool {
    matches!(value, Value::Str(_) | Value::List(_) | Value::Tuple(_) | Value::Dict(_) | Value::Set(_))
}

/// `==` as `javac` accepts it. Strings and arrays compare by content here;
/// reference identity is not modelled.
fn equals(a: &Value, b: &Value) -> SemanticsResult<bool> {
    match (a, b) {
        (Value::Null | Value::Undefined, Value::Null | Value::Undefined) => Ok(true),
        (Value::Null | Value::Undefined, other) | (other, Value::Null | Value::Undefined) if is_reference(other) => {
            Ok(false)
        }
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::Int(x), Value::Int(y)) => Ok(x == y),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => Ok(a.as_f64() == b.as_f64()),
        (Value::Str(x), Value::Str(y)) => Ok(x == y),
        (x, y) if x.is_collection() && y.is_collection() => Ok(x == y),
        _ => Err(operand_error("==", a, b)),
    }
}

fn numeric_compare(operation: &str, a: &Value, b: &Value, accept: fn(Ordering) -> bool) -> SemanticsResult<Value> {
    let ordering = match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => a.as_f64().partial_cmp(&b.as_f64()),
        _ => return Err(operand_error(operation, a, b)),
    };
    Ok(Value::Bool(ordering.is_some_and(accept)))
}

fn boolean(operation: &str, value: &Value) -> SemanticsResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(type_error(operation, type_name(other), "boolean")),
    }
}

fn parse_number(text: &str) -> SemanticsResult<Value> {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(Value::Int(i));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|_| !trimmed.chars().any(|c| matches!(c, 'i' | 'n' | 'I' | 'N')) || is_special(trimmed))
        .map(Value::Float)
        .ok_or_else(|| SemanticsError::ValueError {
            language: LANGUAGE.to_string(),
            message: format!("NumberFormatException: For input string: \"{text}\""),
        })
}

/// `Double.parseDouble` spells these exactly.
fn is_special(text: &str) -> bool {
    matches!(text.trim_start_matches(['+', '-']), "NaN" | "Infinity")
}

// ---- Symbolic ----

fn sym_numeric(operation: &str, a: &SymExpr, b: &SymExpr) -> SemanticsResult<()> {
    if a.sort().is_numeric() && b.sort().is_numeric() {
        Ok(())
    } else {
        Err(sym_error(operation, a, b))
    }
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
    sym_numeric("+", &a, &b)?;
    SymExpr::add(a, b)
}

/// Integer `/` truncates; with a `double` operand it is real division.
fn sym_divide(operation: &str, a: SymExpr, b: SymExpr, rem: bool) -> SemanticsResult<SymExpr> {
    sym_numeric(operation, &a, &b)?;
    let integral = a.sort() == Sort::Int && b.sort() == Sort::Int;
    match (integral, rem) {
        (true, false) => Ok(SymExpr::trunc(SymExpr::div(a, b)?)),
        (true, true) => SymExpr::modulo(a, b, false),
        (false, false) => SymExpr::div(a, b),
        (false, true) => SymExpr::modulo(a.to_real(), b.to_real(), false),
    }
}

fn sym_eq(a: SymExpr, b: SymExpr) -> SemanticsResult<SymExpr> {
    let comparable = a.sort() == b.sort() || (a.sort().is_numeric() && b.sort().is_numeric());
    if !comparable {
        return Err(sym_error("==", &a, &b));
    }
    SymExpr::eq(a, b)
}

fn sym_compare(operation: &str, op: SymBinaryOp, a: SymExpr, b: SymExpr) -> SemanticsResult<SymExpr> {
    sym_numeric(operation, &a, &b)?;
    SymExpr::compare(op, a, b)
}

fn sym_boolean(operation: &str, a: &SymExpr) -> SemanticsResult<()> {
    if a.sort() == Sort::Bool {
        Ok(())
    } else {
        Err(type_error(operation, sort_name(a.sort()), "boolean"))
    }
}

impl JavaSemantics {
    fn compare(
        &self,
        a: &Operand,
        b: &Operand,
        operation: &str,
        op: SymBinaryOp,
        accept: fn(Ordering) -> bool,
    ) -> SemanticsResult<Operand> {
        binary(
            a,
            b,
            |x, y| numeric_compare(operation, x, y, accept),
            |x, y| sym_compare(operation, op, x, y),
        )
    }

    /// `&&`/`||` on `boolean` operands only.
    fn connective(&self, a: &Operand, b: &Operand, and: bool) -> SemanticsResult<Operand> {
        let operation = if and { "&&" } else { "||" };
        binary(
            a,
            b,
            |x, y| {
                let left = boolean(operation, x)?;
                // The right operand is still type-checked when it is not evaluated.
                let right = boolean(operation, y)?;
                Ok(Value::Bool(if and { left && right } else { left || right }))
            },
            |x, y| {
                sym_boolean(operation, &x)?;
                sym_boolean(operation, &y)?;
                if and {
                    SymExpr::and(x, y)
                } else {
                    SymExpr::or(x, y)
                }
            },
        )
    }
}

impl LanguageSemantics for JavaSemantics {
    fn language(&self) -> Language {
        Language::Java
    }

    fn binary_add(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, add, sym_add)
    }

    fn binary_sub(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(
            a,
            b,
            |x, y| arithmetic("-", x, y, |p, q| Ok(p.wrapping_sub(q)), |p, q| p - q),
            |x, y| {
                sym_numeric("-", &x, &y)?;
                SymExpr::sub(x, y)
            },
        )
    }

    fn binary_mul(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(
            a,
            b,
            |x, y| arithmetic("*", x, y, |p, q| Ok(p.wrapping_mul(q)), |p, q| p * q),
            |x, y| {
                sym_numeric("*", &x, &y)?;
                SymExpr::mul(x, y)
            },
        )
    }

    fn binary_div(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, |x, y| divide("/", x, y, false), |x, y| sym_divide("/", x, y, false))
    }

    fn binary_floor_div(&self, _a: &Operand, _b: &Operand) -> SemanticsResult<Operand> {
        Err(self.unsupported("//"))
    }

    fn binary_mod(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, |x, y| divide("%", x, y, true), |x, y| sym_divide("%", x, y, true))
    }

    fn binary_pow(&self, _a: &Operand, _b: &Operand) -> SemanticsResult<Operand> {
        Err(self.unsupported("**"))
    }

    fn compare_eq(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        binary(a, b, |x, y| equals(x, y).map(Value::Bool), sym_eq)
    }

    fn compare_strict_eq(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        self.compare_eq(a, b)
    }

    fn compare_lt(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        self.compare(a, b, "<", SymBinaryOp::Lt, Ordering::is_lt)
    }

    fn compare_le(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        self.compare(a, b, "<=", SymBinaryOp::Le, Ordering::is_le)
    }

    fn compare_gt(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        self.compare(a, b, ">", SymBinaryOp::Gt, Ordering::is_gt)
    }

    fn compare_ge(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        self.compare(a, b, ">=", SymBinaryOp::Ge, Ordering::is_ge)
    }

    fn bool_and(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        self.connective(a, b, true)
    }

    fn bool_or(&self, a: &Operand, b: &Operand) -> SemanticsResult<Operand> {
        self.connective(a, b, false)
    }

    fn bool_not(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(
            a,
            |v| boolean("!", v).map(|b| Value::Bool(!b)),
            |e| {
                sym_boolean("!", &e)?;
                SymExpr::not(e)
            },
        )
    }

    fn unary_neg(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(
            a,
            |v| match v {
                Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(type_error("unary -", type_name(other), "")),
            },
            |e| {
                if e.sort().is_numeric() {
                    SymExpr::neg(e)
                } else {
                    Err(type_error("unary -", sort_name(e.sort()), ""))
                }
            },
        )
    }

    fn unary_pos(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(
            a,
            |v| match v {
                Value::Int(_) | Value::Float(_) => Ok(v.clone()),
                other => Err(type_error("unary +", type_name(other), "")),
            },
            |e| {
                if e.sort().is_numeric() {
                    Ok(e)
                } else {
                    Err(type_error("unary +", sort_name(e.sort()), ""))
                }
            },
        )
    }

    fn unary_invert(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(
            a,
            |v| match v {
                Value::Int(i) => Ok(Value::Int(!i)),
                other => Err(type_error("~", type_name(other), "")),
            },
            |e| match e.sort() {
                Sort::Int => SymExpr::sub(SymExpr::neg(e)?, SymExpr::Int(1)),
                other => Err(type_error("~", sort_name(other), "")),
            },
        )
    }

    /// Conditions must already be `boolean`.
    fn to_boolean(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(
            a,
            |v| boolean("condition", v).map(Value::Bool),
            |e| {
                sym_boolean("condition", &e)?;
                Ok(e)
            },
        )
    }

    fn to_string(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(a, |v| Ok(Value::Str(string_of(v))), sym_string)
    }

    fn to_number(&self, a: &Operand) -> SemanticsResult<Operand> {
        unary(
            a,
            |v| match v {
                Value::Int(_) | Value::Float(_) => Ok(v.clone()),
                Value::Str(s) => parse_number(s),
                other => Err(type_error("to_number", type_name(other), "")),
            },
            |e| match e.sort() {
                Sort::Bool => Err(type_error("to_number", "boolean", "")),
                _ => Ok(SymExpr::to_num(e)),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAVA: JavaSemantics = JavaSemantics;

    fn c(v: impl Into<Value>) -> Operand {
        Operand::Concrete(v.into())
    }

    fn value(result: SemanticsResult<Operand>) -> Value {
        result.unwrap().into_concrete().unwrap()
    }

    #[test]
    fn string_concatenation_stringifies_the_other_side() {
        assert_eq!(value(JAVA.binary_add(&c("5"), &c(3))), Value::from("53"));
        assert_eq!(value(JAVA.binary_add(&c("x"), &c(1.0))), Value::from("x1.0"));
        assert_eq!(value(JAVA.binary_add(&c("b"), &c(true))), Value::from("btrue"));
        assert_eq!(value(JAVA.binary_add(&c("n"), &c(Value::Null))), Value::from("nnull"));
    }

    #[test]
    fn boolean_arithmetic_does_not_compile() {
        assert!(matches!(
            JAVA.binary_add(&c(true), &c(1)),
            Err(SemanticsError::TypeError { .. })
        ));
    }

    #[test]
    fn integer_division_truncates() {
        assert_eq!(value(JAVA.binary_div(&c(7), &c(2))), Value::Int(3));
        assert_eq!(value(JAVA.binary_div(&c(-7), &c(2))), Value::Int(-3));
        assert_eq!(value(JAVA.binary_div(&c(7.0), &c(2))), Value::Float(3.5));
        assert_eq!(value(JAVA.binary_mod(&c(-7), &c(3))), Value::Int(-1));
    }

    #[test]
    fn integer_division_by_zero_throws_but_doubles_do_not() {
        assert!(matches!(
            JAVA.binary_div(&c(1), &c(0)),
            Err(SemanticsError::ZeroDivision { .. })
        ));
        assert!(matches!(
            JAVA.binary_mod(&c(1), &c(0)),
            Err(SemanticsError::ZeroDivision { .. })
        ));
        assert_eq!(value(JAVA.binary_div(&c(1.0), &c(0))), Value::Float(f64::INFINITY));
    }

    #[test]
    fn long_arithmetic_wraps() {
        assert_eq!(value(JAVA.binary_add(&c(i64::MAX), &c(1))), Value::Int(i64::MIN));
        assert_eq!(value(JAVA.binary_div(&c(i64::MIN), &c(-1))), Value::Int(i64::MIN));
    }

    #[test]
    fn missing_operators_are_unsupported() {
        for result in [JAVA.binary_floor_div(&c(1), &c(2)), JAVA.binary_pow(&c(1), &c(2))] {
            assert!(matches!(result, Err(SemanticsError::UnsupportedOperator { .. })));
        }
    }

    #[test]
    fn equality_between_unrelated_types_is_rejected() {
        assert!(JAVA.compare_eq(&c("5"), &c(5)).is_err());
        assert_eq!(value(JAVA.compare_eq(&c(1), &c(1.0))), Value::Bool(true));
        assert_eq!(value(JAVA.compare_eq(&c(Value::Null), &c("s"))), Value::Bool(false));
    }

    #[test]
    fn conditions_must_be_boolean() {
        assert!(JAVA.to_boolean(&c(1)).is_err());
        assert!(JAVA.bool_and(&c(1), &c(true)).is_err());
        assert!(JAVA.bool_not(&c("")).is_err());
        assert_eq!(value(JAVA.bool_and(&c(false), &c(true))), Value::Bool(false));
    }

    #[test]
    fn double_to_string() {
        assert_eq!(double_string(1.0), "1.0");
        assert_eq!(double_string(1e10), "1.0E10");
        assert_eq!(double_string(1.5e-5), "1.5E-5");
        assert_eq!(double_string(0.001), "0.001");
    }

    #[test]
    fn number_parsing() {
        assert_eq!(value(JAVA.to_number(&c("42"))), Value::Int(42));
        assert!(matches!(
            JAVA.to_number(&c("4x")),
            Err(SemanticsError::ValueError { .. })
        ));
        assert!(matches!(
            JAVA.to_number(&c("inf")),
            Err(SemanticsError::ValueError { .. })
        ));
        assert!(JAVA.to_number(&c(true)).is_err());
    }

    #[test]
    fn symbolic_integer_division_truncates() {
        let x = Operand::Symbolic(SymExpr::var("x", Sort::Int));
        let q = JAVA.binary_div(&x, &c(2)).unwrap();
        let q = q.as_symbolic().unwrap();
        assert_eq!(q.sort(), Sort::Int);
        assert!(q.to_string().starts_with("(trunc"));
    }

    #[test]
    fn symbolic_condition_must_be_boolean() {
        let x = Operand::Symbolic(SymExpr::var("x", Sort::Int));
        assert!(JAVA.to_boolean(&x).is_err());
        let p = Operand::Symbolic(SymExpr::var("p", Sort::Bool));
        assert_eq!(JAVA.to_boolean(&p).unwrap(), p);
    }
}
