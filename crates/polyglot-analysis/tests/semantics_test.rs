//! Operator semantics through the public lookup: the same IR operator
//! diverges per language, and folding follows the language a tree was
//! normalized from.

use polyglot_analysis::ir::visit::find_all;
use polyglot_analysis::ir::{BinaryOperator, Node, NodeKind};
use polyglot_analysis::semantics::{fold_expr, semantics_for, Operand, Sort, SymExpr, Value};
use polyglot_analysis::{normalizer_for, semantics_for_node, Language, LanguageSemantics};
use polyglot_core::errors::{PolyglotErrorCode, SemanticsError};
use proptest::prelude::*;

fn concrete(v: impl Into<Value>) -> Operand {
    Operand::Concrete(v.into())
}

fn eval(tag: &str, op: BinaryOperator, a: impl Into<Value>, b: impl Into<Value>) -> Result<Value, SemanticsError> {
    let semantics = semantics_for(tag).unwrap();
    let result = semantics.apply_binary(op, &concrete(a), &concrete(b))?;
    Ok(result.into_concrete().expect("concrete operands give a concrete result"))
}

fn truthy(tag: &str, v: impl Into<Value>) -> bool {
    let semantics = semantics_for(tag).unwrap();
    match semantics.to_boolean(&concrete(v)).unwrap() {
        Operand::Concrete(Value::Bool(b)) => b,
        other => panic!("{tag}: truthiness gave {other:?}"),
    }
}

/// The value of the first assignment anywhere in a small program.
fn assigned(language: Language, source: &str) -> Node {
    let module = normalizer_for(language).normalize(source, "inline").unwrap();
    let assignments = find_all(&module, |n| matches!(n.kind, NodeKind::Assign { .. }));
    match assignments.first().map(|n| &n.kind) {
        Some(NodeKind::Assign { value, .. }) => (**value).clone(),
        _ => panic!("no assignment in {source:?}: {:?}", module.body),
    }
}

// ---- Divergence ----

#[test]
fn string_plus_number() {
    let err = eval("python", BinaryOperator::Add, "5", 3).unwrap_err();
    assert!(matches!(err, SemanticsError::TypeError { .. }));
    assert_eq!(err.error_code(), "TYPE_ERROR");

    assert_eq!(eval("javascript", BinaryOperator::Add, "5", 3).unwrap(), Value::from("53"));
    assert_eq!(eval("java", BinaryOperator::Add, "5", 3).unwrap(), Value::from("53"));
}

#[test]
fn modulo_sign() {
    assert_eq!(eval("python", BinaryOperator::Mod, -7, 3).unwrap(), Value::Int(2));
    assert_eq!(eval("javascript", BinaryOperator::Mod, -7, 3).unwrap(), Value::Int(-1));
    assert_eq!(eval("java", BinaryOperator::Mod, -7, 3).unwrap(), Value::Int(-1));
}

#[test]
fn division_by_zero() {
    assert!(matches!(
        eval("python", BinaryOperator::Div, 1, 0),
        Err(SemanticsError::ZeroDivision { .. })
    ));
    assert!(matches!(
        eval("java", BinaryOperator::Div, 1, 0),
        Err(SemanticsError::ZeroDivision { .. })
    ));
    assert_eq!(
        eval("java", BinaryOperator::Div, 1.0, 0).unwrap(),
        Value::Float(f64::INFINITY)
    );
    assert_eq!(
        eval("javascript", BinaryOperator::Div, 1, 0).unwrap(),
        Value::Float(f64::INFINITY)
    );
    assert!(eval("javascript", BinaryOperator::Mod, 1, 0).unwrap().is_nan());
}

#[test]
fn oversized_repetition_is_a_value_error() {
    let err = eval("python", BinaryOperator::Mul, "ab", i64::MAX).unwrap_err();
    assert!(matches!(err, SemanticsError::ValueError { .. }));
    assert_eq!(err.error_code(), "VALUE_ERROR");

    let items = Value::List(vec![Value::Int(0), Value::Int(1)]);
    assert!(matches!(
        eval("python", BinaryOperator::Mul, i64::MAX / 2 + 1, items.clone()),
        Err(SemanticsError::ValueError { .. })
    ));

    assert_eq!(eval("python", BinaryOperator::Mul, "ab", 3).unwrap(), Value::from("ababab"));
    assert_eq!(eval("python", BinaryOperator::Mul, items, -1).unwrap(), Value::List(vec![]));
    assert_eq!(eval("python", BinaryOperator::Mul, "", i64::MAX).unwrap(), Value::from(""));

    let folded = assigned(Language::Python, "x = \"ab\" * 9223372036854775807\n");
    assert!(matches!(fold_expr(&folded), Err(SemanticsError::ValueError { .. })));
}

#[test]
fn true_division() {
    assert_eq!(eval("python", BinaryOperator::Div, 7, 2).unwrap(), Value::Float(3.5));
    assert_eq!(eval("javascript", BinaryOperator::Div, 7, 2).unwrap(), Value::Float(3.5));
    assert_eq!(eval("java", BinaryOperator::Div, 7, 2).unwrap(), Value::Int(3));
    assert_eq!(eval("java", BinaryOperator::Div, -7, 2).unwrap(), Value::Int(-3));
}

#[test]
fn floor_division_is_python_only() {
    assert_eq!(eval("python", BinaryOperator::FloorDiv, -7, 2).unwrap(), Value::Int(-4));
    for tag in ["javascript", "java"] {
        assert!(matches!(
            eval(tag, BinaryOperator::FloorDiv, 7, 2),
            Err(SemanticsError::UnsupportedOperator { .. })
        ));
    }
}

#[test]
fn truthiness_of_empty_list_and_nan() {
    assert!(!truthy("python", Value::List(vec![])));
    assert!(truthy("javascript", Value::List(vec![])));

    assert!(truthy("python", Value::nan()));
    assert!(!truthy("javascript", Value::nan()));

    assert!(!truthy("python", ""));
    assert!(!truthy("javascript", ""));
    assert!(truthy("javascript", "0"));
}

#[test]
fn java_truthiness_is_boolean_only() {
    let java = semantics_for("java").unwrap();
    assert!(matches!(
        java.to_boolean(&concrete(1)),
        Err(SemanticsError::TypeError { .. })
    ));
    assert_eq!(java.to_boolean(&concrete(true)).unwrap(), concrete(true));
}

#[test]
fn loose_and_strict_equality() {
    let js = semantics_for("javascript").unwrap();
    assert_eq!(js.compare_eq(&concrete("1"), &concrete(1)).unwrap(), concrete(true));
    assert_eq!(js.compare_strict_eq(&concrete("1"), &concrete(1)).unwrap(), concrete(false));
    assert_eq!(
        js.compare_eq(&concrete(Value::Null), &concrete(Value::Undefined)).unwrap(),
        concrete(true)
    );

    let py = semantics_for("python").unwrap();
    assert_eq!(py.compare_eq(&concrete("1"), &concrete(1)).unwrap(), concrete(false));
    assert_eq!(py.compare_eq(&concrete(1), &concrete(1.0)).unwrap(), concrete(true));
}

#[test]
fn unknown_tag_is_an_error() {
    let err = semantics_for("cobol").err().expect("no semantics for cobol");
    assert!(matches!(err, SemanticsError::UnknownLanguage { ref language } if language == "cobol"));
}

// ---- Symbolic operands ----

#[test]
fn symbolic_operands_build_expressions() {
    let x = Operand::Symbolic(SymExpr::var("x", Sort::Int));

    let py = semantics_for("python").unwrap();
    let sum = py.binary_add(&x, &concrete(1)).unwrap();
    let expr = sum.as_symbolic().expect("symbolic in, symbolic out");
    assert_eq!(expr.sort(), Sort::Int);
    assert_eq!(expr.to_string(), "(+ x 1)");

    let js = semantics_for("javascript").unwrap();
    let joined = js.binary_add(&concrete("n="), &x).unwrap();
    assert_eq!(joined.as_symbolic().map(SymExpr::sort), Some(Sort::Str));
}

#[test]
fn symbolic_string_plus_int_is_a_python_type_error() {
    let s = Operand::Symbolic(SymExpr::var("s", Sort::Str));
    let py = semantics_for("python").unwrap();
    assert!(matches!(
        py.binary_add(&s, &concrete(1)),
        Err(SemanticsError::TypeError { .. })
    ));
}

#[test]
fn symbolic_truthiness_is_boolean_sorted() {
    let x = Operand::Symbolic(SymExpr::var("x", Sort::Real));
    for tag in ["python", "javascript"] {
        let result = semantics_for(tag).unwrap().to_boolean(&x).unwrap();
        assert_eq!(result.as_symbolic().map(SymExpr::sort), Some(Sort::Bool), "{tag}");
    }
}

#[test]
fn collections_do_not_mix_with_symbols() {
    let x = Operand::Symbolic(SymExpr::var("x", Sort::Int));
    let py = semantics_for("python").unwrap();
    assert!(py.binary_add(&x, &concrete(Value::List(vec![]))).is_err());
}

// ---- Folding normalized trees ----

#[test]
fn folding_follows_the_source_language() {
    let js = assigned(Language::JavaScript, "let x = '5' + 3;\n");
    assert_eq!(semantics_for_node(&js).language(), Language::JavaScript);
    assert_eq!(fold_expr(&js).unwrap(), Some(Value::from("53")));

    let py = assigned(Language::Python, "x = '5' + 3\n");
    assert!(matches!(fold_expr(&py), Err(SemanticsError::TypeError { .. })));

    let java = assigned(Language::Java, "class A { void f() { String x = \"5\" + 3; } }\n");
    assert_eq!(fold_expr(&java).unwrap(), Some(Value::from("53")));
}

#[test]
fn folding_negative_modulo() {
    let py = assigned(Language::Python, "x = -7 % 3\n");
    assert_eq!(fold_expr(&py).unwrap(), Some(Value::Int(2)));

    let js = assigned(Language::JavaScript, "const x = -7 % 3;\n");
    assert_eq!(fold_expr(&js).unwrap(), Some(Value::Int(-1)));
}

#[test]
fn folding_stops_at_names() {
    let py = assigned(Language::Python, "x = y + 1\n");
    assert_eq!(fold_expr(&py).unwrap(), None);

    let js = assigned(Language::JavaScript, "let x = 0 && y;\n");
    assert_eq!(fold_expr(&js).unwrap(), Some(Value::Int(0)));
}

#[test]
fn folding_gives_up_on_a_name_before_a_bad_right_side() {
    let py = assigned(Language::Python, "z = x + ('5' + 3)\n");
    assert_eq!(fold_expr(&py).unwrap(), None);

    let java = assigned(Language::Java, "class A { void f() { int z = x + (1 / 0); } }\n");
    assert_eq!(fold_expr(&java).unwrap(), None);
}

#[test]
fn folding_ternaries() {
    let py = assigned(Language::Python, "x = 'yes' if [] else 'no'\n");
    assert_eq!(fold_expr(&py).unwrap(), Some(Value::from("no")));

    let js = assigned(Language::JavaScript, "let x = [] ? 'yes' : 'no';\n");
    assert_eq!(fold_expr(&js).unwrap(), Some(Value::from("yes")));
}

// ---- Properties ----

proptest! {
    #[test]
    fn python_modulo_follows_divisor_sign(a in -1_000_000i64..1_000_000, b in -1_000i64..1_000) {
        prop_assume!(b != 0);
        let Value::Int(r) = eval("python", BinaryOperator::Mod, a, b).unwrap() else {
            panic!("int % int is an int");
        };
        prop_assert!(r == 0 || r.signum() == b.signum());
        prop_assert!(r.abs() < b.abs());
    }

    #[test]
    fn dividend_sign_modulo(a in -1_000_000i64..1_000_000, b in -1_000i64..1_000) {
        prop_assume!(b != 0);
        for tag in ["javascript", "java"] {
            // JavaScript keeps a negative zero as a float.
            let r = eval(tag, BinaryOperator::Mod, a, b).unwrap().as_f64().expect("numeric remainder");
            prop_assert!(r == 0.0 || r.signum() == a.signum() as f64, "{}: {} % {} = {}", tag, a, b, r);
            prop_assert_eq!(r, (a % b) as f64);
        }
    }

    #[test]
    fn python_floor_division_identity(a in -1_000_000i64..1_000_000, b in -1_000i64..1_000) {
        prop_assume!(b != 0);
        let Value::Int(q) = eval("python", BinaryOperator::FloorDiv, a, b).unwrap() else {
            panic!("int // int is an int");
        };
        let Value::Int(r) = eval("python", BinaryOperator::Mod, a, b).unwrap() else {
            panic!("int % int is an int");
        };
        prop_assert_eq!(a, b * q + r);
    }

    #[test]
    fn javascript_number_truthiness(f in any::<f64>()) {
        prop_assert_eq!(truthy("javascript", f), f != 0.0 && !f.is_nan());
    }

    #[test]
    fn python_int_truthiness(i in any::<i64>()) {
        prop_assert_eq!(truthy("python", i), i != 0);
    }

    #[test]
    fn javascript_concatenation_keeps_both_sides(s in "[a-z]{0,8}", i in -1_000i64..1_000) {
        let Value::Str(joined) = eval("javascript", BinaryOperator::Add, s.as_str(), i).unwrap() else {
            panic!("string + number is a string");
        };
        prop_assert_eq!(joined, format!("{s}{i}"));
    }
}
