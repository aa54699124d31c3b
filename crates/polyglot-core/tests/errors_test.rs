//! Tests for the polyglot error handling system.

use std::collections::HashSet;
use std::path::PathBuf;

use polyglot_core::errors::error_code::PolyglotErrorCode;
use polyglot_core::errors::*;

#[test]
fn test_all_errors_have_error_code() {
    let parse = ParseError::NoTree {
        path: PathBuf::from("a.java"),
    };
    assert!(!parse.error_code().is_empty());

    let normalize = NormalizeError::UnsupportedConstruct {
        language: "python".into(),
        kind: "With".into(),
        line: 1,
        column: 0,
    };
    assert!(!normalize.error_code().is_empty());

    let semantics = SemanticsError::UnknownLanguage {
        language: "cobol".into(),
    };
    assert!(!semantics.error_code().is_empty());

    let config = ConfigError::FileNotFound {
        path: "/tmp".into(),
    };
    assert!(!config.error_code().is_empty());
}

#[test]
fn test_parse_error_converts_into_normalize_error() {
    let parse = ParseError::Syntax {
        path: PathBuf::from("m.py"),
        line: 3,
        column: 4,
        message: "invalid syntax".into(),
        text: "def (:".into(),
    };
    let err: NormalizeError = parse.into();
    assert!(matches!(err, NormalizeError::Parse(ParseError::Syntax { line: 3, .. })));
    // The wrapped error keeps its own code.
    assert_eq!(err.error_code(), error_code::SYNTAX_ERROR);
}

#[test]
fn test_unsupported_construct_names_the_kind() {
    let err = NormalizeError::UnsupportedConstruct {
        language: "java".into(),
        kind: "labeled_statement".into(),
        line: 12,
        column: 8,
    };
    assert_eq!(err.unsupported_kind(), Some("labeled_statement"));
    let message = err.to_string();
    assert!(message.contains("labeled_statement"), "message: {message}");
    assert!(message.contains("12:8"), "message: {message}");
    assert_eq!(err.error_code(), error_code::UNSUPPORTED_CONSTRUCT);

    let other = NormalizeError::LanguageDisabled {
        language: "java".into(),
    };
    assert_eq!(other.unsupported_kind(), None);
}

#[test]
fn test_coded_string_format() {
    let err = SemanticsError::ZeroDivision {
        language: "python".into(),
        operation: "%".into(),
    };
    let coded = err.coded_string();
    assert!(coded.starts_with("[ZERO_DIVISION] "), "got: {coded}");
}

#[test]
fn test_semantic_error_codes_are_distinct() {
    let errors = [
        SemanticsError::TypeError {
            language: "python".into(),
            operation: "+".into(),
            left: "str".into(),
            right: "int".into(),
        },
        SemanticsError::ValueError {
            language: "python".into(),
            message: "bad".into(),
        },
        SemanticsError::ZeroDivision {
            language: "python".into(),
            operation: "/".into(),
        },
        SemanticsError::UnsupportedOperator {
            language: "javascript".into(),
            operator: "@".into(),
        },
        SemanticsError::Symbolic {
            operation: "+".into(),
            message: "list operand".into(),
        },
    ];
    let codes: HashSet<&str> = errors.iter().map(|e| e.error_code()).collect();
    assert_eq!(codes.len(), errors.len());
}
