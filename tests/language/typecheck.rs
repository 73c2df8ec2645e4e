//! Integration tests for the type checker

use lexsat_foundation::{Arity, ErrorKind, Expected, Type};
use lexsat_language::{
    ConstraintProblem, ConstraintSpec, VariableDeclaration, analyze, parse_expr,
};
use serde_json::{Value as Json, json};

fn declarations() -> Vec<VariableDeclaration> {
    vec![
        VariableDeclaration::new("CAR", Type::Real),
        VariableDeclaration::new("employees", Type::Int),
        VariableDeclaration::new("certified", Type::Bool),
    ]
}

fn analyze_rules(rules: Vec<(&str, Json)>) -> lexsat_foundation::Result<lexsat_language::Analysis> {
    let rules = rules
        .into_iter()
        .map(|(id, expr)| ConstraintSpec::new(id, parse_expr(&expr).unwrap()))
        .collect();
    let problem = ConstraintProblem::new(declarations(), vec![], rules)?;
    analyze(&problem)
}

fn rule_type(expr: Json) -> Type {
    let analysis = analyze_rules(vec![("t:rank", expr)]).unwrap();
    analysis.rules[0].ty
}

#[test]
fn case_rules_take_their_value_type() {
    assert_eq!(
        rule_type(json!(["CASE", ["LT", "CAR", 100], 2, ["LT", "CAR", 150], 1, 0])),
        Type::Int
    );
    assert_eq!(
        rule_type(json!(["CASE", "certified", ["MUL", "CAR", 2], 0])),
        Type::Real
    );
    assert_eq!(rule_type(json!(["CASE", "certified", true, false])), Type::Bool);
}

#[test]
fn rule_typed_rule_references() {
    let analysis = analyze_rules(vec![
        ("t:rank", json!(["CASE", "certified", 2, 0])),
        ("t:ranked_high", json!(["GE", "t:rank", 1])),
    ])
    .unwrap();
    assert_eq!(analysis.rules[0].ty, Type::Int);
    assert_eq!(analysis.rules[1].ty, Type::Bool);
}

#[test]
fn non_case_rules_must_be_boolean() {
    let err = analyze_rules(vec![("t:sum", json!(["ADD", "CAR", 1]))]).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::TypeMismatch {
            expected: Expected::Type(Type::Bool),
            actual: Type::Real,
            ..
        }
    ));
}

#[test]
fn stringly_typed_classification_is_rejected() {
    let err = analyze_rules(vec![(
        "t:class",
        json!(["CASE", "certified", "adequate", "inadequate"]),
    )])
    .unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::TypeMismatch {
            actual: Type::Str,
            ..
        }
    ));
    assert_eq!(err.context.and_then(|c| c.rule).as_deref(), Some("t:class"));
}

#[test]
fn logical_operands_must_be_boolean() {
    let err = analyze_rules(vec![("t:bad", json!(["AND", "certified", "CAR"]))]).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::TypeMismatch {
            expected: Expected::Type(Type::Bool),
            actual: Type::Real,
            ..
        }
    ));
}

#[test]
fn equality_does_not_mix_bool_and_numbers() {
    assert_eq!(rule_type(json!(["EQ", "employees", 2.5])), Type::Bool);
    assert_eq!(rule_type(json!(["EQ", "certified", false])), Type::Bool);
    let err = analyze_rules(vec![("t:bad", json!(["EQ", "certified", 1]))]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
}

#[test]
fn arity_is_checked_before_types() {
    let err = analyze_rules(vec![("t:bad", json!(["NOT", true, false]))]).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::ArityError {
            expected: Arity::Exact(1),
            actual: 2,
            ..
        }
    ));
}

#[test]
fn rounding_precision_must_be_integer() {
    assert_eq!(rule_type(json!(["GE", ["ROUND", "CAR", 2], 1])), Type::Bool);
    assert_eq!(rule_type(json!(["GE", ["FLOOR", "CAR", "employees"], 1])), Type::Bool);
    let err = analyze_rules(vec![("t:bad", json!(["GE", ["CEIL", "CAR", 0.5], 1]))]).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::TypeMismatch {
            expected: Expected::Type(Type::Int),
            actual: Type::Real,
            ..
        }
    ));
}
