//! Integration tests for the S-expression parser

use lexsat_foundation::{ErrorKind, Value};
use lexsat_language::{Expr, Operator, parse_expr, parse_expr_str, to_json};
use serde_json::json;

// =============================================================================
// Forms
// =============================================================================

#[test]
fn capital_adequacy_rule() {
    let expr = parse_expr(&json!([
        "AND",
        ["GE", "CAR", 200.0],
        ["OR", ["GE", "NWR", 3.0], ["GE", "NWR_prev", 3.0]]
    ]))
    .unwrap();

    let Expr::Call(Operator::And, args) = &expr else {
        panic!("expected AND, got {expr:?}");
    };
    assert_eq!(args.len(), 2);
    assert_eq!(
        args[0],
        Expr::call(Operator::Ge, vec![Expr::var("CAR"), Expr::lit(200.0)])
    );
    assert_eq!(
        expr.references_in_order(),
        vec!["CAR", "NWR", "NWR_prev"]
    );
}

#[test]
fn var_form_and_bare_identifier_agree() {
    let explicit = parse_expr(&json!(["GE", ["VAR", "CAR"], 1])).unwrap();
    let bare = parse_expr(&json!(["GE", "CAR", 1])).unwrap();
    assert_eq!(explicit, bare);
}

#[test]
fn tags_are_case_insensitive() {
    let lower = parse_expr(&json!(["round", "x", 2])).unwrap();
    let upper = parse_expr(&json!(["ROUND", "x", 2])).unwrap();
    assert_eq!(lower, upper);
}

#[test]
fn literals_keep_their_kind() {
    assert_eq!(parse_expr(&json!(3)).unwrap(), Expr::Literal(Value::Int(3)));
    assert_eq!(parse_expr(&json!(3.5)).unwrap(), Expr::Literal(Value::Real(3.5)));
    assert_eq!(parse_expr(&json!(true)).unwrap(), Expr::Literal(Value::Bool(true)));
}

#[test]
fn case_values_are_string_literals() {
    let expr = parse_expr(&json!(["CASE", "certified", "adequate", "inadequate"])).unwrap();
    let Expr::Call(Operator::Case, args) = expr else {
        panic!("expected CASE");
    };
    assert_eq!(args[0], Expr::var("certified"));
    assert_eq!(args[1], Expr::Literal(Value::from("adequate")));
    assert_eq!(args[2], Expr::Literal(Value::from("inadequate")));
}

#[test]
fn rendering_uses_canonical_forms() {
    let expr = parse_expr_str(r#"["percent", "rate"]"#).unwrap();
    assert_eq!(to_json(&expr), json!(["PERCENT", ["VAR", "rate"]]));
    assert_eq!(parse_expr(&to_json(&expr)).unwrap(), expr);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn unknown_operator() {
    let err = parse_expr(&json!(["XOR", true, false])).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownOperator(ref tag) if tag == "XOR"));
}

#[test]
fn malformed_forms() {
    for bad in [
        json!([]),
        json!(null),
        json!({"op": "AND"}),
        json!([1, 2]),
        json!(["VAR"]),
        json!(["VAR", "a", "b"]),
        json!(""),
    ] {
        let err = parse_expr(&bad).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ParseError(_)), "{bad}");
    }
}

#[test]
fn nested_error_reports_its_path() {
    let err = parse_expr(&json!(["AND", true, ["OR", ["NOPE"]]])).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("AND arg 2"), "{message}");
    assert!(message.contains("OR arg 1"), "{message}");
}

#[test]
fn invalid_json_text() {
    let err = parse_expr_str("[\"AND\", ").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ParseError(_)));
}
