//! Integration tests for assertion emission

use lexsat_engine::{AssertionKind, Orchestrator, RuleMode, SolveConfig, compile};
use lexsat_foundation::{ErrorKind, Type};
use lexsat_language::{ConstraintProblem, ConstraintSpec, Fact, VariableDeclaration, parse_expr};
use serde_json::json;
use z3::{Config, Context};

fn capital_problem() -> ConstraintProblem {
    ConstraintProblem::new(
        vec![
            VariableDeclaration::new("CAR", Type::Real).with_domain(0.0, 1000.0),
            VariableDeclaration::new("NWR", Type::Real),
            VariableDeclaration::new("NWR_prev", Type::Real),
            VariableDeclaration::new("insurance:capital_rank", Type::Int).with_domain(0.0, 3.0),
        ],
        vec![
            Fact::new("CAR", 150.0),
            Fact::new("NWR", 2.97),
            Fact::new("NWR_prev", 2.97),
        ],
        vec![
            ConstraintSpec::new(
                "insurance:capital_adequate_ok",
                parse_expr(&json!([
                    "AND",
                    ["GE", "CAR", 200.0],
                    ["OR", ["GE", "NWR", 3.0], ["GE", "NWR_prev", 3.0]]
                ]))
                .unwrap(),
            ),
            ConstraintSpec::new(
                "insurance:capital_rank",
                parse_expr(&json!(["CASE", ["LT", "CAR", 100], 2, ["LT", "CAR", 150], 1, 0]))
                    .unwrap(),
            ),
        ],
    )
    .unwrap()
}

#[test]
fn derived_classification_declarations_bound_the_helper() {
    let ctx = Context::new(&Config::new());
    let compiled = compile(&ctx, &capital_problem(), &SolveConfig::default()).unwrap();

    let bound = compiled
        .assertions
        .get("bound:insurance:capital_rank:max")
        .unwrap();
    assert_eq!(bound.kind, AssertionKind::Bound);
    assert!(compiled.lowerer.variable("insurance:capital_rank").is_none());
    assert_eq!(
        compiled.lowerer.helper("insurance:capital_rank").unwrap().ty(),
        Type::Int
    );
}

#[test]
fn rules_are_hard_facts_are_soft() {
    let ctx = Context::new(&Config::new());
    let compiled = compile(&ctx, &capital_problem(), &SolveConfig::default()).unwrap();

    for assertion in compiled.assertions.assertions() {
        assert_eq!(
            assertion.kind.is_hard(),
            !assertion.id.starts_with("fact:"),
            "{}",
            assertion.id
        );
    }
    assert_eq!(compiled.assertions.soft().count(), 4);
}

#[test]
fn enforce_mode_asserts_boolean_helpers() {
    let evaluate = Context::new(&Config::new());
    let enforce = Context::new(&Config::new());
    let problem = capital_problem();

    let plain = compile(&evaluate, &problem, &SolveConfig::default()).unwrap();
    let forced = compile(
        &enforce,
        &problem,
        &SolveConfig::default().with_rule_mode(RuleMode::Enforce),
    )
    .unwrap();

    let id = "insurance:capital_adequate_ok";
    let plain_text = plain.assertions.get(id).unwrap().formula.to_string();
    let forced_text = forced.assertions.get(id).unwrap().formula.to_string();
    assert!(!plain_text.starts_with("(and"), "{plain_text}");
    assert!(forced_text.starts_with("(and"), "{forced_text}");

    let rank = "insurance:capital_rank";
    assert_eq!(
        plain.assertions.get(rank).unwrap().formula.to_string(),
        forced.assertions.get(rank).unwrap().formula.to_string()
    );
}

#[test]
fn smt_text_is_deterministic_across_contexts() {
    let orchestrator = Orchestrator::new(SolveConfig::default().with_fact_weight(3));
    let first = orchestrator.emit_smt(&capital_problem()).unwrap();
    let second = orchestrator.emit_smt(&capital_problem()).unwrap();
    assert_eq!(first, second);
    assert!(first.contains(":weight 6 :id |fact:CAR|"), "{first}");
    assert!(first.contains(":weight 3 :id |fact:penalty|"), "{first}");
    assert!(first.contains(":named |meta:penalty_aggregation|"), "{first}");
}

#[test]
fn compile_errors_are_all_or_nothing() {
    let problem = ConstraintProblem::new(
        vec![VariableDeclaration::new("CAR", Type::Real)],
        vec![],
        vec![
            ConstraintSpec::new("a:ok", parse_expr(&json!(["GE", "CAR", 1])).unwrap()),
            ConstraintSpec::new("a:bad", parse_expr(&json!(["GE", "missing", 1])).unwrap()),
        ],
    )
    .unwrap();
    let ctx = Context::new(&Config::new());
    let err = compile(&ctx, &problem, &SolveConfig::default())
        .err()
        .unwrap();
    assert!(matches!(err.kind, ErrorKind::UnknownIdentifier(_)));
}
