//! End-to-end scenarios over the extractor document formats

use lexsat::engine::{Orchestrator, RuleMode, SolveConfig, solve};
use lexsat::foundation::{ErrorKind, Value};
use lexsat::language::ConstraintProblem;
use serde_json::json;

const RULES: &str = r#"[
    {
        "id": "insurance:capital_adequate_ok",
        "desc": "Capital adequacy ratio of at least 200% and a net worth ratio of at least 3% in one of the last two periods",
        "expr": ["AND", ["GE", "CAR", 200.0], ["OR", ["GE", "NWR", 3.0], ["GE", "NWR_prev", 3.0]]],
        "weight": 1,
        "domain": "insurance"
    },
    {
        "id": "insurance:capital_rank",
        "desc": "Capital grade: 0 adequate, 1 inadequate, 2 significantly inadequate",
        "expr": ["CASE", ["LT", "CAR", 150.0], 2, ["LT", "CAR", 200.0], 1, 0],
        "domain": "insurance"
    },
    {
        "id": "meta:rank_is_known",
        "desc": "The capital grade is within range",
        "expr": ["LE", "insurance:capital_rank", 2],
        "domain": "meta"
    }
]"#;

fn case(car: f64, nwr: f64, nwr_prev: f64) -> String {
    json!({
        "varspecs": [
            {"name": "CAR", "type": "Real", "unit": "%", "domain": {"min": 0, "max": 1000}, "source": "case_text:capital adequacy ratio"},
            {"name": "NWR", "type": "Real", "unit": "%", "domain": {"min": -100, "max": 100}, "source": "case_text:net worth ratio"},
            {"name": "NWR_prev", "type": "Real", "unit": "%", "domain": {"min": -100, "max": 100}, "source": "from-text"},
            {"name": "insurance:capital_rank", "type": "Int", "source": "derived_from_case"}
        ],
        "facts": {"CAR": car, "NWR": nwr, "NWR_prev": nwr_prev}
    })
    .to_string()
}

fn problem(car: f64, nwr: f64, nwr_prev: f64) -> ConstraintProblem {
    ConstraintProblem::from_json_str(RULES, &case(car, nwr, nwr_prev)).unwrap()
}

#[test]
fn undercapitalized_insurer_is_penalized() {
    let result = solve(&problem(150.0, 2.97, 2.97)).unwrap();
    let assignment = result.assignment().unwrap();

    assert_eq!(
        assignment.get("insurance:capital_adequate_ok"),
        Some(&Value::Bool(false))
    );
    assert_eq!(assignment.penalty(), Some(true));
    assert_eq!(assignment.get("insurance:capital_rank"), Some(&Value::Int(1)));
    assert_eq!(assignment.failed_rules, vec!["insurance:capital_adequate_ok"]);
    assert_eq!(assignment.dropped_facts, vec!["penalty"]);
}

#[test]
fn adequately_capitalized_insurer_is_not_penalized() {
    let result = solve(&problem(250.0, 5.0, 1.0)).unwrap();
    let assignment = result.assignment().unwrap();

    assert_eq!(
        assignment.get("insurance:capital_adequate_ok"),
        Some(&Value::Bool(true))
    );
    assert_eq!(assignment.penalty(), Some(false));
    assert_eq!(assignment.get("insurance:capital_rank"), Some(&Value::Int(0)));
    assert!(assignment.failed_rules.is_empty());
    assert!(assignment.dropped_facts.is_empty());
}

#[test]
fn out_of_domain_fact_is_dropped() {
    let result = solve(&problem(2500.0, 5.0, 5.0)).unwrap();
    let assignment = result.assignment().unwrap();
    assert_eq!(assignment.dropped_facts, vec!["CAR"]);
    let car = assignment.get("CAR").and_then(Value::as_number).unwrap();
    assert!(car <= 1000.0, "{car}");
}

#[test]
fn enforcing_a_failed_rule_explains_itself() {
    let problem = ConstraintProblem::from_json_str(
        RULES,
        &json!({
            "varspecs": [
                {"name": "CAR", "type": "Real", "domain": {"min": 0, "max": 180}},
                {"name": "NWR", "type": "Real"},
                {"name": "NWR_prev", "type": "Real"}
            ],
            "facts": {"CAR": 150.0, "NWR": 5.0, "NWR_prev": 5.0}
        })
        .to_string(),
    )
    .unwrap();
    let config = SolveConfig::default().with_rule_mode(RuleMode::Enforce);
    let result = Orchestrator::new(config).solve(&problem).unwrap();
    let core = result.core().unwrap();
    assert_eq!(core.ids(), vec!["bound:CAR:max", "insurance:capital_adequate_ok"]);
    assert!(core.is_domain_violation());
}

#[test]
fn mutually_referencing_rules_are_rejected_before_solving() {
    let rules = json!([
        {"id": "labor:a", "expr": ["VAR", "labor:b"], "domain": "labor"},
        {"id": "labor:b", "expr": ["VAR", "labor:a"], "domain": "labor"}
    ])
    .to_string();
    let case = json!({"varspecs": [], "facts": {}}).to_string();
    let problem = ConstraintProblem::from_json_str(&rules, &case).unwrap();
    let err = solve(&problem).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::CyclicRuleReference { .. }));
    assert!(err.to_string().contains("labor:a -> labor:b -> labor:a"));
}

#[test]
fn undeclared_fact_is_rejected() {
    let case = json!({"varspecs": [], "facts": {"CAR": 1.0}}).to_string();
    let err = ConstraintProblem::from_json_str("[]", &case).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownIdentifier(_)));
}

#[test]
fn batch_results_match_single_solves() {
    let problems = vec![problem(150.0, 2.97, 2.97), problem(250.0, 5.0, 1.0)];
    let orchestrator = Orchestrator::new(SolveConfig::default().with_threads(2));
    let batch = orchestrator.solve_batch(&problems).unwrap();
    for (problem, result) in problems.iter().zip(batch) {
        assert_eq!(result.unwrap(), solve(problem).unwrap());
    }
}
