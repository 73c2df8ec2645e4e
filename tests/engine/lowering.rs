//! Integration tests for lowering rule expressions to Z3

use lexsat_engine::{SolveConfig, compile, solve};
use lexsat_foundation::{Type, Value};
use lexsat_language::{
    ConstraintProblem, ConstraintSpec, Fact, VariableDeclaration, parse_expr,
};
use serde_json::{Value as Json, json};
use z3::{Config, Context};

fn problem(rules: Vec<(&str, Json)>) -> ConstraintProblem {
    ConstraintProblem::new(
        vec![
            VariableDeclaration::new("x", Type::Real),
            VariableDeclaration::new("n", Type::Int),
            VariableDeclaration::new("certified", Type::Bool),
        ],
        vec![
            Fact::new("x", 3.0),
            Fact::new("n", 4_i64),
            Fact::new("certified", true),
        ],
        rules
            .into_iter()
            .map(|(id, expr)| ConstraintSpec::new(id, parse_expr(&expr).unwrap()))
            .collect(),
    )
    .unwrap()
}

/// Wraps a value expression so it becomes a readable rule helper.
fn value_rule(expr: Json) -> Json {
    json!(["CASE", true, expr, 0])
}

fn assert_close(actual: Option<&Value>, expected: f64, what: &str) {
    let actual = actual
        .and_then(Value::as_number)
        .unwrap_or_else(|| panic!("{what}: no numeric value"));
    assert!((actual - expected).abs() < 1e-9, "{what}: {actual} != {expected}");
}

// =============================================================================
// Types
// =============================================================================

#[test]
fn every_operator_lowers_to_its_checked_type() {
    let cases: Vec<(&str, Json, Type)> = vec![
        ("t:and", json!(["AND", "certified", true]), Type::Bool),
        ("t:or", json!(["OR", "certified", false]), Type::Bool),
        ("t:not", json!(["NOT", "certified"]), Type::Bool),
        ("t:eq", json!(["EQ", "n", 4]), Type::Bool),
        ("t:ge", json!(["GE", "x", 1]), Type::Bool),
        ("t:le", json!(["LE", "n", 1]), Type::Bool),
        ("t:gt", json!(["GT", "x", "n"]), Type::Bool),
        ("t:lt", json!(["LT", 1, 2]), Type::Bool),
        ("t:add", value_rule(json!(["ADD", "x", "n"])), Type::Real),
        ("t:sub", value_rule(json!(["SUB", "x", 1])), Type::Real),
        ("t:mul", value_rule(json!(["MUL", "x", 2])), Type::Real),
        ("t:div", value_rule(json!(["DIV", "x", 2])), Type::Real),
        ("t:sum", value_rule(json!(["SUM", "x", "n", 1])), Type::Real),
        ("t:avg", value_rule(json!(["AVG", "x", "n"])), Type::Real),
        ("t:min", value_rule(json!(["MIN", "x", "n"])), Type::Real),
        ("t:max", value_rule(json!(["MAX", "x", "n"])), Type::Real),
        ("t:abs", value_rule(json!(["ABS", "x"])), Type::Real),
        ("t:pow", value_rule(json!(["POW", "x", 2])), Type::Real),
        ("t:round", value_rule(json!(["ROUND", "x", 2])), Type::Real),
        ("t:floor", value_rule(json!(["FLOOR", "x"])), Type::Real),
        ("t:ceil", value_rule(json!(["CEIL", "x", "n"])), Type::Real),
        ("t:ifnull", value_rule(json!(["IFNULL", "n", 0])), Type::Int),
        ("t:percent", value_rule(json!(["PERCENT", "x"])), Type::Real),
        ("t:case", json!(["CASE", "certified", 1, 0]), Type::Int),
    ];
    let expected: Vec<(String, Type)> = cases.iter().map(|(id, _, ty)| ((*id).to_string(), *ty)).collect();
    let problem = problem(cases.into_iter().map(|(id, expr, _)| (id, expr)).collect());

    let ctx = Context::new(&Config::new());
    let compiled = compile(&ctx, &problem, &SolveConfig::default()).unwrap();
    for (id, ty) in expected {
        let helper = compiled.lowerer.helper(&id).unwrap();
        assert_eq!(helper.ty(), ty, "{id}");
    }
}

// =============================================================================
// Values
// =============================================================================

#[test]
fn arithmetic_values() {
    let problem = problem(vec![
        ("v:add", value_rule(json!(["ADD", "x", "n"]))),
        ("v:sub", value_rule(json!(["SUB", 10, "x"]))),
        ("v:div", value_rule(json!(["DIV", "x", 2, 3]))),
        ("v:avg", value_rule(json!(["AVG", "x", "n", 5]))),
        ("v:min", value_rule(json!(["MIN", "x", "n", 7]))),
        ("v:max", value_rule(json!(["MAX", "x", "n", -7]))),
        ("v:abs", value_rule(json!(["ABS", ["SUB", "x", 10]]))),
        ("v:percent", value_rule(json!(["PERCENT", 0.05]))),
        ("v:mul", value_rule(json!(["MUL", "x", 1.5]))),
    ]);
    let result = solve(&problem).unwrap();
    let assignment = result.assignment().unwrap();

    assert_close(assignment.get("v:add"), 7.0, "ADD");
    assert_close(assignment.get("v:sub"), 7.0, "SUB");
    assert_close(assignment.get("v:div"), 0.5, "DIV");
    assert_close(assignment.get("v:avg"), 4.0, "AVG");
    assert_close(assignment.get("v:min"), 3.0, "MIN");
    assert_close(assignment.get("v:max"), 4.0, "MAX");
    assert_close(assignment.get("v:abs"), 7.0, "ABS");
    assert_close(assignment.get("v:percent"), 5.0, "PERCENT");
    assert_close(assignment.get("v:mul"), 4.5, "MUL");
}

#[test]
fn rounding_values() {
    let problem = problem(vec![
        ("r:round", value_rule(json!(["ROUND", 2.97, 1]))),
        ("r:round_half", value_rule(json!(["ROUND", 2.5]))),
        ("r:floor", value_rule(json!(["FLOOR", -2.5]))),
        ("r:ceil", value_rule(json!(["CEIL", 2.01, 1]))),
        ("r:tens", value_rule(json!(["ROUND", 1234, -2]))),
    ]);
    let result = solve(&problem).unwrap();
    let assignment = result.assignment().unwrap();

    assert_close(assignment.get("r:round"), 3.0, "ROUND 2.97 1");
    assert_close(assignment.get("r:round_half"), 3.0, "ROUND 2.5");
    assert_close(assignment.get("r:floor"), -3.0, "FLOOR -2.5");
    assert_close(assignment.get("r:ceil"), 2.1, "CEIL 2.01 1");
    assert_close(assignment.get("r:tens"), 1200.0, "ROUND 1234 -2");
}

#[test]
fn case_takes_the_first_true_branch() {
    let problem = problem(vec![
        ("c:rank", json!(["CASE", ["LT", "x", 100], 2, ["LT", "x", 150], 1, 0])),
        ("c:fallback", json!(["CASE", ["GT", "x", 100], 2, ["GT", "x", 150], 1, 0])),
        ("c:ifnull", value_rule(json!(["IFNULL", "n", 0]))),
    ]);
    let result = solve(&problem).unwrap();
    let assignment = result.assignment().unwrap();

    assert_eq!(assignment.get("c:rank"), Some(&Value::Int(2)));
    assert_eq!(assignment.get("c:fallback"), Some(&Value::Int(0)));
    assert_eq!(assignment.get("c:ifnull"), Some(&Value::Int(4)));
}

#[test]
fn comparisons_mix_int_and_real() {
    let problem = problem(vec![
        ("b:gt", json!(["GT", "x", 2.5])),
        ("b:int", json!(["GE", "n", 4])),
        ("b:mixed", json!(["LT", "n", "x"])),
        ("b:eq", json!(["EQ", "n", 4.0])),
    ]);
    let result = solve(&problem).unwrap();
    let assignment = result.assignment().unwrap();

    assert_eq!(assignment.get("b:gt"), Some(&Value::Bool(true)));
    assert_eq!(assignment.get("b:int"), Some(&Value::Bool(true)));
    assert_eq!(assignment.get("b:mixed"), Some(&Value::Bool(false)));
    assert_eq!(assignment.get("b:eq"), Some(&Value::Bool(true)));
    assert_eq!(assignment.failed_rules, vec!["b:mixed"]);
}
