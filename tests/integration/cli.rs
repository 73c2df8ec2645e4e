//! Integration tests for the document-to-report run loop

use std::path::PathBuf;

use lexsat::runtime::{CliOptions, RuntimeError, run};

const RULES: &str = r#"[
    {"id": "labor:overtime_ok", "desc": "Monthly overtime within 46 hours", "expr": ["LE", "overtime_hours", 46], "domain": "labor"},
    {"id": "labor:rest_ok", "desc": "At least one rest day per week", "expr": ["GE", "rest_days", 1], "domain": "labor"}
]"#;

const COMPLIANT: &str = r#"{
    "varspecs": [
        {"name": "overtime_hours", "type": "Real", "unit": "hours", "domain": {"min": 0, "max": 300}, "source": "case_text:overtime"},
        {"name": "rest_days", "type": "Int", "source": "default"}
    ],
    "facts": {"overtime_hours": 20.5, "rest_days": 1, "penalty": false}
}"#;

const VIOLATING: &str = r#"{
    "varspecs": [
        {"name": "overtime_hours", "type": "Real", "unit": "hours", "domain": {"min": 0, "max": 300}, "source": "case_text:overtime"},
        {"name": "rest_days", "type": "Int", "source": "default"}
    ],
    "facts": {"overtime_hours": 80, "rest_days": 1}
}"#;

fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lexsat-cli-{}-{test}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("rules.json"), RULES).unwrap();
    std::fs::write(dir.join("compliant.json"), COMPLIANT).unwrap();
    std::fs::write(dir.join("violating.json"), VIOLATING).unwrap();
    dir
}

fn options(dir: &PathBuf, extra: &[&str]) -> CliOptions {
    let mut args = vec![
        "--rules".to_string(),
        dir.join("rules.json").display().to_string(),
    ];
    args.extend(extra.iter().map(ToString::to_string));
    args.push(dir.join("compliant.json").display().to_string());
    args.push(dir.join("violating.json").display().to_string());
    CliOptions::parse(args).unwrap()
}

#[test]
fn text_report_for_two_cases() {
    let dir = scratch_dir("text");
    let out = run(&options(&dir, &[])).unwrap();

    assert!(out.contains("compliant.json: SAT\n  penalty: false\n"), "{out}");
    assert!(out.contains("violating.json: SAT\n  penalty: true\n"), "{out}");
    assert!(out.contains("  failed rules: labor:overtime_ok\n"), "{out}");
    assert!(out.contains("    rest_days = 1\n"), "{out}");
}

#[test]
fn json_report_is_machine_readable() {
    let dir = scratch_dir("json");
    let out = run(&options(&dir, &["--json"])).unwrap();
    let reports: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(reports.as_array().map(Vec::len), Some(2));
    assert_eq!(reports[0]["verdict"], "satisfiable");
    assert_eq!(reports[0]["values"]["penalty"], false);
    assert_eq!(reports[1]["values"]["penalty"], true);
    assert_eq!(reports[1]["values"]["overtime_hours"], 80.0);
}

#[test]
fn enforce_flag_turns_violations_into_cores() {
    let dir = scratch_dir("enforce");
    let out = run(&options(&dir, &["--enforce", "--json"])).unwrap();
    let reports: serde_json::Value = serde_json::from_str(&out).unwrap();

    assert_eq!(reports[0]["verdict"], "satisfiable");
    assert_eq!(reports[1]["verdict"], "satisfiable");
    assert_eq!(reports[1]["dropped_facts"], serde_json::json!(["overtime_hours"]));
}

#[test]
fn emit_smt_prints_one_script_per_case() {
    let dir = scratch_dir("smt");
    let out = run(&options(&dir, &["--emit-smt"])).unwrap();

    assert_eq!(out.matches("(declare-const overtime_hours Real)").count(), 2);
    assert!(out.contains(":named |labor:rest_ok|"), "{out}");
    assert!(out.contains(":named |bound:overtime_hours:max|"), "{out}");
}

#[test]
fn config_file_is_honoured() {
    let dir = scratch_dir("config");
    let config = dir.join("lexsat.toml");
    std::fs::write(&config, "fact_weight = 5\n").unwrap();
    let config_arg = config.display().to_string();
    let out = run(&options(&dir, &["--emit-smt", "-c", &config_arg])).unwrap();
    assert!(out.contains(":weight 10 :id |fact:rest_days|"), "{out}");

    std::fs::write(&config, "fact_weight = 0\n").unwrap();
    let err = run(&options(&dir, &["-c", &config_arg])).unwrap_err();
    assert!(matches!(err, RuntimeError::Config(_)));
}

#[test]
fn missing_case_file() {
    let dir = scratch_dir("missing");
    let mut options = options(&dir, &[]);
    options.cases.push(dir.join("nope.json"));
    let err = run(&options).unwrap_err();
    assert!(matches!(err, RuntimeError::Io { .. }));
}
