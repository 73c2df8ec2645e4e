//! Rendering solve outcomes for people and for tools.

use std::fmt::Write as _;

use lexsat_engine::{Assignment, SolveResult, UnsatCore};
use serde::Serialize;

use crate::error::RuntimeResult;

/// The outcome for one case file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Case label, usually the file path.
    pub case: String,
    /// Verdict and its witness.
    #[serde(flatten)]
    pub result: SolveResult,
}

impl Report {
    /// Creates a report.
    pub fn new(case: impl Into<String>, result: SolveResult) -> Self {
        Self {
            case: case.into(),
            result,
        }
    }
}

/// Renders reports as a pretty JSON array.
///
/// # Errors
/// Returns `Render` if serialization fails.
pub fn render_json(reports: &[Report]) -> RuntimeResult<String> {
    Ok(serde_json::to_string_pretty(reports)?)
}

/// Renders reports as plain text, one block per case.
#[must_use]
pub fn render_text(reports: &[Report]) -> String {
    let mut out = String::new();
    for report in reports {
        match &report.result {
            SolveResult::Satisfiable(assignment) => write_sat(&mut out, &report.case, assignment),
            SolveResult::Unsatisfiable(core) => write_unsat(&mut out, &report.case, core),
        }
    }
    out
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

// Writing to a String cannot fail.
fn write_sat(out: &mut String, case: &str, assignment: &Assignment) {
    let _ = writeln!(out, "{case}: SAT");
    if let Some(penalty) = assignment.penalty() {
        let _ = writeln!(out, "  penalty: {penalty}");
    }
    let _ = writeln!(out, "  failed rules: {}", list_or_none(&assignment.failed_rules));
    let _ = writeln!(out, "  dropped facts: {}", list_or_none(&assignment.dropped_facts));
    let _ = writeln!(out, "  values:");
    for (name, value) in &assignment.values {
        let _ = writeln!(out, "    {name} = {value}");
    }
}

fn write_unsat(out: &mut String, case: &str, core: &UnsatCore) {
    if core.is_domain_violation() {
        let _ = writeln!(out, "{case}: UNSAT (domain violation)");
    } else {
        let _ = writeln!(out, "{case}: UNSAT");
    }
    let _ = writeln!(out, "  core:");
    for entry in &core.entries {
        let _ = writeln!(out, "    {} [{}]", entry.id, entry.kind);
    }
}
