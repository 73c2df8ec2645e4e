//! Reading the extractor documents from disk.

use std::path::Path;

use lexsat_language::{CaseDocument, ConstraintProblem, ConstraintRecord};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{RuntimeError, RuntimeResult};

fn read_json<T: DeserializeOwned>(path: &Path) -> RuntimeResult<T> {
    let text = std::fs::read_to_string(path).map_err(|source| RuntimeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| RuntimeError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the rule extractor's array of constraint specs.
///
/// # Errors
/// Returns `Io` or `Json` for unreadable or malformed files.
pub fn load_rules(path: impl AsRef<Path>) -> RuntimeResult<Vec<ConstraintRecord>> {
    let records: Vec<ConstraintRecord> = read_json(path.as_ref())?;
    debug!(path = %path.as_ref().display(), rules = records.len(), "loaded rules");
    Ok(records)
}

/// Loads one case document.
///
/// # Errors
/// Returns `Io` or `Json` for unreadable or malformed files.
pub fn load_case(path: impl AsRef<Path>) -> RuntimeResult<CaseDocument> {
    let case: CaseDocument = read_json(path.as_ref())?;
    debug!(
        path = %path.as_ref().display(),
        varspecs = case.varspecs.len(),
        facts = case.facts.len(),
        "loaded case"
    );
    Ok(case)
}

/// Loads a rule file and a case file into one problem.
///
/// # Errors
/// Returns any load error, or `Core` if the documents do not form a valid
/// problem.
pub fn load_problem(
    rules: impl AsRef<Path>,
    case: impl AsRef<Path>,
) -> RuntimeResult<ConstraintProblem> {
    let records = load_rules(rules)?;
    let case = load_case(case)?;
    Ok(ConstraintProblem::from_documents(&records, case)?)
}
