//! Rule expression language for lexsat.
//!
//! This crate takes the two extractor documents as far as a fully typed,
//! acyclic rule set:
//!
//! ```text
//! rules.json + case.json
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ PARSER          │  → Expr trees, declarations, facts
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ PROBLEM         │  → ConstraintProblem (penalty injected, names unique)
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ RESOLVER        │  → SymbolTable (atomic vs rule, dependency order)
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ TYPE CHECKER    │  → TypedRule per rule
//! └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`ast`] - Expression tree and the closed operator set
//! - [`parser`] - JSON S-expression parsing and rendering
//! - [`declaration`] - Variable declarations, facts, constraint specs
//! - [`problem`] - The validated [`ConstraintProblem`]
//! - [`resolver`] - Symbol classification and cycle detection
//! - [`typecheck`] - Bottom-up type assignment

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod declaration;
pub mod parser;
pub mod problem;
pub mod resolver;
pub mod typecheck;


use lexsat_foundation::Result;
use tracing::debug;

pub use ast::{Expr, Operator};
pub use declaration::{
    CaseDocument, ConstraintRecord, ConstraintSpec, Domain, Fact, Provenance, VariableDeclaration,
};
pub use parser::{parse_expr, parse_expr_str, to_json};
pub use problem::ConstraintProblem;
pub use resolver::{SymbolKind, SymbolTable};
pub use typecheck::{TypeChecker, TypedExpr, TypedNode, TypedRule, check_problem};

/// A problem that passed resolution and type checking.
#[derive(Clone, Debug)]
pub struct Analysis {
    /// Resolved symbols.
    pub symbols: SymbolTable,
    /// Typed rules, in problem order.
    pub rules: Vec<TypedRule>,
}

/// Runs the resolver and the type checker over a problem.
///
/// # Errors
/// Returns the first resolution or typing error; nothing partial is kept.
pub fn analyze(problem: &ConstraintProblem) -> Result<Analysis> {
    let symbols = SymbolTable::resolve(problem)?;
    let rules = check_problem(problem, &symbols)?;
    debug!(rules = rules.len(), "analysis complete");
    Ok(Analysis { symbols, rules })
}
