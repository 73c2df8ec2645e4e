//! SMT compilation and solving for lexsat.
//!
//! Takes a [`ConstraintProblem`](lexsat_language::ConstraintProblem) through
//! Z3:
//!
//! ```text
//! ConstraintProblem
//!          │ analyze
//!          ▼
//! ┌─────────────────┐
//! │ LOWERING        │  → one Z3 constant per variable and rule helper
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ EMITTER         │  → bounds, rules, penalty law (hard), facts (soft)
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ ORCHESTRATOR    │  → Assignment or minimal UnsatCore
//! └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`] - TOML-backed [`SolveConfig`]
//! - [`lowering`] - Typed expressions to Z3 terms
//! - [`emitter`] - Named hard and soft assertions
//! - [`solve`] - The [`Orchestrator`] and its results
//! - [`batch`] - Parallel solving of independent problems

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod batch;
pub mod config;
pub mod emitter;
pub mod lowering;
pub mod solve;


pub use config::{ConfigError, RuleMode, SolveConfig};
pub use emitter::{Assertion, AssertionKind, AssertionSet, CompiledProblem, Emitter, compile};
pub use lowering::{Lowerer, Term};
pub use solve::{Assignment, CoreEntry, Orchestrator, SolveResult, UnsatCore, solve};
