//! Document loading, reporting and the CLI for lexsat.
//!
//! This crate provides:
//! - [`loader`] - Reading rule and case documents from disk
//! - [`report`] - Text and JSON rendering of solve outcomes
//! - [`logging`] - The stderr `tracing` subscriber
//! - [`cli`] - Argument parsing and the run loop behind the `lexsat` binary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cli;
pub mod error;
pub mod loader;
pub mod logging;
pub mod report;

pub use cli::{Action, CliOptions, help_text, run};
pub use error::{RuntimeError, RuntimeResult};
pub use loader::{load_case, load_problem, load_rules};
pub use report::{Report, render_json, render_text};
