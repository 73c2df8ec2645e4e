//! Core types, values, and errors for lexsat.
//!
//! This crate provides:
//! - [`Value`] - Literal values carried by facts, expressions and models
//! - [`Type`] - Semantic types (Bool, Int, Real) and operator arities
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod types;
pub mod value;

pub use error::{Error, ErrorContext, ErrorKind};
pub use types::{Arity, Expected, Type};
pub use value::Value;

/// Result type alias using lexsat's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
