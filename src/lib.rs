//! lexsat - legal rules as SMT problems
//!
//! This crate re-exports all layers of the lexsat system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: lexsat_runtime    - Document loading, reports, CLI
//! Layer 2: lexsat_engine     - Z3 lowering, assertion emission, solving
//! Layer 1: lexsat_language   - AST, parser, declarations, resolver, type checker
//! Layer 0: lexsat_foundation - Core types (Value, Type, Error)
//! ```

pub use lexsat_engine as engine;
pub use lexsat_foundation as foundation;
pub use lexsat_language as language;
pub use lexsat_runtime as runtime;
