//! Integration tests for Layer 2: Engine
//!
//! Tests for lowering, assertion emission and solving.

mod emission;
mod lowering;
