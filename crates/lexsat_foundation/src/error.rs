//! Error types for the lexsat system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every compile-time error is fatal for the whole constraint problem.
//! An unsatisfiable problem is a result, not an error.

use std::fmt;

use thiserror::Error;

use crate::types::{Arity, Expected, Type};

/// The main error type for lexsat operations.
#[derive(Debug, Error)]
#[error("{kind}{}", display_context(.context.as_ref()))]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

fn display_context(context: Option<&ErrorContext>) -> String {
    context.map(|c| format!(" ({c})")).unwrap_or_default()
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Attaches the rule being compiled, keeping any existing frames.
    #[must_use]
    pub fn in_rule(mut self, rule: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_rule(rule));
        self
    }

    /// Creates an unknown identifier error.
    #[must_use]
    pub fn unknown_identifier(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownIdentifier(name.into()))
    }

    /// Creates a cyclic rule reference error from the offending path.
    #[must_use]
    pub fn cyclic_reference(cycle: Vec<String>) -> Self {
        Self::new(ErrorKind::CyclicRuleReference { cycle })
    }

    /// Creates a type mismatch error for the given node.
    #[must_use]
    pub fn type_mismatch(node: impl Into<String>, expected: Expected, actual: Type) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            node: node.into(),
            expected,
            actual,
        })
    }

    /// Creates an arity error.
    #[must_use]
    pub fn arity(operator: impl Into<String>, expected: Arity, actual: usize) -> Self {
        Self::new(ErrorKind::ArityError {
            operator: operator.into(),
            expected,
            actual,
        })
    }

    /// Creates an unknown operator error.
    #[must_use]
    pub fn unknown_operator(tag: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownOperator(tag.into()))
    }

    /// Creates a parse error for a malformed expression.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError(message.into()))
    }

    /// Creates a solver error.
    #[must_use]
    pub fn solver(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Solver(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A VAR names neither a declared variable nor a rule.
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    /// The rule reference graph contains a cycle.
    #[error("cyclic rule reference: {}", .cycle.join(" -> "))]
    CyclicRuleReference {
        /// The rule ids on the cycle, first id repeated at the end.
        cycle: Vec<String>,
    },

    /// An operand or branch has the wrong type.
    #[error("type mismatch in {node}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The offending node, rendered as an S-expression.
        node: String,
        /// What the signature required.
        expected: Expected,
        /// The type actually found.
        actual: Type,
    },

    /// Wrong number of arguments to an operator.
    #[error("arity error: {operator} expects {expected} arguments, got {actual}")]
    ArityError {
        /// The operator tag.
        operator: String,
        /// The accepted arity.
        expected: Arity,
        /// Actual number of arguments.
        actual: usize,
    },

    /// Operator tag outside the supported set.
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// Malformed S-expression or input record.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Two variable declarations share a name.
    #[error("duplicate declaration: {0}")]
    DuplicateDeclaration(String),

    /// Two rules share an id.
    #[error("duplicate rule: {0}")]
    DuplicateRule(String),

    /// A name collides with a reserved identifier or namespace.
    #[error("reserved identifier: {0}")]
    ReservedIdentifier(String),

    /// A literal that has no exact solver representation (NaN, infinity).
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),

    /// The solver could not decide the problem.
    #[error("solver error: {0}")]
    Solver(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The rule (or fact/declaration) being processed.
    pub rule: Option<String>,
    /// Path of operators from the rule root to the failing node.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rule.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(rule) = &self.rule {
            write!(f, "in {rule}")?;
        }
        if !self.stack.is_empty() {
            if self.rule.is_some() {
                write!(f, " ")?;
            }
            write!(f, "at {}", self.stack.join(" > "))?;
        }
        Ok(())
    }
}
