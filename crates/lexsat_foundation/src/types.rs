//! Semantic types and operator signatures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic type of a variable or expression node.
///
/// Only `Bool`, `Int` and `Real` may be declared. `Str` exists so that string
/// literals can be named in type errors before they are rejected.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Type {
    /// Boolean type.
    #[serde(alias = "bool", alias = "Boolean")]
    Bool,
    /// Unbounded mathematical integer.
    #[serde(alias = "int", alias = "Integer")]
    Int,
    /// Exact rational number.
    #[serde(alias = "real", alias = "Float")]
    Real,
    /// String type (never valid in a constraint problem).
    #[serde(rename = "String", alias = "string", alias = "Str")]
    Str,
}

impl Type {
    /// Returns true for `Int` and `Real`.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Real)
    }

    /// Returns true if the type may appear in a declaration.
    #[must_use]
    pub const fn is_declarable(self) -> bool {
        !matches!(self, Self::Str)
    }

    /// Checks if a value of `value_type` is accepted where `self` is expected.
    ///
    /// Identical types match; `Real` also accepts `Int` (numeric promotion).
    #[must_use]
    pub const fn accepts(self, value_type: Type) -> bool {
        matches!(
            (self, value_type),
            (Self::Bool, Self::Bool)
                | (Self::Int | Self::Real, Self::Int)
                | (Self::Real, Self::Real)
                | (Self::Str, Self::Str)
        )
    }

    /// Least common type of two types, if one exists.
    ///
    /// Mixed `Int`/`Real` unify to `Real`; anything else must match exactly.
    #[must_use]
    pub const fn unify(self, other: Type) -> Option<Type> {
        match (self, other) {
            (Self::Bool, Self::Bool) => Some(Self::Bool),
            (Self::Int, Self::Int) => Some(Self::Int),
            (Self::Int | Self::Real, Self::Int | Self::Real) => Some(Self::Real),
            (Self::Str, Self::Str) => Some(Self::Str),
            _ => None,
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Real => write!(f, "real"),
            Self::Str => write!(f, "string"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a type check expected to find.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expected {
    /// Exactly this type (with numeric promotion where it applies).
    Type(Type),
    /// Any numeric type.
    Numeric,
    /// Any numeric type or bool.
    NumericOrBool,
}

impl Expected {
    /// Returns true if `actual` satisfies this expectation.
    #[must_use]
    pub const fn admits(self, actual: Type) -> bool {
        match self {
            Self::Type(ty) => ty.accepts(actual),
            Self::Numeric => actual.is_numeric(),
            Self::NumericOrBool => actual.is_numeric() || matches!(actual, Type::Bool),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(ty) => write!(f, "{ty}"),
            Self::Numeric => write!(f, "numeric (int or real)"),
            Self::NumericOrBool => write!(f, "numeric or bool"),
        }
    }
}

/// Operator arity specification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly N arguments.
    Exact(usize),
    /// Between min and max arguments (inclusive).
    Range(usize, usize),
    /// At least N arguments, then any number more.
    Variadic(usize),
}

impl Arity {
    /// Returns true if `count` arguments satisfy this arity.
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::Range(min, max) => count >= min && count <= max,
            Self::Variadic(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Range(min, max) => write!(f, "{min} to {max}"),
            Self::Variadic(min) => write!(f, "at least {min}"),
        }
    }
}
