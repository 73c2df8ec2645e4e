//! Literal values for facts, expressions and solver models.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Type;

/// A literal value.
///
/// Facts supply values for atomic variables, expressions embed them as
/// literals, and solver models are read back into them.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// Real number, kept as the shortest decimal `f64`.
    Real(f64),
    /// String value. Only ever observed to be rejected, or as the textual
    /// form of a model value with no finite decimal representation.
    Str(String),
}

impl Value {
    /// Returns the type of this value.
    #[must_use]
    pub const fn value_type(&self) -> Type {
        match self {
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Real(_) => Type::Real,
            Self::Str(_) => Type::Str,
        }
    }

    /// Attempts to extract a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a number as f64 (converts int to real).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Real(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Exact `(numerator, denominator)` decimal strings for a numeric value.
    ///
    /// Reals are read from their shortest round-trip decimal form, so `2.97`
    /// becomes `("297", "100")` rather than the binary approximation.
    /// Returns `None` for non-numeric and non-finite values.
    #[must_use]
    pub fn decimal_ratio(&self) -> Option<(String, String)> {
        match self {
            Self::Int(n) => Some((n.to_string(), "1".to_string())),
            Self::Real(x) => decimal_ratio(*x),
            _ => None,
        }
    }
}

/// Splits a finite `f64` into exact decimal numerator and denominator.
///
/// `f64`'s `Display` never uses exponent notation, so the text is always
/// `[-]digits[.digits]`.
#[must_use]
pub fn decimal_ratio(x: f64) -> Option<(String, String)> {
    if !x.is_finite() {
        return None;
    }
    let text = format!("{x}");
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));

    let mut numerator = format!("{int_part}{frac_part}")
        .trim_start_matches('0')
        .to_string();
    if numerator.is_empty() {
        numerator.push('0');
    }
    if negative && numerator != "0" {
        numerator.insert(0, '-');
    }
    let denominator = format!("1{}", "0".repeat(frac_part.len()));
    Some((numerator, denominator))
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Real(x) => write!(f, "{x:?}"),
            Self::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Real(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
