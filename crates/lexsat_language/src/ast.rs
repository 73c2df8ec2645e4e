//! Abstract Syntax Tree for the rule expression language.
//!
//! Rule extractors emit expressions as JSON S-expression arrays such as
//! `["AND", ["GE", "CAR", 200.0], ["VAR", "insurance:plan_ok"]]`. The parser
//! turns those into this closed tree once; later passes never look at JSON.

use std::collections::BTreeSet;
use std::fmt;

use lexsat_foundation::{Arity, Value};

/// An expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Literal like `200.0`, `3` or `true`.
    Literal(Value),
    /// Reference to a declared variable or to another rule's result.
    Var(String),
    /// Operator applied to an ordered argument list.
    Call(Operator, Vec<Expr>),
}

impl Expr {
    /// Creates a literal node.
    #[must_use]
    pub fn lit(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Creates a variable reference.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// Creates an operator application.
    #[must_use]
    pub fn call(op: Operator, args: Vec<Expr>) -> Self {
        Self::Call(op, args)
    }

    /// Returns the top-level operator, if this is a call.
    #[must_use]
    pub const fn operator(&self) -> Option<Operator> {
        match self {
            Self::Call(op, _) => Some(*op),
            _ => None,
        }
    }

    /// Returns true if this is a CASE ladder.
    #[must_use]
    pub const fn is_case(&self) -> bool {
        matches!(self, Self::Call(Operator::Case, _))
    }

    /// All identifiers referenced anywhere in this expression, sorted.
    #[must_use]
    pub fn references(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_references(&mut names);
        names
    }

    /// Identifiers in first-occurrence order, without duplicates.
    #[must_use]
    pub fn references_in_order(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        let mut ordered = Vec::new();
        self.walk(&mut |expr| {
            if let Self::Var(name) = expr {
                if seen.insert(name.as_str()) {
                    ordered.push(name.as_str());
                }
            }
        });
        ordered
    }

    fn collect_references<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        self.walk(&mut |expr| {
            if let Self::Var(name) = expr {
                names.insert(name.as_str());
            }
        });
    }

    /// Pre-order traversal.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);
        if let Self::Call(_, args) = self {
            for arg in args {
                arg.walk(visit);
            }
        }
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }
}

impl fmt::Display for Expr {
    /// Renders the node back to its S-expression array form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Var(name) => write!(f, "[\"VAR\",{name:?}]"),
            Self::Call(op, args) => {
                write!(f, "[\"{}\"", op.tag())?;
                for arg in args {
                    write!(f, ",{arg}")?;
                }
                write!(f, "]")
            }
        }
    }
}

// =============================================================================
// Operators
// =============================================================================

/// The closed set of supported operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    /// Logical conjunction.
    And,
    /// Logical disjunction.
    Or,
    /// Logical negation.
    Not,
    /// Equality (numeric or bool).
    Eq,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// Addition.
    Add,
    /// Subtraction, left-associative.
    Sub,
    /// Multiplication.
    Mul,
    /// Real division, left-associative.
    Div,
    /// Sum of one or more values.
    Sum,
    /// Arithmetic mean.
    Avg,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
    /// Absolute value.
    Abs,
    /// Exponentiation.
    Pow,
    /// Round half up to a number of decimal places.
    Round,
    /// Round down to a number of decimal places.
    Floor,
    /// Round up to a number of decimal places.
    Ceil,
    /// First argument, falling back to the second (no nulls exist).
    IfNull,
    /// `value * 100`.
    Percent,
    /// Priority-ordered classification ladder.
    Case,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Operator; 24] = [
        Self::And,
        Self::Or,
        Self::Not,
        Self::Eq,
        Self::Ge,
        Self::Le,
        Self::Gt,
        Self::Lt,
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Sum,
        Self::Avg,
        Self::Min,
        Self::Max,
        Self::Abs,
        Self::Pow,
        Self::Round,
        Self::Floor,
        Self::Ceil,
        Self::IfNull,
        Self::Percent,
        Self::Case,
    ];

    /// Looks up an operator by its tag, ignoring ASCII case.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.tag().eq_ignore_ascii_case(tag))
    }

    /// The canonical upper-case tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Eq => "EQ",
            Self::Ge => "GE",
            Self::Le => "LE",
            Self::Gt => "GT",
            Self::Lt => "LT",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Abs => "ABS",
            Self::Pow => "POW",
            Self::Round => "ROUND",
            Self::Floor => "FLOOR",
            Self::Ceil => "CEIL",
            Self::IfNull => "IFNULL",
            Self::Percent => "PERCENT",
            Self::Case => "CASE",
        }
    }

    /// Accepted argument counts. CASE additionally needs an odd count.
    #[must_use]
    pub const fn arity(self) -> Arity {
        match self {
            Self::Not | Self::Abs | Self::Percent => Arity::Exact(1),
            Self::Eq | Self::Ge | Self::Le | Self::Gt | Self::Lt | Self::Pow | Self::IfNull => {
                Arity::Exact(2)
            }
            Self::And | Self::Or | Self::Sum | Self::Avg | Self::Min | Self::Max => {
                Arity::Variadic(1)
            }
            Self::Add | Self::Sub | Self::Mul | Self::Div => Arity::Variadic(2),
            Self::Round | Self::Floor | Self::Ceil => Arity::Range(1, 2),
            Self::Case => Arity::Variadic(3),
        }
    }

    /// Returns true for AND, OR and NOT.
    #[must_use]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Not)
    }

    /// Returns true for the ordering comparisons (GE, LE, GT, LT).
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Ge | Self::Le | Self::Gt | Self::Lt)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
