//! Declaration type definitions.
//!
//! Typed records for everything the external extractors hand to the core:
//! variable declarations and facts from the fact extractor, constraint specs
//! from the rule extractor.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use lexsat_foundation::{Error, Result, Type, Value};
use serde::{Deserialize, Serialize};

use crate::ast::{Expr, Operator};
use crate::parser::{parse_expr, to_json};

/// The reserved aggregate variable.
pub const PENALTY_VARIABLE: &str = "penalty";
/// Assertion id of the penalty aggregation law.
pub const PENALTY_ASSERTION: &str = "meta:penalty_aggregation";
/// Namespace of domain bound assertions.
pub const BOUND_PREFIX: &str = "bound:";
/// Namespace of fact assertions.
pub const FACT_PREFIX: &str = "fact:";
/// Namespace of meta-rules, which never feed the penalty.
pub const META_NAMESPACE: &str = "meta";

// =============================================================================
// Variable Declarations
// =============================================================================

/// Inclusive domain bound of a numeric variable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// Lower bound, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Domain {
    /// Creates a domain bounded on both sides.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Returns true if neither side is bounded.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// Where a declaration came from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provenance {
    /// Read from the case narrative, optionally with the matching keyword.
    FromText(Option<String>),
    /// Filled in with a default value.
    #[default]
    Default,
    /// Derived from a classification rule rather than observed.
    Derived,
}

impl FromStr for Provenance {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "default" => Self::Default,
            "derived" | "derived_from_case" => Self::Derived,
            "from-text" | "from_text" | "case_text" => Self::FromText(None),
            other => match other.strip_prefix("case_text:") {
                Some(keyword) => Self::FromText(Some(keyword.to_string())),
                None => Self::FromText(Some(other.to_string())),
            },
        })
    }
}

impl From<String> for Provenance {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(provenance) => provenance,
            Err(never) => match never {},
        }
    }
}

impl From<Provenance> for String {
    fn from(p: Provenance) -> Self {
        p.to_string()
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromText(Some(keyword)) => write!(f, "case_text:{keyword}"),
            Self::FromText(None) => write!(f, "from-text"),
            Self::Default => write!(f, "default"),
            Self::Derived => write!(f, "derived"),
        }
    }
}

/// A typed, optionally bounded atomic variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    /// Unique, case-sensitive name.
    pub name: String,
    /// Semantic type.
    #[serde(rename = "type")]
    pub ty: Type,
    /// Unit label such as `%` or `hours`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Inclusive bounds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    /// Provenance tag.
    #[serde(default)]
    pub source: Provenance,
}

impl VariableDeclaration {
    /// Creates an unbounded declaration.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            unit: None,
            domain: None,
            source: Provenance::Default,
        }
    }

    /// The reserved `penalty` declaration.
    #[must_use]
    pub fn penalty() -> Self {
        Self::new(PENALTY_VARIABLE, Type::Bool)
    }

    /// Sets the unit label.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets an inclusive `[min, max]` domain.
    #[must_use]
    pub fn with_domain(mut self, min: f64, max: f64) -> Self {
        self.domain = Some(Domain::new(min, max));
        self
    }

    /// Sets the provenance tag.
    #[must_use]
    pub fn with_source(mut self, source: Provenance) -> Self {
        self.source = source;
        self
    }
}

/// A concrete observed value for one variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Fact {
    /// The declared variable.
    pub name: String,
    /// The observed value.
    pub value: Value,
}

impl Fact {
    /// Creates a fact.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The fact extractor's output document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CaseDocument {
    /// Variable declarations.
    #[serde(default)]
    pub varspecs: Vec<VariableDeclaration>,
    /// Observed values by variable name.
    #[serde(default)]
    pub facts: BTreeMap<String, Value>,
}

impl CaseDocument {
    /// Facts in name order.
    #[must_use]
    pub fn fact_list(&self) -> Vec<Fact> {
        self.facts
            .iter()
            .map(|(name, value)| Fact::new(name.clone(), value.clone()))
            .collect()
    }
}

// =============================================================================
// Constraint Specs
// =============================================================================

fn default_weight() -> u32 {
    1
}

/// A rule exactly as the rule extractor writes it, expression still JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRecord {
    /// Rule id, `<domain>:<slug>`.
    pub id: String,
    /// Human description.
    #[serde(default)]
    pub desc: String,
    /// S-expression array.
    pub expr: serde_json::Value,
    /// Inert weighting metadata.
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Domain tag.
    #[serde(default)]
    pub domain: String,
}

/// A parsed rule.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstraintSpec {
    /// Globally unique id.
    pub id: String,
    /// Human description.
    pub desc: String,
    /// Stored but never used to weight anything.
    pub weight: u32,
    /// Domain tag (`insurance`, `labor`, ...).
    pub domain: String,
    /// The rule body.
    pub expr: Expr,
}

impl ConstraintSpec {
    /// Creates a rule with default weight; the domain tag is the id's namespace.
    pub fn new(id: impl Into<String>, expr: Expr) -> Self {
        let id = id.into();
        let domain = namespace_of(&id).unwrap_or_default().to_string();
        Self {
            id,
            desc: String::new(),
            weight: 1,
            domain,
            expr,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    /// Sets the weight.
    #[must_use]
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the domain tag.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Parses a record's expression.
    ///
    /// # Errors
    /// Returns the parser's error, attributed to the record's id.
    pub fn from_record(record: &ConstraintRecord) -> Result<Self> {
        let expr = parse_expr(&record.expr).map_err(|e| e.in_rule(&record.id))?;
        let domain = if record.domain.is_empty() {
            namespace_of(&record.id).unwrap_or_default().to_string()
        } else {
            record.domain.clone()
        };
        Ok(Self {
            id: record.id.clone(),
            desc: record.desc.clone(),
            weight: record.weight,
            domain,
            expr,
        })
    }

    /// Converts back to the extractor's record form.
    #[must_use]
    pub fn to_record(&self) -> ConstraintRecord {
        ConstraintRecord {
            id: self.id.clone(),
            desc: self.desc.clone(),
            expr: to_json(&self.expr),
            weight: self.weight,
            domain: self.domain.clone(),
        }
    }

    /// The `<domain>` part of the id, if namespaced.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        namespace_of(&self.id)
    }

    /// Meta-rules describe the rule set itself and never feed the penalty.
    #[must_use]
    pub fn is_meta(&self) -> bool {
        self.namespace() == Some(META_NAMESPACE) || self.domain == META_NAMESPACE
    }

    /// Returns true if the rule binds a classification value.
    #[must_use]
    pub fn is_classification(&self) -> bool {
        self.expr.operator() == Some(Operator::Case)
    }
}

fn namespace_of(id: &str) -> Option<&str> {
    id.split_once(':').map(|(ns, _)| ns).filter(|ns| !ns.is_empty())
}

/// Parses the rule extractor's JSON array.
///
/// # Errors
/// Returns `ParseError` for malformed JSON or any expression parse error.
pub fn parse_rules_json(text: &str) -> Result<Vec<ConstraintSpec>> {
    let records: Vec<ConstraintRecord> = serde_json::from_str(text)
        .map_err(|e| Error::parse(format!("invalid constraint spec document: {e}")))?;
    records.iter().map(ConstraintSpec::from_record).collect()
}

/// Parses the fact extractor's JSON object.
///
/// # Errors
/// Returns `ParseError` for malformed JSON.
pub fn parse_case_json(text: &str) -> Result<CaseDocument> {
    serde_json::from_str(text).map_err(|e| Error::parse(format!("invalid case document: {e}")))
}
