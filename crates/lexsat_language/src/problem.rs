//! The unit of compilation: one case's declarations, facts and rules.

use std::collections::HashSet;

use lexsat_foundation::{Error, ErrorKind, Expected, Result, Type, Value};
use tracing::{debug, warn};

use crate::declaration::{
    BOUND_PREFIX, CaseDocument, ConstraintRecord, ConstraintSpec, FACT_PREFIX, Fact,
    PENALTY_ASSERTION, PENALTY_VARIABLE, VariableDeclaration, parse_case_json, parse_rules_json,
};

/// A validated constraint problem.
///
/// Construction guarantees that declaration names and rule ids are unique,
/// that no rule uses a reserved id, that every fact names a declared variable
/// with a compatible value, and that the reserved `penalty` variable is
/// declared with a default `false` fact. The problem is never mutated after
/// construction.
#[derive(Clone, Debug)]
pub struct ConstraintProblem {
    declarations: Vec<VariableDeclaration>,
    facts: Vec<Fact>,
    rules: Vec<ConstraintSpec>,
}

impl ConstraintProblem {
    /// Validates the parts and builds a problem.
    ///
    /// # Errors
    /// Returns `DuplicateDeclaration`, `DuplicateRule`, `ReservedIdentifier`,
    /// `UnknownIdentifier` (fact for an undeclared variable), `TypeMismatch`
    /// or `InvalidLiteral`.
    pub fn new(
        mut declarations: Vec<VariableDeclaration>,
        mut facts: Vec<Fact>,
        rules: Vec<ConstraintSpec>,
    ) -> Result<Self> {
        if !declarations.iter().any(|d| d.name == PENALTY_VARIABLE) {
            declarations.push(VariableDeclaration::penalty());
        }
        if !facts.iter().any(|f| f.name == PENALTY_VARIABLE) {
            facts.push(Fact::new(PENALTY_VARIABLE, false));
        }

        validate_declarations(&declarations)?;
        validate_facts(&declarations, &facts)?;
        validate_rules(&rules)?;

        debug!(
            declarations = declarations.len(),
            facts = facts.len(),
            rules = rules.len(),
            "constraint problem built"
        );
        Ok(Self {
            declarations,
            facts,
            rules,
        })
    }

    /// Builds a problem from the two extractor documents.
    ///
    /// # Errors
    /// Returns any expression parse error or any error of [`Self::new`].
    pub fn from_documents(records: &[ConstraintRecord], case: CaseDocument) -> Result<Self> {
        let rules = records
            .iter()
            .map(ConstraintSpec::from_record)
            .collect::<Result<Vec<_>>>()?;
        let facts = case.fact_list();
        Self::new(case.varspecs, facts, rules)
    }

    /// Builds a problem from the two extractor documents as JSON text.
    ///
    /// # Errors
    /// Returns `ParseError` for malformed documents, or any error of [`Self::new`].
    pub fn from_json_str(rules_json: &str, case_json: &str) -> Result<Self> {
        let rules = parse_rules_json(rules_json)?;
        let case = parse_case_json(case_json)?;
        let facts = case.fact_list();
        Self::new(case.varspecs, facts, rules)
    }

    /// All declarations, in input order (`penalty` last if it was injected).
    #[must_use]
    pub fn declarations(&self) -> &[VariableDeclaration] {
        &self.declarations
    }

    /// All facts.
    #[must_use]
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// All rules, in input order.
    #[must_use]
    pub fn rules(&self) -> &[ConstraintSpec] {
        &self.rules
    }

    /// Looks up a declaration by name.
    #[must_use]
    pub fn declaration(&self, name: &str) -> Option<&VariableDeclaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// Looks up a rule by id.
    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&ConstraintSpec> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Looks up the fact for a variable.
    #[must_use]
    pub fn fact(&self, name: &str) -> Option<&Fact> {
        self.facts.iter().find(|f| f.name == name)
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_declarations(declarations: &[VariableDeclaration]) -> Result<()> {
    let mut seen = HashSet::new();
    for decl in declarations {
        if decl.name.is_empty() {
            return Err(Error::parse("declaration with an empty name"));
        }
        if !seen.insert(decl.name.as_str()) {
            return Err(Error::new(ErrorKind::DuplicateDeclaration(decl.name.clone())));
        }
        if !decl.ty.is_declarable() {
            return Err(Error::type_mismatch(
                decl.name.as_str(),
                Expected::NumericOrBool,
                decl.ty,
            ));
        }
        if decl.name == PENALTY_VARIABLE && decl.ty != Type::Bool {
            return Err(Error::type_mismatch(
                PENALTY_VARIABLE,
                Expected::Type(Type::Bool),
                decl.ty,
            ));
        }
        if let Some(domain) = &decl.domain {
            if !decl.ty.is_numeric() {
                return Err(Error::type_mismatch(
                    format!("domain of {}", decl.name),
                    Expected::Numeric,
                    decl.ty,
                ));
            }
            for bound in [domain.min, domain.max].into_iter().flatten() {
                if !bound.is_finite() {
                    return Err(Error::new(ErrorKind::InvalidLiteral(format!(
                        "domain bound {bound} of {}",
                        decl.name
                    ))));
                }
            }
        }
    }
    Ok(())
}

fn validate_facts(declarations: &[VariableDeclaration], facts: &[Fact]) -> Result<()> {
    let mut seen = HashSet::new();
    for fact in facts {
        if !seen.insert(fact.name.as_str()) {
            return Err(Error::new(ErrorKind::DuplicateDeclaration(format!(
                "{FACT_PREFIX}{}",
                fact.name
            ))));
        }
        let decl = declarations
            .iter()
            .find(|d| d.name == fact.name)
            .ok_or_else(|| Error::unknown_identifier(fact.name.as_str()).in_rule("facts"))?;
        if let Value::Real(x) = fact.value {
            if !x.is_finite() {
                return Err(Error::new(ErrorKind::InvalidLiteral(format!(
                    "{x} for {}",
                    fact.name
                ))));
            }
        }
        let actual = fact.value.value_type();
        if !decl.ty.accepts(actual) {
            return Err(Error::type_mismatch(
                format!("{} = {}", fact.name, fact.value),
                Expected::Type(decl.ty),
                actual,
            ));
        }
    }
    Ok(())
}

fn validate_rules(rules: &[ConstraintSpec]) -> Result<()> {
    let mut seen = HashSet::new();
    for rule in rules {
        if rule.id.is_empty() {
            return Err(Error::parse("rule with an empty id"));
        }
        if is_reserved(&rule.id) {
            return Err(Error::new(ErrorKind::ReservedIdentifier(rule.id.clone())));
        }
        if !seen.insert(rule.id.as_str()) {
            return Err(Error::new(ErrorKind::DuplicateRule(rule.id.clone())));
        }
        if rule.namespace().is_none() {
            warn!(rule = %rule.id, "rule id has no <domain>: namespace");
        }
    }
    Ok(())
}

/// Returns true for ids a rule may not take.
#[must_use]
pub fn is_reserved(id: &str) -> bool {
    id == PENALTY_VARIABLE
        || id == PENALTY_ASSERTION
        || id.starts_with(BOUND_PREFIX)
        || id.starts_with(FACT_PREFIX)
}
