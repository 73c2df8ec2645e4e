//! Constraint emission.
//!
//! Wraps domain bounds, rules, the penalty law and facts into named
//! assertions. Bounds, rules and the penalty law are hard and tracked so they
//! can appear in an unsat core; facts are soft and may be dropped.

use std::fmt;

use lexsat_foundation::{Error, Result, Type};
use lexsat_language::declaration::{BOUND_PREFIX, FACT_PREFIX, PENALTY_ASSERTION, PENALTY_VARIABLE};
use lexsat_language::{Analysis, ConstraintProblem, analyze};
use serde::{Deserialize, Serialize};
use tracing::debug;
use z3::Context;
use z3::ast::{Ast, Bool};

use crate::config::{RuleMode, SolveConfig};
use crate::lowering::{Lowerer, Term, real_literal};

// =============================================================================
// Assertions
// =============================================================================

/// What an assertion encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionKind {
    /// A declared domain bound (`bound:<var>:min` / `:max`).
    Bound,
    /// An observed fact (`fact:<var>`), soft.
    Fact,
    /// A rule, named by its id.
    Rule,
    /// The penalty aggregation law.
    Penalty,
}

impl AssertionKind {
    /// Hard assertions must hold; only facts may be dropped.
    #[must_use]
    pub const fn is_hard(self) -> bool {
        !matches!(self, Self::Fact)
    }
}

impl fmt::Display for AssertionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bound => write!(f, "bound"),
            Self::Fact => write!(f, "fact"),
            Self::Rule => write!(f, "rule"),
            Self::Penalty => write!(f, "penalty"),
        }
    }
}

/// A named formula.
#[derive(Debug, Clone)]
pub struct Assertion<'ctx> {
    /// Assertion id, unique within a set.
    pub id: String,
    /// What the formula encodes.
    pub kind: AssertionKind,
    /// The formula.
    pub formula: Bool<'ctx>,
    /// Soft weight; zero for hard assertions.
    pub weight: u32,
}

/// All assertions of one problem, in emission order.
#[derive(Debug, Clone, Default)]
pub struct AssertionSet<'ctx> {
    assertions: Vec<Assertion<'ctx>>,
    declarations: Vec<(String, Type)>,
}

impl<'ctx> AssertionSet<'ctx> {
    fn push(&mut self, id: impl Into<String>, kind: AssertionKind, formula: Bool<'ctx>) {
        self.push_weighted(id, kind, formula, 0);
    }

    fn push_weighted(
        &mut self,
        id: impl Into<String>,
        kind: AssertionKind,
        formula: Bool<'ctx>,
        weight: u32,
    ) {
        self.assertions.push(Assertion {
            id: id.into(),
            kind,
            formula,
            weight,
        });
    }

    /// Every assertion, in emission order.
    #[must_use]
    pub fn assertions(&self) -> &[Assertion<'ctx>] {
        &self.assertions
    }

    /// Hard assertions, in emission order.
    pub fn hard(&self) -> impl Iterator<Item = &Assertion<'ctx>> {
        self.assertions.iter().filter(|a| a.kind.is_hard())
    }

    /// Soft assertions, in emission order.
    pub fn soft(&self) -> impl Iterator<Item = &Assertion<'ctx>> {
        self.assertions.iter().filter(|a| !a.kind.is_hard())
    }

    /// Looks up an assertion by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Assertion<'ctx>> {
        self.assertions.iter().find(|a| a.id == id)
    }

    /// Number of assertions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assertions.len()
    }

    /// Returns true if nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }
}

/// Renders the set as an SMT-LIB script: constant declarations in name
/// order, then each assertion in emission order.
impl fmt::Display for AssertionSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, ty) in &self.declarations {
            let sort = match ty {
                Type::Bool => "Bool",
                Type::Int => "Int",
                _ => "Real",
            };
            writeln!(f, "(declare-const {} {sort})", quote_symbol(name))?;
        }
        for assertion in &self.assertions {
            let name = quote_symbol(&assertion.id);
            if assertion.kind.is_hard() {
                writeln!(f, "(assert (! {} :named {name}))", assertion.formula)?;
            } else {
                writeln!(
                    f,
                    "(assert-soft {} :weight {} :id {name})",
                    assertion.formula, assertion.weight
                )?;
            }
        }
        Ok(())
    }
}

/// SMT-LIB symbol, `|quoted|` unless it is a plain simple symbol.
fn quote_symbol(name: &str) -> String {
    let simple = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "~!@$%^&*_-+=<>.?/".contains(c));
    if simple {
        name.to_string()
    } else {
        format!("|{name}|")
    }
}

// =============================================================================
// Emitter
// =============================================================================

/// A problem compiled into one Z3 context.
pub struct CompiledProblem<'ctx> {
    /// Constants and lowering state.
    pub lowerer: Lowerer<'ctx>,
    /// Resolution and typing results.
    pub analysis: Analysis,
    /// The emitted assertions.
    pub assertions: AssertionSet<'ctx>,
}

/// Builds the assertion set of a problem.
pub struct Emitter<'a, 'ctx> {
    problem: &'a ConstraintProblem,
    analysis: &'a Analysis,
    lowerer: &'a Lowerer<'ctx>,
    mode: RuleMode,
}

impl<'a, 'ctx> Emitter<'a, 'ctx> {
    /// Creates an emitter over an analyzed problem.
    #[must_use]
    pub fn new(
        problem: &'a ConstraintProblem,
        analysis: &'a Analysis,
        lowerer: &'a Lowerer<'ctx>,
        mode: RuleMode,
    ) -> Self {
        Self {
            problem,
            analysis,
            lowerer,
            mode,
        }
    }

    /// Emits bounds, rules, the penalty law and facts, in that order.
    ///
    /// # Errors
    /// Returns `InvalidLiteral` for unrepresentable bounds or facts, or any
    /// lowering error.
    pub fn emit(&self, fact_weight: u32) -> Result<AssertionSet<'ctx>> {
        let mut set = AssertionSet::default();
        set.declarations = self
            .lowerer
            .variables()
            .chain(self.lowerer.helpers())
            .map(|(name, term)| (name.to_string(), term.ty()))
            .collect();
        set.declarations.sort();

        self.emit_bounds(&mut set)?;
        self.emit_rules(&mut set)?;
        self.emit_penalty(&mut set)?;
        self.emit_facts(&mut set, fact_weight)?;

        debug!(
            assertions = set.len(),
            hard = set.hard().count(),
            soft = set.soft().count(),
            "assertions emitted"
        );
        Ok(set)
    }

    /// Constant a declaration names: an atomic variable, or the helper of the
    /// rule a derived classification declaration is named after.
    fn declared_term(&self, name: &str) -> Result<&Term<'ctx>> {
        self.lowerer
            .variable(name)
            .or_else(|| self.lowerer.helper(name))
            .ok_or_else(|| Error::unknown_identifier(name))
    }

    fn emit_bounds(&self, set: &mut AssertionSet<'ctx>) -> Result<()> {
        let ctx = self.lowerer.context();
        for decl in self.problem.declarations() {
            let Some(domain) = decl.domain else { continue };
            let term = self.declared_term(&decl.name)?.to_real()?;
            if let Some(min) = domain.min {
                let bound = real_literal(ctx, min)?;
                set.push(
                    format!("{BOUND_PREFIX}{}:min", decl.name),
                    AssertionKind::Bound,
                    term.ge(&bound),
                );
            }
            if let Some(max) = domain.max {
                let bound = real_literal(ctx, max)?;
                set.push(
                    format!("{BOUND_PREFIX}{}:max", decl.name),
                    AssertionKind::Bound,
                    term.le(&bound),
                );
            }
        }
        Ok(())
    }

    fn emit_rules(&self, set: &mut AssertionSet<'ctx>) -> Result<()> {
        let ctx = self.lowerer.context();
        for rule in &self.analysis.rules {
            let helper = self
                .lowerer
                .helper(&rule.id)
                .ok_or_else(|| Error::unknown_identifier(rule.id.as_str()))?;
            let body = self.lowerer.lower_rule(rule)?;
            let binding = helper.equals(&body)?;
            let formula = match (self.mode, helper) {
                (RuleMode::Enforce, Term::Bool(holds)) => Bool::and(ctx, &[&binding, holds]),
                _ => binding,
            };
            set.push(rule.id.clone(), AssertionKind::Rule, formula);
        }
        Ok(())
    }

    /// `penalty == OR(NOT r)` over non-meta Bool rules; `false` without any.
    ///
    /// A top-level CASE whose branches are Bool is a Bool rule too, so a
    /// `false` classification raises the penalty like any failing check.
    fn emit_penalty(&self, set: &mut AssertionSet<'ctx>) -> Result<()> {
        let ctx = self.lowerer.context();
        let penalty = self
            .lowerer
            .variable(PENALTY_VARIABLE)
            .ok_or_else(|| Error::unknown_identifier(PENALTY_VARIABLE))?
            .as_bool()?;

        let violations = self
            .analysis
            .rules
            .iter()
            .filter(|rule| rule.ty == Type::Bool && !rule.meta)
            .map(|rule| {
                self.lowerer
                    .helper(&rule.id)
                    .ok_or_else(|| Error::unknown_identifier(rule.id.as_str()))
                    .and_then(Term::as_bool)
                    .map(Bool::not)
            })
            .collect::<Result<Vec<_>>>()?;

        let any_violated = if violations.is_empty() {
            Bool::from_bool(ctx, false)
        } else {
            Bool::or(ctx, &violations.iter().collect::<Vec<_>>())
        };
        set.push(PENALTY_ASSERTION, AssertionKind::Penalty, penalty._eq(&any_violated));
        Ok(())
    }

    /// Observed facts weigh twice the base so that none is ever given up to
    /// keep the `penalty = false` presumption, which weighs the base.
    fn emit_facts(&self, set: &mut AssertionSet<'ctx>, base_weight: u32) -> Result<()> {
        for fact in self.problem.facts() {
            let weight = if fact.name == PENALTY_VARIABLE {
                base_weight
            } else {
                base_weight.saturating_mul(2)
            };
            let variable = self.declared_term(&fact.name)?;
            let value = self
                .lowerer
                .literal(&fact.value)
                .map_err(|e| e.in_rule(format!("{FACT_PREFIX}{}", fact.name)))?;
            set.push_weighted(
                format!("{FACT_PREFIX}{}", fact.name),
                AssertionKind::Fact,
                variable.equals(&value)?,
                weight,
            );
        }
        Ok(())
    }
}

/// Analyzes, lowers and emits a problem into `ctx`.
///
/// # Errors
/// Returns the first compile-time error; nothing partial is returned.
pub fn compile<'ctx>(
    ctx: &'ctx Context,
    problem: &ConstraintProblem,
    config: &SolveConfig,
) -> Result<CompiledProblem<'ctx>> {
    let analysis = analyze(problem)?;
    let lowerer = Lowerer::new(ctx, &analysis)?;
    let assertions =
        Emitter::new(problem, &analysis, &lowerer, config.rule_mode).emit(config.fact_weight)?;
    Ok(CompiledProblem {
        lowerer,
        analysis,
        assertions,
    })
}
