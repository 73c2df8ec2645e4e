//! Solve orchestration.
//!
//! Compiles a problem into a fresh Z3 context, checks it with soft facts on
//! an optimizer, and on UNSAT replays the hard assertions on a plain solver
//! with one tracking literal each to extract a (minimal) unsat core.

use std::collections::{BTreeMap, HashMap};
use std::iter::Peekable;
use std::str::SplitWhitespace;

use lexsat_foundation::{Error, Result, Type, Value};
use lexsat_language::ConstraintProblem;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use z3::ast::Bool;
use z3::{Config, Context, Model, Optimize, SatResult, Solver};

use crate::config::SolveConfig;
use crate::emitter::{AssertionKind, AssertionSet, CompiledProblem, compile};
use crate::lowering::Term;

// =============================================================================
// Results
// =============================================================================

/// Outcome of solving one problem. UNSAT is a result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum SolveResult {
    /// A model exists.
    Satisfiable(Assignment),
    /// The hard assertions conflict.
    Unsatisfiable(UnsatCore),
}

impl SolveResult {
    /// Returns true for a satisfiable result.
    #[must_use]
    pub const fn is_sat(&self) -> bool {
        matches!(self, Self::Satisfiable(_))
    }

    /// The assignment, if satisfiable.
    #[must_use]
    pub const fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Satisfiable(assignment) => Some(assignment),
            Self::Unsatisfiable(_) => None,
        }
    }

    /// The core, if unsatisfiable.
    #[must_use]
    pub const fn core(&self) -> Option<&UnsatCore> {
        match self {
            Self::Satisfiable(_) => None,
            Self::Unsatisfiable(core) => Some(core),
        }
    }
}

/// A satisfying model, read back into plain values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Every declared variable and every rule helper.
    pub values: BTreeMap<String, Value>,
    /// Facts the model had to give up, by variable name.
    pub dropped_facts: Vec<String>,
    /// Bool rules that evaluate false, in rule order.
    pub failed_rules: Vec<String>,
}

impl Assignment {
    /// Value of a variable or rule helper.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Value of the `penalty` variable.
    #[must_use]
    pub fn penalty(&self) -> Option<bool> {
        self.get(lexsat_language::declaration::PENALTY_VARIABLE)
            .and_then(Value::as_bool)
    }
}

/// One member of an unsat core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreEntry {
    /// Assertion id.
    pub id: String,
    /// What the assertion encodes.
    pub kind: AssertionKind,
}

/// Conflicting hard assertions, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsatCore {
    /// Core members.
    pub entries: Vec<CoreEntry>,
}

impl UnsatCore {
    /// Assertion ids in emission order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    /// Returns true if `id` is in the core.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// A declared domain bound takes part in the conflict.
    #[must_use]
    pub fn is_domain_violation(&self) -> bool {
        self.entries.iter().any(|e| e.kind == AssertionKind::Bound)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true for an empty core.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Compiles and solves problems under one configuration.
///
/// Every call owns a fresh Z3 context; nothing is shared between calls.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    config: SolveConfig,
}

impl Orchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(config: SolveConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SolveConfig {
        &self.config
    }

    fn context(&self) -> Context {
        let mut cfg = Config::new();
        cfg.set_model_generation(true);
        if let Some(timeout) = self.config.timeout_ms {
            cfg.set_param_value("timeout", &timeout.to_string());
        }
        Context::new(&cfg)
    }

    /// Renders the compiled assertion set as SMT-LIB text.
    ///
    /// # Errors
    /// Returns any compile-time error.
    pub fn emit_smt(&self, problem: &ConstraintProblem) -> Result<String> {
        let ctx = self.context();
        let compiled = compile(&ctx, problem, &self.config)?;
        Ok(compiled.assertions.to_string())
    }

    /// Compiles and solves a problem.
    ///
    /// # Errors
    /// Returns any compile-time error, or `Solver` if Z3 answers `unknown`.
    pub fn solve(&self, problem: &ConstraintProblem) -> Result<SolveResult> {
        let ctx = self.context();
        let compiled = compile(&ctx, problem, &self.config)?;
        info!(
            rules = compiled.analysis.rules.len(),
            assertions = compiled.assertions.len(),
            "solving"
        );

        let optimizer = Optimize::new(&ctx);
        for assertion in compiled.assertions.hard() {
            optimizer.assert(&assertion.formula);
        }
        for assertion in compiled.assertions.soft() {
            optimizer.assert_soft(&assertion.formula, assertion.weight, None);
        }

        let result = match optimizer.check(&[]) {
            SatResult::Sat => {
                let model = optimizer
                    .get_model()
                    .ok_or_else(|| Error::solver("sat without a model"))?;
                SolveResult::Satisfiable(read_assignment(&compiled, &model))
            }
            SatResult::Unsat => {
                SolveResult::Unsatisfiable(self.extract_core(&ctx, &compiled.assertions)?)
            }
            SatResult::Unknown => {
                let reason = optimizer
                    .get_reason_unknown()
                    .unwrap_or_else(|| "unknown".to_string());
                return Err(Error::solver(reason));
            }
        };

        match &result {
            SolveResult::Satisfiable(assignment) => info!(
                penalty = ?assignment.penalty(),
                dropped = assignment.dropped_facts.len(),
                failed = assignment.failed_rules.len(),
                "satisfiable"
            ),
            SolveResult::Unsatisfiable(core) => info!(core = ?core.ids(), "unsatisfiable"),
        }
        Ok(result)
    }

    /// Replays the hard assertions with tracking literals and reads the core.
    fn extract_core<'ctx>(
        &self,
        ctx: &'ctx Context,
        assertions: &AssertionSet<'ctx>,
    ) -> Result<UnsatCore> {
        let solver = Solver::new(ctx);
        let hard: Vec<_> = assertions.hard().collect();
        let trackers: Vec<Bool<'ctx>> = hard
            .iter()
            .map(|_| Bool::fresh_const(ctx, "track"))
            .collect();
        for (tracker, assertion) in trackers.iter().zip(&hard) {
            solver.assert(&tracker.implies(&assertion.formula));
        }

        let by_name: HashMap<String, usize> = trackers
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();

        match solver.check_assumptions(&trackers) {
            SatResult::Unsat => {}
            SatResult::Sat => {
                return Err(Error::solver(
                    "optimizer reported unsat but the hard assertions are satisfiable",
                ));
            }
            SatResult::Unknown => {
                let reason = solver
                    .get_reason_unknown()
                    .unwrap_or_else(|| "unknown".to_string());
                return Err(Error::solver(reason));
            }
        }

        let mut core: Vec<usize> = solver
            .get_unsat_core()
            .iter()
            .filter_map(|lit| by_name.get(&lit.to_string()).copied())
            .collect();
        core.sort_unstable();
        core.dedup();
        debug!(size = core.len(), "raw unsat core");

        if self.config.minimize_core {
            core = minimize(&solver, &trackers, core)?;
            debug!(size = core.len(), "minimized unsat core");
        }

        Ok(UnsatCore {
            entries: core
                .into_iter()
                .map(|i| CoreEntry {
                    id: hard[i].id.clone(),
                    kind: hard[i].kind,
                })
                .collect(),
        })
    }
}

/// Deletion-based minimization: drop each member whose removal keeps the
/// remaining set unsatisfiable.
fn minimize<'ctx>(
    solver: &Solver<'ctx>,
    trackers: &[Bool<'ctx>],
    mut core: Vec<usize>,
) -> Result<Vec<usize>> {
    let mut i = 0;
    while i < core.len() {
        let candidate: Vec<Bool<'ctx>> = core
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, &k)| trackers[k].clone())
            .collect();
        match solver.check_assumptions(&candidate) {
            SatResult::Unsat => {
                core.remove(i);
            }
            SatResult::Sat => i += 1,
            SatResult::Unknown => {
                let reason = solver
                    .get_reason_unknown()
                    .unwrap_or_else(|| "unknown".to_string());
                return Err(Error::solver(reason));
            }
        }
    }
    Ok(core)
}

fn read_assignment(compiled: &CompiledProblem<'_>, model: &Model<'_>) -> Assignment {
    let lowerer = &compiled.lowerer;
    let values = lowerer
        .variables()
        .chain(lowerer.helpers())
        .filter_map(|(name, term)| read_value(model, term).map(|v| (name.to_string(), v)))
        .collect();

    let dropped_facts = compiled
        .assertions
        .soft()
        .filter(|a| model.eval(&a.formula, true).and_then(|b| b.as_bool()) == Some(false))
        .map(|a| {
            a.id.strip_prefix(lexsat_language::declaration::FACT_PREFIX)
                .unwrap_or(&a.id)
                .to_string()
        })
        .collect();

    let failed_rules = compiled
        .analysis
        .rules
        .iter()
        .filter(|rule| rule.ty == Type::Bool)
        .filter(|rule| {
            lowerer
                .helper(&rule.id)
                .and_then(|term| read_value(model, term))
                == Some(Value::Bool(false))
        })
        .map(|rule| rule.id.clone())
        .collect();

    Assignment {
        values,
        dropped_facts,
        failed_rules,
    }
}

/// Evaluates a term with model completion.
#[allow(clippy::cast_precision_loss)]
fn read_value(model: &Model<'_>, term: &Term<'_>) -> Option<Value> {
    match term {
        Term::Bool(b) => model.eval(b, true)?.as_bool().map(Value::Bool),
        Term::Int(i) => {
            let v = model.eval(i, true)?;
            Some(v.as_i64().map_or_else(|| Value::Str(v.to_string()), Value::Int))
        }
        Term::Real(r) => {
            let v = model.eval(r, true)?;
            Some(match v.as_real() {
                Some((numerator, denominator)) if denominator != 0 => {
                    Value::Real(numerator as f64 / denominator as f64)
                }
                _ => {
                    let text = v.to_string();
                    parse_real_numeral(&text).map_or(Value::Str(text), Value::Real)
                }
            })
        }
    }
}

/// Reads Z3's printed form of a rational numeral: a decimal, `(- x)` or
/// `(/ x y)`. Used when the value does not fit `i64` parts.
fn parse_real_numeral(text: &str) -> Option<f64> {
    let spaced = text.replace('(', " ( ").replace(')', " ) ");
    let mut tokens = spaced.split_whitespace().peekable();
    let value = numeral_expr(&mut tokens)?;
    tokens.next().is_none().then_some(value)
}

fn numeral_expr(tokens: &mut Peekable<SplitWhitespace<'_>>) -> Option<f64> {
    match tokens.next()? {
        "(" => {
            let op = tokens.next()?;
            let mut operands = Vec::new();
            while tokens.peek().copied() != Some(")") {
                operands.push(numeral_expr(tokens)?);
            }
            tokens.next();
            match (op, operands.as_slice()) {
                ("-", [x]) => Some(-*x),
                ("-", [x, y]) => Some(*x - *y),
                ("/", [x, y]) => Some(*x / *y),
                _ => None,
            }
        }
        ")" => None,
        literal => literal.parse::<f64>().ok().filter(|x| x.is_finite()),
    }
}

/// Solves a problem with the default configuration.
///
/// # Errors
/// See [`Orchestrator::solve`].
pub fn solve(problem: &ConstraintProblem) -> Result<SolveResult> {
    Orchestrator::default().solve(problem)
}
