//! Symbol resolution and rule dependency ordering.
//!
//! Every identifier a rule mentions is either another rule (rule ids win) or
//! a declared atomic variable. Rule-to-rule references form a graph that must
//! be acyclic; the resolver checks this with a depth-first search over the
//! active path and records a dependency-first order for later passes.

use std::collections::{BTreeMap, HashMap};

use lexsat_foundation::{Error, Result, Type};
use tracing::debug;

use crate::problem::ConstraintProblem;

/// What an identifier refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    /// A declared input variable.
    Atomic(Type),
    /// The result of another rule.
    Rule,
}

/// A rule as seen by the resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleSymbol {
    /// Position of the rule in the problem.
    pub index: usize,
    /// Rules this rule references, in first-occurrence order.
    pub dependencies: Vec<String>,
    /// Type of a declaration sharing the rule's id, if any.
    pub helper: Option<Type>,
}

/// Resolved symbols for one constraint problem.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    atomics: BTreeMap<String, Type>,
    rules: BTreeMap<String, RuleSymbol>,
    order: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

impl SymbolTable {
    /// Resolves every identifier and checks the rule graph for cycles.
    ///
    /// # Errors
    /// Returns `UnknownIdentifier` for a name that is neither a rule id nor a
    /// declared variable, or `CyclicRuleReference` with the offending path.
    pub fn resolve(problem: &ConstraintProblem) -> Result<Self> {
        let mut table = Self::default();

        for (index, rule) in problem.rules().iter().enumerate() {
            table.rules.insert(
                rule.id.clone(),
                RuleSymbol {
                    index,
                    dependencies: Vec::new(),
                    helper: None,
                },
            );
        }

        for decl in problem.declarations() {
            match table.rules.get_mut(&decl.name) {
                Some(symbol) => symbol.helper = Some(decl.ty),
                None => {
                    table.atomics.insert(decl.name.clone(), decl.ty);
                }
            }
        }

        for rule in problem.rules() {
            let mut dependencies = Vec::new();
            for name in rule.expr.references_in_order() {
                if table.rules.contains_key(name) {
                    dependencies.push(name.to_string());
                } else if !table.atomics.contains_key(name) {
                    return Err(Error::unknown_identifier(name).in_rule(&rule.id));
                }
            }
            if let Some(symbol) = table.rules.get_mut(&rule.id) {
                symbol.dependencies = dependencies;
            }
        }

        table.order = table.topological_order(problem)?;
        debug!(
            atomics = table.atomics.len(),
            rules = table.rules.len(),
            "symbols resolved"
        );
        Ok(table)
    }

    fn topological_order(&self, problem: &ConstraintProblem) -> Result<Vec<String>> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut path = Vec::new();
        let mut order = Vec::with_capacity(self.rules.len());
        for rule in problem.rules() {
            self.visit(&rule.id, &mut marks, &mut path, &mut order)?;
        }
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        id: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        match marks.get(id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Active) => {
                let start = path.iter().position(|p| *p == id).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|p| (*p).to_string()).collect();
                cycle.push(id.to_string());
                return Err(Error::cyclic_reference(cycle));
            }
            None => {}
        }

        marks.insert(id, Mark::Active);
        path.push(id);
        if let Some(symbol) = self.rules.get(id) {
            for dependency in &symbol.dependencies {
                self.visit(dependency, marks, path, order)?;
            }
        }
        path.pop();
        marks.insert(id, Mark::Done);
        order.push(id.to_string());
        Ok(())
    }

    /// Classifies an identifier.
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<SymbolKind> {
        if self.rules.contains_key(name) {
            Some(SymbolKind::Rule)
        } else {
            self.atomics.get(name).copied().map(SymbolKind::Atomic)
        }
    }

    /// Returns true if `name` is a rule id.
    #[must_use]
    pub fn is_rule(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Declared type of an atomic variable.
    #[must_use]
    pub fn atomic_type(&self, name: &str) -> Option<Type> {
        self.atomics.get(name).copied()
    }

    /// Resolver view of a rule.
    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&RuleSymbol> {
        self.rules.get(id)
    }

    /// Atomic variables and their types, sorted by name.
    pub fn atomics(&self) -> impl Iterator<Item = (&str, Type)> {
        self.atomics.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// Rule ids with every dependency before its dependents.
    #[must_use]
    pub fn dependency_order(&self) -> &[String] {
        &self.order
    }
}
