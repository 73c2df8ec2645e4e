//! Type checking for rule expressions.
//!
//! Types flow bottom-up from declared variable types and literals and are
//! checked against each operator's signature. The output is a typed tree that
//! the lowering pass consumes without re-deriving anything.
//!
//! The flow is: `ConstraintProblem` → `SymbolTable` → `TypeChecker` → `TypedRule`

use std::collections::HashMap;

use lexsat_foundation::{Error, ErrorKind, Expected, Result, Type, Value};
use tracing::debug;

use crate::ast::{Expr, Operator};
use crate::declaration::ConstraintSpec;
use crate::problem::ConstraintProblem;
use crate::resolver::SymbolTable;


// =============================================================================
// Typed Tree
// =============================================================================

/// An expression node annotated with its type.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedExpr {
    /// The node's type.
    pub ty: Type,
    /// The node itself.
    pub node: TypedNode,
}

/// A typed node. Identifiers are already classified.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedNode {
    /// Literal value.
    Literal(Value),
    /// Declared input variable.
    Atomic(String),
    /// Another rule's helper.
    RuleRef(String),
    /// Operator application.
    Call(Operator, Vec<TypedExpr>),
}

impl TypedExpr {
    fn new(ty: Type, node: TypedNode) -> Self {
        Self { ty, node }
    }

    /// Returns the literal integer, if this node is one.
    #[must_use]
    pub fn as_int_literal(&self) -> Option<i64> {
        match &self.node {
            TypedNode::Literal(value) => value.as_int(),
            _ => None,
        }
    }
}

/// A rule that passed type checking.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedRule {
    /// Rule id.
    pub id: String,
    /// Result type: Bool, or the value type of a top-level CASE.
    pub ty: Type,
    /// Meta-rules stay out of penalty aggregation.
    pub meta: bool,
    /// Typed body.
    pub body: TypedExpr,
}

// =============================================================================
// Type Checker
// =============================================================================

/// Checks rule bodies against operator signatures.
pub struct TypeChecker<'a> {
    symbols: &'a SymbolTable,
    rule_types: HashMap<String, Type>,
}

impl<'a> TypeChecker<'a> {
    /// Creates a checker over resolved symbols.
    #[must_use]
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            rule_types: HashMap::new(),
        }
    }

    /// Checks every rule of a problem.
    ///
    /// Rules are checked dependency-first so a rule reference always sees its
    /// target's type; the result keeps the problem's rule order.
    ///
    /// # Errors
    /// Returns the first `TypeMismatch` or `ArityError`, attributed to its rule.
    pub fn check_problem(mut self, problem: &ConstraintProblem) -> Result<Vec<TypedRule>> {
        let mut typed: Vec<Option<TypedRule>> = vec![None; problem.rules().len()];
        for id in self.symbols.dependency_order() {
            let symbol = self
                .symbols
                .rule(id)
                .ok_or_else(|| Error::unknown_identifier(id.as_str()))?;
            let rule = &problem.rules()[symbol.index];
            let checked = self.check_rule(rule)?;
            typed[symbol.index] = Some(checked);
        }
        let rules: Vec<TypedRule> = typed.into_iter().flatten().collect();
        debug!(rules = rules.len(), "rules type checked");
        Ok(rules)
    }

    /// Checks one rule. Rules it references must already be checked.
    ///
    /// # Errors
    /// Returns `TypeMismatch` or `ArityError` attributed to the rule.
    pub fn check_rule(&mut self, rule: &ConstraintSpec) -> Result<TypedRule> {
        let body = self.check(&rule.expr).map_err(|e| e.in_rule(&rule.id))?;

        if !rule.expr.is_case() && body.ty != Type::Bool {
            return Err(
                Error::type_mismatch(rule.expr.to_string(), Expected::Type(Type::Bool), body.ty)
                    .in_rule(&rule.id),
            );
        }
        if let Some(helper) = self.symbols.rule(&rule.id).and_then(|s| s.helper) {
            if helper != body.ty {
                return Err(
                    Error::type_mismatch(rule.id.as_str(), Expected::Type(helper), body.ty)
                        .in_rule(&rule.id),
                );
            }
        }

        self.rule_types.insert(rule.id.clone(), body.ty);
        Ok(TypedRule {
            id: rule.id.clone(),
            ty: body.ty,
            meta: rule.is_meta(),
            body,
        })
    }

    /// Types one expression.
    ///
    /// # Errors
    /// Returns `TypeMismatch`, `ArityError`, or `UnknownIdentifier` for names
    /// the symbol table does not know.
    pub fn check(&self, expr: &Expr) -> Result<TypedExpr> {
        match expr {
            Expr::Literal(value) => check_literal(expr, value),
            Expr::Var(name) => {
                if let Some(ty) = self.symbols.atomic_type(name) {
                    Ok(TypedExpr::new(ty, TypedNode::Atomic(name.clone())))
                } else if self.symbols.is_rule(name) {
                    let ty = self.rule_types.get(name).copied().ok_or_else(|| {
                        Error::new(ErrorKind::Internal(format!(
                            "rule {name} referenced before it was checked"
                        )))
                    })?;
                    Ok(TypedExpr::new(ty, TypedNode::RuleRef(name.clone())))
                } else {
                    Err(Error::unknown_identifier(name.as_str()))
                }
            }
            Expr::Call(op, args) => self.check_call(*op, args),
        }
    }

    fn check_call(&self, op: Operator, args: &[Expr]) -> Result<TypedExpr> {
        let arity = op.arity();
        if !arity.accepts(args.len()) || (op == Operator::Case && args.len() % 2 == 0) {
            return Err(Error::arity(op.tag(), arity, args.len()));
        }

        let typed = args
            .iter()
            .map(|arg| self.check(arg))
            .collect::<Result<Vec<_>>>()?;

        let ty = match op {
            Operator::And | Operator::Or | Operator::Not => {
                expect_all(&typed, args, Expected::Type(Type::Bool))?;
                Type::Bool
            }
            Operator::Ge | Operator::Le | Operator::Gt | Operator::Lt => {
                expect_all(&typed, args, Expected::Numeric)?;
                Type::Bool
            }
            Operator::Eq => {
                let expected = match typed[0].ty {
                    Type::Bool => Expected::Type(Type::Bool),
                    Type::Int | Type::Real => Expected::Numeric,
                    Type::Str => {
                        return Err(Error::type_mismatch(
                            args[0].to_string(),
                            Expected::NumericOrBool,
                            Type::Str,
                        ));
                    }
                };
                expect(&typed[1], &args[1], expected)?;
                Type::Bool
            }
            Operator::Add
            | Operator::Sub
            | Operator::Mul
            | Operator::Div
            | Operator::Sum
            | Operator::Avg
            | Operator::Min
            | Operator::Max
            | Operator::Abs
            | Operator::Pow
            | Operator::Percent => {
                expect_all(&typed, args, Expected::Numeric)?;
                Type::Real
            }
            Operator::Round | Operator::Floor | Operator::Ceil => {
                expect(&typed[0], &args[0], Expected::Numeric)?;
                if let (Some(precision), Some(arg)) = (typed.get(1), args.get(1)) {
                    expect(precision, arg, Expected::Type(Type::Int))?;
                }
                Type::Real
            }
            Operator::IfNull => typed[0].ty.unify(typed[1].ty).ok_or_else(|| {
                Error::type_mismatch(args[1].to_string(), Expected::Type(typed[0].ty), typed[1].ty)
            })?,
            Operator::Case => case_type(&typed, args)?,
        };

        Ok(TypedExpr::new(ty, TypedNode::Call(op, typed)))
    }
}

fn check_literal(expr: &Expr, value: &Value) -> Result<TypedExpr> {
    match value {
        Value::Str(_) => Err(Error::type_mismatch(
            expr.to_string(),
            Expected::NumericOrBool,
            Type::Str,
        )),
        Value::Real(x) if !x.is_finite() => {
            Err(Error::new(ErrorKind::InvalidLiteral(x.to_string())))
        }
        _ => Ok(TypedExpr::new(
            value.value_type(),
            TypedNode::Literal(value.clone()),
        )),
    }
}

fn expect(typed: &TypedExpr, source: &Expr, expected: Expected) -> Result<()> {
    if expected.admits(typed.ty) {
        Ok(())
    } else {
        Err(Error::type_mismatch(source.to_string(), expected, typed.ty))
    }
}

fn expect_all(typed: &[TypedExpr], sources: &[Expr], expected: Expected) -> Result<()> {
    typed
        .iter()
        .zip(sources)
        .try_for_each(|(t, s)| expect(t, s, expected))
}

/// CASE conditions sit at even positions before the default; values at odd
/// positions and the last one. Values must unify.
fn case_type(typed: &[TypedExpr], sources: &[Expr]) -> Result<Type> {
    let last = typed.len() - 1;
    let mut ty: Option<Type> = None;
    for (i, (arg, source)) in typed.iter().zip(sources).enumerate() {
        if i % 2 == 0 && i != last {
            expect(arg, source, Expected::Type(Type::Bool))?;
            continue;
        }
        ty = Some(match ty {
            None => arg.ty,
            Some(current) => current.unify(arg.ty).ok_or_else(|| {
                Error::type_mismatch(source.to_string(), Expected::Type(current), arg.ty)
            })?,
        });
    }
    ty.ok_or_else(|| Error::arity(Operator::Case.tag(), Operator::Case.arity(), typed.len()))
}

/// Type checks every rule of a resolved problem.
///
/// # Errors
/// Returns the first typing error.
pub fn check_problem(problem: &ConstraintProblem, symbols: &SymbolTable) -> Result<Vec<TypedRule>> {
    TypeChecker::new(symbols).check_problem(problem)
}
