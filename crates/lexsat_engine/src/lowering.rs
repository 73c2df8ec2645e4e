//! Lowering of typed rule expressions to Z3 terms.
//!
//! Every declared variable and every rule helper gets exactly one Z3
//! constant. Expressions then lower structurally:
//!
//! - CASE becomes a right-to-left chain of `ite`, so the first listed true
//!   condition wins.
//! - ABS, MIN and MAX become `ite` folds, AVG is sum over count.
//! - ROUND, FLOOR and CEIL scale by `10^p` around Z3's `to_int` (a floor).
//! - Real literals are taken exactly from their shortest decimal form.
//!
//! Int operands are promoted to Real wherever the node's type is Real.

use std::collections::BTreeMap;

use lexsat_foundation::{Error, ErrorKind, Result, Type, Value};
use lexsat_language::{Analysis, Operator, TypedExpr, TypedNode, TypedRule};
use z3::Context;
use z3::ast::{Ast, Bool, Int, Real};

// =============================================================================
// Terms
// =============================================================================

/// A Z3 term of one of the three declarable sorts.
#[derive(Clone, Debug)]
pub enum Term<'ctx> {
    /// Boolean term.
    Bool(Bool<'ctx>),
    /// Integer term.
    Int(Int<'ctx>),
    /// Real term.
    Real(Real<'ctx>),
}

impl<'ctx> Term<'ctx> {
    /// Creates a constant of the given type.
    ///
    /// # Errors
    /// Returns `Internal` for `Str`, which never reaches lowering.
    pub fn constant(ctx: &'ctx Context, name: &str, ty: Type) -> Result<Self> {
        match ty {
            Type::Bool => Ok(Self::Bool(Bool::new_const(ctx, name))),
            Type::Int => Ok(Self::Int(Int::new_const(ctx, name))),
            Type::Real => Ok(Self::Real(Real::new_const(ctx, name))),
            Type::Str => Err(internal(format!("string-typed constant {name}"))),
        }
    }

    /// The sort of this term.
    #[must_use]
    pub const fn ty(&self) -> Type {
        match self {
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Real(_) => Type::Real,
        }
    }

    /// Borrows the term as a Bool.
    ///
    /// # Errors
    /// Returns `Internal` for numeric terms.
    pub fn as_bool(&self) -> Result<&Bool<'ctx>> {
        match self {
            Self::Bool(b) => Ok(b),
            other => Err(internal(format!("expected bool term, got {}", other.ty()))),
        }
    }

    /// The term as a Real, promoting Int.
    ///
    /// # Errors
    /// Returns `Internal` for Bool terms.
    pub fn to_real(&self) -> Result<Real<'ctx>> {
        match self {
            Self::Int(i) => Ok(i.to_real()),
            Self::Real(r) => Ok(r.clone()),
            Self::Bool(_) => Err(internal("expected numeric term, got bool")),
        }
    }

    /// Converts to `ty`, promoting Int to Real.
    ///
    /// # Errors
    /// Returns `Internal` for any other conversion.
    pub fn coerce(self, ty: Type) -> Result<Self> {
        match (self, ty) {
            (term, ty) if term.ty() == ty => Ok(term),
            (Self::Int(i), Type::Real) => Ok(Self::Real(i.to_real())),
            (term, ty) => Err(internal(format!("cannot coerce {} to {ty}", term.ty()))),
        }
    }

    /// `self == other`, promoting mixed numeric sides to Real.
    ///
    /// # Errors
    /// Returns `Internal` when a Bool meets a number.
    pub fn equals(&self, other: &Self) -> Result<Bool<'ctx>> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Ok(a._eq(b)),
            (Self::Int(a), Self::Int(b)) => Ok(a._eq(b)),
            (a, b) => Ok(a.to_real()?._eq(&b.to_real()?)),
        }
    }

    /// `cond ? self : other`; both sides must share a sort.
    fn select(cond: &Bool<'ctx>, then: &Self, otherwise: &Self) -> Result<Self> {
        match (then, otherwise) {
            (Self::Bool(a), Self::Bool(b)) => Ok(Self::Bool(cond.ite(a, b))),
            (Self::Int(a), Self::Int(b)) => Ok(Self::Int(cond.ite(a, b))),
            (Self::Real(a), Self::Real(b)) => Ok(Self::Real(cond.ite(a, b))),
            (a, b) => Err(internal(format!(
                "ite branches differ: {} vs {}",
                a.ty(),
                b.ty()
            ))),
        }
    }
}

impl std::fmt::Display for Term<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
        }
    }
}

fn internal(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Internal(message.into()))
}

/// Exact Real literal from the shortest decimal form of `x`.
///
/// # Errors
/// Returns `InvalidLiteral` for non-finite values.
pub fn real_literal<'ctx>(ctx: &'ctx Context, x: f64) -> Result<Real<'ctx>> {
    let invalid = || Error::new(ErrorKind::InvalidLiteral(x.to_string()));
    let (numerator, denominator) =
        lexsat_foundation::value::decimal_ratio(x).ok_or_else(invalid)?;
    match numerator.strip_prefix('-') {
        Some(magnitude) => Real::from_real_str(ctx, magnitude, &denominator)
            .map(|r| r.unary_minus())
            .ok_or_else(invalid),
        None => Real::from_real_str(ctx, &numerator, &denominator).ok_or_else(invalid),
    }
}

/// Largest rounding precision accepted, in decimal places either way.
const MAX_PRECISION: u64 = 4096;

/// Exact `10^p` for a literal precision `p`.
fn power_of_ten<'ctx>(ctx: &'ctx Context, p: i64) -> Result<Real<'ctx>> {
    let invalid = || Error::new(ErrorKind::InvalidLiteral(format!("precision {p}")));
    if p.unsigned_abs() > MAX_PRECISION {
        return Err(invalid());
    }
    let zeros = usize::try_from(p.unsigned_abs()).map_err(|_| invalid())?;
    let scaled = format!("1{}", "0".repeat(zeros));
    let (numerator, denominator) = if p >= 0 {
        (scaled.as_str(), "1")
    } else {
        ("1", scaled.as_str())
    };
    Real::from_real_str(ctx, numerator, denominator).ok_or_else(invalid)
}

// =============================================================================
// Lowerer
// =============================================================================

/// Owns the Z3 constants of one problem and lowers typed expressions.
pub struct Lowerer<'ctx> {
    ctx: &'ctx Context,
    variables: BTreeMap<String, Term<'ctx>>,
    helpers: BTreeMap<String, Term<'ctx>>,
}

impl<'ctx> Lowerer<'ctx> {
    /// Declares one constant per atomic variable and one helper per rule.
    ///
    /// # Errors
    /// Returns `Internal` if an analysis carries an undeclarable type.
    pub fn new(ctx: &'ctx Context, analysis: &Analysis) -> Result<Self> {
        let variables = analysis
            .symbols
            .atomics()
            .map(|(name, ty)| Ok((name.to_string(), Term::constant(ctx, name, ty)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        let helpers = analysis
            .rules
            .iter()
            .map(|rule| Ok((rule.id.clone(), Term::constant(ctx, &rule.id, rule.ty)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self {
            ctx,
            variables,
            helpers,
        })
    }

    /// The Z3 context.
    #[must_use]
    pub const fn context(&self) -> &'ctx Context {
        self.ctx
    }

    /// Constant of an atomic variable.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Term<'ctx>> {
        self.variables.get(name)
    }

    /// Helper constant of a rule.
    #[must_use]
    pub fn helper(&self, id: &str) -> Option<&Term<'ctx>> {
        self.helpers.get(id)
    }

    /// Atomic variable constants, sorted by name.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &Term<'ctx>)> {
        self.variables.iter().map(|(name, term)| (name.as_str(), term))
    }

    /// Rule helper constants, sorted by rule id.
    pub fn helpers(&self) -> impl Iterator<Item = (&str, &Term<'ctx>)> {
        self.helpers.iter().map(|(id, term)| (id.as_str(), term))
    }

    /// Lowers a rule body, attributing errors to the rule.
    ///
    /// # Errors
    /// See [`Self::lower`].
    pub fn lower_rule(&self, rule: &TypedRule) -> Result<Term<'ctx>> {
        self.lower(&rule.body).map_err(|e| e.in_rule(&rule.id))
    }

    /// Lowers a literal to a constant term.
    ///
    /// # Errors
    /// Returns `InvalidLiteral` for non-finite reals, `Internal` for strings.
    pub fn literal(&self, value: &Value) -> Result<Term<'ctx>> {
        match value {
            Value::Bool(b) => Ok(Term::Bool(Bool::from_bool(self.ctx, *b))),
            Value::Int(n) => Ok(Term::Int(Int::from_i64(self.ctx, *n))),
            Value::Real(x) => real_literal(self.ctx, *x).map(Term::Real),
            Value::Str(s) => Err(internal(format!("string literal {s:?} reached lowering"))),
        }
    }

    /// Lowers a typed expression.
    ///
    /// # Errors
    /// Returns `InvalidLiteral` for unrepresentable literals, or `Internal`
    /// if the tree disagrees with its own type annotations.
    pub fn lower(&self, expr: &TypedExpr) -> Result<Term<'ctx>> {
        let term = match &expr.node {
            TypedNode::Literal(value) => self.literal(value)?,
            TypedNode::Atomic(name) => self
                .variables
                .get(name)
                .cloned()
                .ok_or_else(|| Error::unknown_identifier(name.as_str()))?,
            TypedNode::RuleRef(id) => self
                .helpers
                .get(id)
                .cloned()
                .ok_or_else(|| Error::unknown_identifier(id.as_str()))?,
            TypedNode::Call(op, args) => self.lower_call(*op, args, expr.ty)?,
        };
        term.coerce(expr.ty)
    }

    fn lower_all(&self, args: &[TypedExpr]) -> Result<Vec<Term<'ctx>>> {
        args.iter().map(|arg| self.lower(arg)).collect()
    }

    fn lower_reals(&self, args: &[TypedExpr]) -> Result<Vec<Real<'ctx>>> {
        args.iter().map(|arg| self.lower(arg)?.to_real()).collect()
    }

    fn lower_bools(&self, args: &[TypedExpr]) -> Result<Vec<Bool<'ctx>>> {
        args.iter()
            .map(|arg| self.lower(arg)?.as_bool().cloned())
            .collect()
    }

    fn lower_call(&self, op: Operator, args: &[TypedExpr], ty: Type) -> Result<Term<'ctx>> {
        let ctx = self.ctx;
        let term = match op {
            Operator::And | Operator::Or => {
                let operands = self.lower_bools(args)?;
                let refs: Vec<&Bool<'ctx>> = operands.iter().collect();
                if op == Operator::And {
                    Term::Bool(Bool::and(ctx, &refs))
                } else {
                    Term::Bool(Bool::or(ctx, &refs))
                }
            }
            Operator::Not => Term::Bool(self.lower(first(args)?)?.as_bool()?.not()),
            Operator::Eq => {
                let operands = self.lower_all(args)?;
                Term::Bool(operands[0].equals(&operands[1])?)
            }
            Operator::Ge | Operator::Le | Operator::Gt | Operator::Lt => {
                Term::Bool(self.lower_ordering(op, args)?)
            }
            Operator::Add | Operator::Sum => {
                let operands = self.lower_reals(args)?;
                Term::Real(Real::add(ctx, &operands.iter().collect::<Vec<_>>()))
            }
            Operator::Sub => {
                let operands = self.lower_reals(args)?;
                Term::Real(Real::sub(ctx, &operands.iter().collect::<Vec<_>>()))
            }
            Operator::Mul => {
                let operands = self.lower_reals(args)?;
                Term::Real(Real::mul(ctx, &operands.iter().collect::<Vec<_>>()))
            }
            Operator::Div => {
                let operands = self.lower_reals(args)?;
                let (head, tail) = operands
                    .split_first()
                    .ok_or_else(|| internal("DIV without operands"))?;
                Term::Real(tail.iter().fold(head.clone(), |acc, x| acc.div(x)))
            }
            Operator::Avg => {
                let operands = self.lower_reals(args)?;
                let count = i64::try_from(operands.len())
                    .map_err(|_| internal("AVG operand count overflows"))?;
                let sum = Real::add(ctx, &operands.iter().collect::<Vec<_>>());
                Term::Real(sum.div(&Int::from_i64(ctx, count).to_real()))
            }
            Operator::Min | Operator::Max => {
                let operands = self.lower_reals(args)?;
                let (head, tail) = operands
                    .split_first()
                    .ok_or_else(|| internal("MIN/MAX without operands"))?;
                Term::Real(tail.iter().fold(head.clone(), |acc, x| {
                    let pick_x = if op == Operator::Min { x.lt(&acc) } else { x.gt(&acc) };
                    pick_x.ite(x, &acc)
                }))
            }
            Operator::Abs => {
                let x = self.lower(first(args)?)?.to_real()?;
                let zero = Int::from_i64(ctx, 0).to_real();
                Term::Real(x.ge(&zero).ite(&x, &x.unary_minus()))
            }
            Operator::Pow => {
                let operands = self.lower_reals(args)?;
                Term::Real(operands[0].power(&operands[1]))
            }
            Operator::Percent => {
                let x = self.lower(first(args)?)?.to_real()?;
                let hundred = Int::from_i64(ctx, 100).to_real();
                Term::Real(Real::mul(ctx, &[&x, &hundred]))
            }
            Operator::Round | Operator::Floor | Operator::Ceil => {
                Term::Real(self.lower_rounding(op, args)?)
            }
            Operator::IfNull => self.lower(first(args)?)?,
            Operator::Case => self.lower_case(args, ty)?,
        };
        Ok(term)
    }

    fn lower_ordering(&self, op: Operator, args: &[TypedExpr]) -> Result<Bool<'ctx>> {
        let operands = self.lower_all(args)?;
        let result = match (&operands[0], &operands[1]) {
            (Term::Int(a), Term::Int(b)) => match op {
                Operator::Ge => a.ge(b),
                Operator::Le => a.le(b),
                Operator::Gt => a.gt(b),
                _ => a.lt(b),
            },
            (a, b) => {
                let (a, b) = (a.to_real()?, b.to_real()?);
                match op {
                    Operator::Ge => a.ge(&b),
                    Operator::Le => a.le(&b),
                    Operator::Gt => a.gt(&b),
                    _ => a.lt(&b),
                }
            }
        };
        Ok(result)
    }

    /// `floor(x * 10^p (+ 1/2)) / 10^p`; CEIL negates around the floor.
    fn lower_rounding(&self, op: Operator, args: &[TypedExpr]) -> Result<Real<'ctx>> {
        let ctx = self.ctx;
        let x = self.lower(first(args)?)?.to_real()?;
        let scale = match args.get(1) {
            None => power_of_ten(ctx, 0)?,
            Some(precision) => match precision.as_int_literal() {
                Some(p) => power_of_ten(ctx, p)?,
                None => {
                    let p = self.lower(precision)?.to_real()?;
                    Int::from_i64(ctx, 10).to_real().power(&p)
                }
            },
        };
        let scaled = Real::mul(ctx, &[&x, &scale]);
        let floored = match op {
            Operator::Round => {
                let half = real_literal(ctx, 0.5)?;
                Real::add(ctx, &[&scaled, &half]).to_int().to_real()
            }
            Operator::Floor => scaled.to_int().to_real(),
            _ => scaled.unary_minus().to_int().to_real().unary_minus(),
        };
        Ok(floored.div(&scale))
    }

    /// Right-to-left `ite` chain over `(condition, value)` pairs.
    fn lower_case(&self, args: &[TypedExpr], ty: Type) -> Result<Term<'ctx>> {
        let (default, pairs) = args
            .split_last()
            .ok_or_else(|| internal("CASE without a default"))?;
        let mut result = self.lower(default)?.coerce(ty)?;
        for pair in pairs.chunks(2).rev() {
            let [condition, value] = pair else {
                return Err(internal("CASE pair without a value"));
            };
            let condition = self.lower(condition)?;
            let value = self.lower(value)?.coerce(ty)?;
            result = Term::select(condition.as_bool()?, &value, &result)?;
        }
        Ok(result)
    }
}

fn first(args: &[TypedExpr]) -> Result<&TypedExpr> {
    args.first().ok_or_else(|| internal("operator without operands"))
}
