//! Parser for JSON S-expression rule expressions.
//!
//! Accepted forms:
//! - `["VAR", "name"]` - identifier reference
//! - `["OP", arg, ...]` - operator application (tags are case-insensitive)
//! - `"name"` - bare identifier reference
//! - numbers and booleans - literals
//!
//! Inside CASE value positions a bare string is a *string literal*, kept so the
//! type checker can reject stringly-typed classification with a proper error.

use lexsat_foundation::{Error, ErrorContext, Result, Value};
use serde_json::Value as Json;

use crate::ast::{Expr, Operator};

/// Where a JSON node sits relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Position {
    Operand,
    CaseValue,
}

/// Parse one expression from its JSON form.
///
/// # Errors
/// Returns `ParseError` for malformed forms and `UnknownOperator` for tags
/// outside the supported set.
pub fn parse_expr(json: &Json) -> Result<Expr> {
    parse_node(json, Position::Operand)
}

/// Parse one expression from JSON text.
///
/// # Errors
/// Returns `ParseError` if the text is not JSON, or any error of [`parse_expr`].
pub fn parse_expr_str(text: &str) -> Result<Expr> {
    let json: Json =
        serde_json::from_str(text).map_err(|e| Error::parse(format!("invalid JSON: {e}")))?;
    parse_expr(&json)
}

fn parse_node(json: &Json, position: Position) -> Result<Expr> {
    match json {
        Json::Null => Err(Error::parse("null is not an expression")),
        Json::Bool(b) => Ok(Expr::Literal(Value::Bool(*b))),
        Json::Number(n) => parse_number(n).map(Expr::Literal),
        Json::String(s) => match position {
            Position::CaseValue => Ok(Expr::Literal(Value::Str(s.clone()))),
            Position::Operand if s.is_empty() => Err(Error::parse("empty identifier")),
            Position::Operand => Ok(Expr::Var(s.clone())),
        },
        Json::Object(_) => Err(Error::parse("objects are not expressions")),
        Json::Array(items) => parse_list(items),
    }
}

fn parse_number(n: &serde_json::Number) -> Result<Value> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::Int(i));
    }
    if n.is_u64() {
        return Err(Error::parse(format!("integer literal out of range: {n}")));
    }
    n.as_f64()
        .filter(|x| x.is_finite())
        .map(Value::Real)
        .ok_or_else(|| Error::parse(format!("unrepresentable number: {n}")))
}

fn parse_list(items: &[Json]) -> Result<Expr> {
    let Some((head, tail)) = items.split_first() else {
        return Err(Error::parse("empty list"));
    };
    let Json::String(tag) = head else {
        return Err(Error::parse(format!(
            "expected an operator tag at list head, found {head}"
        )));
    };

    if tag.eq_ignore_ascii_case("VAR") {
        return match tail {
            [Json::String(name)] if !name.is_empty() => Ok(Expr::Var(name.clone())),
            _ => Err(Error::parse(format!(
                "VAR takes exactly one identifier, found {}",
                Json::Array(tail.to_vec())
            ))),
        };
    }

    let op = Operator::from_tag(tag).ok_or_else(|| Error::unknown_operator(tag.as_str()))?;
    let last = tail.len().saturating_sub(1);
    let args = tail
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            let position = if op == Operator::Case && (i % 2 == 1 || i == last) {
                Position::CaseValue
            } else {
                Position::Operand
            };
            parse_node(arg, position).map_err(|e| push_frame(e, format!("{op} arg {}", i + 1)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Expr::Call(op, args))
}

/// Prepends a frame so that the outermost operator reads first.
fn push_frame(mut err: Error, frame: String) -> Error {
    let mut context = err.context.take().unwrap_or_else(ErrorContext::new);
    context.stack.insert(0, frame);
    err.with_context(context)
}

/// Render an expression back to its JSON form.
#[must_use]
pub fn to_json(expr: &Expr) -> Json {
    match expr {
        Expr::Literal(value) => match value {
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::from(*n),
            Value::Real(x) => serde_json::Number::from_f64(*x).map_or(Json::Null, Json::Number),
            Value::Str(s) => Json::String(s.clone()),
        },
        Expr::Var(name) => Json::Array(vec![Json::from("VAR"), Json::from(name.as_str())]),
        Expr::Call(op, args) => {
            let mut items = Vec::with_capacity(args.len() + 1);
            items.push(Json::from(op.tag()));
            items.extend(args.iter().map(to_json));
            Json::Array(items)
        }
    }
}
