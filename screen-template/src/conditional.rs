//! The `If` primitive.

use crate::binder::Binder;
use crate::context::Context;
use crate::node::{Attributes, Node};
use crate::render::Rendered;
use crate::value::Value;

/// The comparison an `If` element performs against its `context` attribute.
///
/// Only one operator is expected per element; when several are present the first in
/// declaration order below wins.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Is(Value),
    IsNot(Value),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
    In(Value),
    NotIn(Value),
    Truthy,
}

impl Condition {
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let operators: [(&str, fn(Value) -> Condition); 8] = [
            ("is", Condition::Is),
            ("isNot", Condition::IsNot),
            ("$lt", Condition::Lt),
            ("$lte", Condition::Lte),
            ("$gt", Condition::Gt),
            ("$gte", Condition::Gte),
            ("$in", Condition::In),
            ("$notIn", Condition::NotIn),
        ];

        operators
            .into_iter()
            .find_map(|(name, make)| attributes.get(name).map(|v| make(v.clone())))
            .unwrap_or(Condition::Truthy)
    }

    /// Whether the children should render for `context`.
    ///
    /// Numeric comparisons coerce both sides to integers; if either side is not a
    /// number the comparison is false.
    pub fn holds(&self, context: &Value) -> bool {
        match self {
            Condition::Is(expected) => context == expected,
            Condition::IsNot(expected) => context != expected,
            Condition::Lt(bound) => compare(context, bound, |a, b| a < b),
            Condition::Lte(bound) => compare(context, bound, |a, b| a <= b),
            Condition::Gt(bound) => compare(context, bound, |a, b| a > b),
            Condition::Gte(bound) => compare(context, bound, |a, b| a >= b),
            Condition::In(set) => members(set).contains(context),
            Condition::NotIn(set) => !members(set).contains(context),
            Condition::Truthy => context.is_truthy(),
        }
    }
}

fn compare(context: &Value, bound: &Value, op: fn(i64, i64) -> bool) -> bool {
    match (context.to_int(), bound.to_int()) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}

/// A list is used as is; a string is split on commas and each element trimmed.
fn members(set: &Value) -> Vec<Value> {
    match set {
        Value::List(items) => items.clone(),
        Value::String(s) => s.split(',').map(|e| Value::from(e.trim())).collect(),
        other => vec![other.clone()],
    }
}

/// `context` values that mean "nothing to test": absent, null, or the literal markers.
pub fn is_absent_marker(context: Option<&Value>) -> bool {
    match context {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s == "undefined" || s == "null",
        Some(_) => false,
    }
}

/// Evaluate an `If` element. Children are bound against `state`, the whole binding
/// context the element was found in.
pub fn evaluate(
    binder: &Binder,
    attributes: &Attributes,
    children: &[Node],
    state: &Context,
    depth: usize,
) -> Rendered {
    let context = attributes.get("context");
    if is_absent_marker(context) {
        return Rendered::Empty;
    }
    let context = context.cloned().unwrap_or_default();

    if !Condition::from_attributes(attributes).holds(&context) {
        return Rendered::Empty;
    }
    Rendered::Fragment(binder.bind_at(children, state, depth))
}
