//! In-process filter evaluation
//!
//! No type coercion. Range operators only compare numbers with numbers and
//! strings with strings. A missing or null field fails every operator
//! except `$ne`.

use std::cmp::Ordering;

use serde_json::Value;

use super::ast::{Constraint, Filter, FilterOp};

impl Filter {
    /// Checks if a document satisfies every part of the filter
    pub fn matches(&self, document: &Value) -> bool {
        self.fields()
            .all(|(field, constraint)| constraint_matches(document.get(field), constraint))
            && self.and_members().iter().all(|m| m.matches(document))
    }
}

fn constraint_matches(actual: Option<&Value>, constraint: &Constraint) -> bool {
    match constraint {
        Constraint::Eq(expected) => op_matches(actual, &FilterOp::Eq(expected.clone())),
        Constraint::Ops(ops) => ops.iter().all(|op| op_matches(actual, op)),
    }
}

fn op_matches(actual: Option<&Value>, op: &FilterOp) -> bool {
    let actual = match actual {
        Some(v) if !v.is_null() => v,
        _ => return matches!(op, FilterOp::Ne(bound) if !bound.is_null()),
    };

    match op {
        FilterOp::Eq(expected) => values_equal(actual, expected),
        FilterOp::Ne(expected) => !values_equal(actual, expected),
        FilterOp::In(values) => values.iter().any(|v| values_equal(actual, v)),
        FilterOp::Gt(bound) => compare_values(actual, bound) == Some(Ordering::Greater),
        FilterOp::Gte(bound) => matches!(
            compare_values(actual, bound),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOp::Lt(bound) => compare_values(actual, bound) == Some(Ordering::Less),
        FilterOp::Lte(bound) => matches!(
            compare_values(actual, bound),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

/// Equality without coercion; `1` and `1.0` are the same number
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

/// Orders two values of the same comparable type
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(xi), Some(yi)) = (x.as_i64(), y.as_i64()) {
                return Some(xi.cmp(&yi));
            }
            if let (Some(xu), Some(yu)) = (x.as_u64(), y.as_u64()) {
                return Some(xu.cmp(&yu));
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(xf), Some(yf)) => xf.partial_cmp(&yf),
                _ => None,
            }
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order used for sorting.
///
/// Missing < null < bool < number < string < array < object; values of the
/// same type use their natural order, arrays and objects compare equal.
pub fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => rank(x)
            .cmp(&rank(y))
            .then_with(|| compare_values(x, y).unwrap_or(Ordering::Equal)),
    }
}
