use crate::{
    db::{
        element::Element,
        query::predicate::ast::{CompareOp, ComparePredicate, Predicate},
    },
    value::Value,
};
use std::cmp::Ordering;

///
/// FieldPresence
///
/// Result of attempting to read a column or field from a row during
/// predicate evaluation. Distinguishes a missing field from a present
/// field whose value is `Null`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum FieldPresence {
    /// Field exists and has a value (including `Value::Null`).
    Present(Value),
    /// Field is not present on the row.
    Missing,
}

///
/// Row
///
/// Abstraction over a row-like value that can expose fields by name.
/// Decouples predicate evaluation from the concrete element type.
///

pub(crate) trait Row {
    fn field(&self, name: &str) -> FieldPresence;
}

impl Row for Element {
    fn field(&self, name: &str) -> FieldPresence {
        match self.value(name) {
            Some(value) => FieldPresence::Present(value),
            None => FieldPresence::Missing,
        }
    }
}

// Evaluate a field predicate only when the field is present.
fn on_present<R: Row + ?Sized>(row: &R, field: &str, f: impl FnOnce(&Value) -> bool) -> bool {
    match row.field(field) {
        FieldPresence::Present(value) => f(&value),
        FieldPresence::Missing => false,
    }
}

///
/// Evaluate a predicate against a single row.
///
/// Pure runtime evaluation: no store access, no planning. Any
/// undefined comparison simply evaluates to `false`.
///
#[must_use]
pub(crate) fn eval<R: Row + ?Sized>(row: &R, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::True => true,
        Predicate::False => false,

        Predicate::And(children) => children.iter().all(|child| eval(row, child)),
        Predicate::Or(children) => children.iter().any(|child| eval(row, child)),
        Predicate::Not(inner) => !eval(row, inner),

        Predicate::Compare(cmp) => eval_compare(row, cmp),

        Predicate::IsNull { field } => {
            matches!(row.field(field), FieldPresence::Present(Value::Null))
        }

        Predicate::IsNotNull { field } => on_present(row, field, |value| !value.is_null()),
    }
}

///
/// Evaluate a single comparison predicate against a row.
///
/// Returns `false` if the field is missing or the comparison is not
/// defined for the value pair.
///
fn eval_compare<R: Row + ?Sized>(row: &R, cmp: &ComparePredicate) -> bool {
    let ComparePredicate { field, op, value } = cmp;

    let FieldPresence::Present(actual) = row.field(field) else {
        return false;
    };

    // NOTE: comparison helpers return None when a comparison is invalid;
    // eval treats that as false.
    match op {
        CompareOp::Eq => actual.compare_eq(value).unwrap_or(false),
        CompareOp::Ne => actual.compare_eq(value).is_some_and(|v| !v),

        CompareOp::Lt => actual.compare_order(value).is_some_and(Ordering::is_lt),
        CompareOp::Lte => actual.compare_order(value).is_some_and(Ordering::is_le),
        CompareOp::Gt => actual.compare_order(value).is_some_and(Ordering::is_gt),
        CompareOp::Gte => actual.compare_order(value).is_some_and(Ordering::is_ge),

        CompareOp::In => in_list(&actual, value).unwrap_or(false),
        CompareOp::NotIn => in_list(&actual, value).is_some_and(|matched| !matched),

        CompareOp::Contains => contains(&actual, value),

        CompareOp::ContainsCi => actual.text_contains(value, true).unwrap_or(false),
        CompareOp::StartsWith => actual.text_starts_with(value).unwrap_or(false),
        CompareOp::EndsWith => actual.text_ends_with(value).unwrap_or(false),
    }
}

///
/// Check whether a value equals any element in a list.
///
fn in_list(actual: &Value, list: &Value) -> Option<bool> {
    let Value::List(items) = list else {
        return None;
    };

    let mut saw_valid = false;
    for item in items {
        match actual.compare_eq(item) {
            Some(true) => return Some(true),
            Some(false) => saw_valid = true,
            None => {}
        }
    }

    saw_valid.then_some(false)
}

///
/// Check whether a collection contains another value.
///
/// CONTRACT: text substring matching uses ContainsCi only.
///
fn contains(actual: &Value, needle: &Value) -> bool {
    let Value::List(items) = actual else {
        return false;
    };

    items
        .iter()
        // Invalid comparisons are treated as non-matches.
        .any(|item| item.compare_eq(needle).unwrap_or(false))
}
