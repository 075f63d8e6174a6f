use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

///
/// Value
///
/// Runtime scalar vocabulary exchanged between element rows, predicates,
/// and condition rules. Interpretation (which comparisons are defined)
/// lives in the helpers below; evaluation treats undefined comparisons
/// as non-matches rather than errors.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Text(String),
    Timestamp(Timestamp),
    List(Vec<Value>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    // Numeric variants widen to i128 so Int and Uint compare cleanly.
    const fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(*v as i128),
            Self::Uint(v) => Some(*v as i128),
            Self::Timestamp(ts) => Some(ts.get() as i128),
            _ => None,
        }
    }

    ///
    /// Equality between two values, `None` when the comparison is not
    /// defined for the variant pair.
    ///
    #[must_use]
    pub fn compare_eq(&self, other: &Self) -> Option<bool> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(true),
            (Self::Bool(a), Self::Bool(b)) => Some(a == b),
            (Self::Text(a), Self::Text(b)) => Some(a == b),
            (Self::List(a), Self::List(b)) => Some(a == b),
            _ => match (self.as_i128(), other.as_i128()) {
                (Some(a), Some(b)) => Some(a == b),
                _ => None,
            },
        }
    }

    ///
    /// Ordering between two values, `None` when the variant pair has no
    /// defined order.
    ///
    #[must_use]
    pub fn compare_order(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => match (self.as_i128(), other.as_i128()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => None,
            },
        }
    }

    /// Case-sensitive or case-insensitive substring containment.
    #[must_use]
    pub fn text_contains(&self, needle: &Self, ci: bool) -> Option<bool> {
        let (haystack, needle) = (self.as_text()?, needle.as_text()?);

        if ci {
            Some(haystack.to_lowercase().contains(&needle.to_lowercase()))
        } else {
            Some(haystack.contains(needle))
        }
    }

    #[must_use]
    pub fn text_starts_with(&self, prefix: &Self) -> Option<bool> {
        Some(self.as_text()?.starts_with(prefix.as_text()?))
    }

    #[must_use]
    pub fn text_ends_with(&self, suffix: &Self) -> Option<bool> {
        Some(self.as_text()?.ends_with(suffix.as_text()?))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, ""),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Timestamp(v) => write!(f, "{v}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(","))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Timestamp> for Value {
    fn from(v: Timestamp) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl FromIterator<Self> for Value {
    fn from_iter<I: IntoIterator<Item = Self>>(iter: I) -> Self {
        Self::List(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_comparison_widens_across_int_and_uint() {
        assert_eq!(Value::Int(3).compare_eq(&Value::Uint(3)), Some(true));
        assert_eq!(
            Value::Uint(2).compare_order(&Value::Int(5)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn text_and_numbers_do_not_compare() {
        assert_eq!(Value::Text("3".into()).compare_eq(&Value::Int(3)), None);
        assert_eq!(Value::Text("a".into()).compare_order(&Value::Int(1)), None);
    }

    #[test]
    fn case_insensitive_containment() {
        let title = Value::from("Widget Factory");
        assert_eq!(title.text_contains(&Value::from("FACTORY"), true), Some(true));
        assert_eq!(title.text_contains(&Value::from("FACTORY"), false), Some(false));
        assert_eq!(Value::Int(1).text_contains(&Value::from("1"), true), None);
    }
}
