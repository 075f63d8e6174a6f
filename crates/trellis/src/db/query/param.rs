use crate::value::Value;
use serde::{Deserialize, Serialize};

// Sentinel used to keep escaped commas out of the split pass.
const ESCAPED_COMMA: char = '\u{0}';

///
/// ParamOperator
///
/// Boolean operator keyword recognized at the head of a multi-value
/// parameter.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamOperator {
    And,
    Or,
    Not,
}

impl ParamOperator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            _ => None,
        }
    }
}

///
/// QueryParam
///
/// Canonicalization rules shared by every multi-value parameter in the
/// engine (ids, slugs, statuses, …) and reused standalone by condition
/// rules that accept the same comma/operator syntax.
///

pub struct QueryParam;

impl QueryParam {
    ///
    /// Canonicalize a raw parameter value into an array of strings.
    ///
    /// Strings split on commas; `\,` escapes a literal comma; empty
    /// segments collapse; each element is trimmed. Lists pass through
    /// element-wise. Any other scalar becomes a single element.
    ///
    #[must_use]
    pub fn to_array(value: &Value) -> Vec<String> {
        match value {
            Value::Null => Vec::new(),
            Value::Text(s) => Self::split(s),
            Value::List(items) => items.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        }
    }

    ///
    /// Remove and return the operator keyword at the head of `values`,
    /// if present. The input is left untouched otherwise. Must run
    /// before value-matching so `"not 1,2,3"` excludes 1, 2, and 3
    /// instead of matching the literal string `"not 1"`.
    ///
    /// Comma splitting fuses the keyword onto the first value
    /// (`"not 1,2,3"` → `["not 1", "2", "3"]`), so a first element
    /// that *starts with* an operator word is split there.
    ///
    pub fn extract_operator(values: &mut Vec<String>) -> Option<ParamOperator> {
        let first = values.first()?;

        if let Some(operator) = ParamOperator::parse(first) {
            values.remove(0);
            return Some(operator);
        }

        let (word, rest) = first.split_once(char::is_whitespace)?;
        let operator = ParamOperator::parse(word)?;

        let rest = rest.trim_start();
        if rest.is_empty() {
            values.remove(0);
        } else {
            values[0] = rest.to_string();
        }

        Some(operator)
    }

    fn split(raw: &str) -> Vec<String> {
        let protected = raw.replace("\\,", &ESCAPED_COMMA.to_string());

        protected
            .split(',')
            .map(|part| part.trim().replace(ESCAPED_COMMA, ","))
            .filter(|part| !part.is_empty())
            .collect()
    }
}
