use serde::{Deserialize, Serialize};

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

///
/// OrderSpec
///
/// Canonical ordered mapping of column → direction.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct OrderSpec {
    pub columns: Vec<(String, OrderDirection)>,
}

impl OrderSpec {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, name: impl Into<String>, direction: OrderDirection) -> Self {
        self.columns.push((name.into(), direction));
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

///
/// OrderBy
///
/// Free-form ordering input: a column name, a `"column dir"` string, a
/// comma-joined multi-column string, or a pre-built spec.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OrderBy {
    Raw(String),
    Spec(OrderSpec),
}

impl From<&str> for OrderBy {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

impl From<String> for OrderBy {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

impl From<OrderSpec> for OrderBy {
    fn from(spec: OrderSpec) -> Self {
        Self::Spec(spec)
    }
}

///
/// Canonicalize free-form ordering input.
///
/// Column names and direction tokens are whitespace-trimmed. Direction
/// defaults to ascending when omitted; unknown direction tokens are
/// ascending (permissive, matching long-standing caller expectations,
/// not an error).
///
#[must_use]
pub fn normalize_order_by(order: &OrderBy) -> OrderSpec {
    match order {
        OrderBy::Spec(spec) => OrderSpec {
            columns: spec
                .columns
                .iter()
                .map(|(name, direction)| (name.trim().to_string(), *direction))
                .filter(|(name, _)| !name.is_empty())
                .collect(),
        },

        OrderBy::Raw(raw) => {
            let mut spec = OrderSpec::new();

            for part in raw.split(',') {
                let mut tokens = part.split_whitespace();
                let Some(name) = tokens.next() else {
                    continue;
                };

                let direction = match tokens.next() {
                    Some(token) if token.eq_ignore_ascii_case("desc") => OrderDirection::Desc,
                    _ => OrderDirection::Asc,
                };

                spec.columns.push((name.to_string(), direction));
            }

            spec
        }
    }
}
