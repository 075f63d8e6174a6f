use crate::{
    db::{
        condition::{ConditionError, ConditionRule},
        query::{ElementQuery, ParamOperator, Predicate, QueryParam},
    },
    types::DateRange,
    value::Value,
};
use serde::{Deserialize, Serialize};

///
/// NumberConditionRule
///
/// Inclusive numeric range over one column or field. At least one
/// bound is required.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NumberConditionRule {
    pub field: String,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl NumberConditionRule {
    #[must_use]
    pub fn exactly(field: impl Into<String>, value: i64) -> Self {
        Self {
            field: field.into(),
            min: Some(value),
            max: Some(value),
        }
    }

    #[must_use]
    pub fn between(field: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            field: field.into(),
            min: Some(min),
            max: Some(max),
        }
    }

    #[must_use]
    pub fn at_least(field: impl Into<String>, min: i64) -> Self {
        Self {
            field: field.into(),
            min: Some(min),
            max: None,
        }
    }

    #[must_use]
    pub fn at_most(field: impl Into<String>, max: i64) -> Self {
        Self {
            field: field.into(),
            min: None,
            max: Some(max),
        }
    }
}

impl ConditionRule for NumberConditionRule {
    fn type_key(&self) -> &'static str {
        "number"
    }

    fn validate(&self) -> Result<(), ConditionError> {
        if self.min.is_none() && self.max.is_none() {
            return Err(ConditionError::InvalidConfig {
                rule: self.type_key(),
                detail: "at least one of min/max is required".to_string(),
            });
        }

        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            return Err(ConditionError::InvalidConfig {
                rule: self.type_key(),
                detail: format!("min {min} exceeds max {max}"),
            });
        }

        Ok(())
    }

    fn modify_query(&self, query: &mut ElementQuery<'_>) -> Result<(), ConditionError> {
        if let Some(min) = self.min {
            query.and_where(Predicate::gte(self.field.clone(), Value::Int(min)));
        }
        if let Some(max) = self.max {
            query.and_where(Predicate::lte(self.field.clone(), Value::Int(max)));
        }

        Ok(())
    }
}

///
/// TextOperator
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOperator {
    Contains,
    BeginsWith,
    EndsWith,
    #[default]
    Equals,
    NotEquals,
}

///
/// TextConditionRule
///
/// Text match over one column or field. `Equals`/`NotEquals` values
/// accept the engine-wide comma/operator syntax, so `"not foo,bar"`
/// excludes both.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TextConditionRule {
    pub field: String,
    pub operator: TextOperator,
    pub value: String,
}

impl TextConditionRule {
    #[must_use]
    pub fn new(field: impl Into<String>, operator: TextOperator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

impl ConditionRule for TextConditionRule {
    fn type_key(&self) -> &'static str {
        "text"
    }

    fn validate(&self) -> Result<(), ConditionError> {
        if self.value.trim().is_empty() {
            return Err(ConditionError::InvalidConfig {
                rule: self.type_key(),
                detail: "value must not be empty".to_string(),
            });
        }

        Ok(())
    }

    fn modify_query(&self, query: &mut ElementQuery<'_>) -> Result<(), ConditionError> {
        query.and_where(text_match(&self.field, self.operator, &self.value));

        Ok(())
    }
}

/// Build the predicate fragment for one text-operator match.
pub(crate) fn text_match(field: &str, operator: TextOperator, value: &str) -> Predicate {
    match operator {
        TextOperator::Contains => Predicate::contains_ci(field, Value::from(value)),
        TextOperator::BeginsWith => Predicate::starts_with(field, Value::from(value)),
        TextOperator::EndsWith => Predicate::ends_with(field, Value::from(value)),
        TextOperator::Equals | TextOperator::NotEquals => {
            let mut values = QueryParam::to_array(&Value::from(value));
            let negated = match QueryParam::extract_operator(&mut values) {
                Some(ParamOperator::Not) => true,
                _ => operator == TextOperator::NotEquals,
            };

            let values: Vec<Value> = values.into_iter().map(Value::from).collect();
            if negated {
                Predicate::not_in(field, values)
            } else {
                Predicate::in_(field, values)
            }
        }
    }
}

///
/// DateRangeConditionRule
///
/// Half-open date window (`after` inclusive, `before` exclusive) over
/// one timestamp column or field.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DateRangeConditionRule {
    pub field: String,
    pub range: DateRange,
}

impl DateRangeConditionRule {
    #[must_use]
    pub fn new(field: impl Into<String>, range: DateRange) -> Self {
        Self {
            field: field.into(),
            range,
        }
    }
}

impl ConditionRule for DateRangeConditionRule {
    fn type_key(&self) -> &'static str {
        "date_range"
    }

    fn validate(&self) -> Result<(), ConditionError> {
        if self.range.is_empty() {
            return Err(ConditionError::InvalidConfig {
                rule: self.type_key(),
                detail: "at least one of after/before is required".to_string(),
            });
        }

        if let (Some(after), Some(before)) = (self.range.after, self.range.before)
            && after >= before
        {
            return Err(ConditionError::InvalidConfig {
                rule: self.type_key(),
                detail: "after must precede before".to_string(),
            });
        }

        Ok(())
    }

    fn modify_query(&self, query: &mut ElementQuery<'_>) -> Result<(), ConditionError> {
        query.and_where(date_window(&self.field, self.range));

        Ok(())
    }
}

/// Build the predicate fragment for one date window.
pub(crate) fn date_window(field: &str, range: DateRange) -> Predicate {
    let mut parts = Vec::new();
    if let Some(after) = range.after {
        parts.push(Predicate::gte(field, Value::Timestamp(after)));
    }
    if let Some(before) = range.before {
        parts.push(Predicate::lt(field, Value::Timestamp(before)));
    }

    Predicate::And(parts)
}

///
/// LightswitchConditionRule
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LightswitchConditionRule {
    pub field: String,
    pub value: bool,
}

impl LightswitchConditionRule {
    #[must_use]
    pub fn new(field: impl Into<String>, value: bool) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

impl ConditionRule for LightswitchConditionRule {
    fn type_key(&self) -> &'static str {
        "lightswitch"
    }

    fn validate(&self) -> Result<(), ConditionError> {
        if self.field.is_empty() {
            return Err(ConditionError::InvalidConfig {
                rule: self.type_key(),
                detail: "field handle is required".to_string(),
            });
        }

        Ok(())
    }

    fn modify_query(&self, query: &mut ElementQuery<'_>) -> Result<(), ConditionError> {
        query.and_where(Predicate::eq(self.field.clone(), Value::Bool(self.value)));

        Ok(())
    }
}

///
/// SlugConditionRule
///
/// Native-column rule over `slug`. Declares the `slug` query param as
/// exclusive: combining it with a direct `slug(...)` call is a
/// configuration error.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SlugConditionRule {
    pub value: String,
}

impl SlugConditionRule {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl ConditionRule for SlugConditionRule {
    fn type_key(&self) -> &'static str {
        "slug"
    }

    fn validate(&self) -> Result<(), ConditionError> {
        if self.value.trim().is_empty() {
            return Err(ConditionError::InvalidConfig {
                rule: self.type_key(),
                detail: "value must not be empty".to_string(),
            });
        }

        Ok(())
    }

    fn exclusive_query_params(&self) -> &'static [&'static str] {
        &["slug"]
    }

    fn modify_query(&self, query: &mut ElementQuery<'_>) -> Result<(), ConditionError> {
        query.and_where(text_match("slug", TextOperator::Equals, &self.value));

        Ok(())
    }
}
