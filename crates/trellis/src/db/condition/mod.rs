pub mod registry;
pub mod rules;

pub use registry::{FieldDef, FieldRegistry, RuleFactory};
pub use rules::{
    DateRangeConditionRule, LightswitchConditionRule, NumberConditionRule, SlugConditionRule,
    TextConditionRule, TextOperator,
};

use crate::{
    db::query::ElementQuery,
    error::{EngineError, ErrorClass, ErrorOrigin},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error as ThisError;

///
/// ConditionError
///

#[derive(Debug, ThisError)]
pub enum ConditionError {
    #[error("condition rule '{rule}' has invalid configuration: {detail}")]
    InvalidConfig { rule: &'static str, detail: String },

    #[error("condition rule '{rule}' conflicts with the '{param}' query param, which was set directly")]
    ExclusiveParam {
        rule: &'static str,
        param: &'static str,
    },

    #[error("no field registered for handle '{handle}'")]
    UnknownField { handle: String },

    #[error("field '{handle}' contributes no query-level filter")]
    NoRuleForField { handle: String },
}

impl ConditionError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidConfig { .. } | Self::UnknownField { .. } | Self::NoRuleForField { .. } => {
                ErrorClass::InvalidParams
            }
            Self::ExclusiveParam { .. } => ErrorClass::Conflict,
        }
    }
}

impl From<ConditionError> for EngineError {
    fn from(err: ConditionError) -> Self {
        Self::new(err.class(), ErrorOrigin::Condition, err.to_string())
    }
}

///
/// ConditionRule
///
/// Pluggable predicate object: validates its own configuration, then
/// mutates a query through the query's mutation contract (`and_where`,
/// `merge_related_to`, `restrict_to_ids`).
///

pub trait ConditionRule: fmt::Debug {
    /// Stable type key identifying the rule kind.
    fn type_key(&self) -> &'static str;

    /// Validate the rule's own parameter value.
    fn validate(&self) -> Result<(), ConditionError>;

    /// Native query params this rule refuses to be combined with.
    fn exclusive_query_params(&self) -> &'static [&'static str] {
        &[]
    }

    /// Contribute this rule's fragments to the query.
    fn modify_query(&self, query: &mut ElementQuery<'_>) -> Result<(), ConditionError>;
}

///
/// ConditionOperator
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionOperator {
    #[default]
    All,
    Any,
}

///
/// Condition
///
/// Ordered set of rules combined with a boolean operator. `All` has
/// each rule mutate the same query in sequence; `Any` mutates a cloned
/// query per branch and unions the per-branch result-id sets.
///

#[derive(Debug, Default)]
pub struct Condition {
    operator: ConditionOperator,
    rules: Vec<Box<dyn ConditionRule>>,
}

impl Condition {
    #[must_use]
    pub fn all() -> Self {
        Self {
            operator: ConditionOperator::All,
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn any() -> Self {
        Self {
            operator: ConditionOperator::Any,
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: impl ConditionRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    #[must_use]
    pub const fn operator(&self) -> ConditionOperator {
        self.operator
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    ///
    /// Apply every rule to the query. Validation and exclusive-param
    /// conflicts surface here, before anything executes.
    ///
    pub fn apply(&self, query: &mut ElementQuery<'_>) -> Result<(), EngineError> {
        for rule in &self.rules {
            rule.validate()?;

            for &param in rule.exclusive_query_params() {
                if query.has_param(param) {
                    return Err(ConditionError::ExclusiveParam {
                        rule: rule.type_key(),
                        param,
                    }
                    .into());
                }
            }
        }

        match self.operator {
            ConditionOperator::All => {
                for rule in &self.rules {
                    rule.modify_query(query)?;
                }
            }

            ConditionOperator::Any => {
                if self.rules.is_empty() {
                    return Ok(());
                }

                let mut union = BTreeSet::new();
                for rule in &self.rules {
                    let mut branch = query.clone();
                    rule.modify_query(&mut branch)?;
                    union.extend(branch.element_ids()?);
                }

                query.restrict_to_ids(union);
            }
        }

        Ok(())
    }
}
