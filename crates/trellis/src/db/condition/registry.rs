use crate::{
    db::condition::{
        ConditionError, ConditionRule,
        rules::{
            DateRangeConditionRule, LightswitchConditionRule, NumberConditionRule,
            TextConditionRule, TextOperator,
        },
    },
    error::{EngineError, ErrorClass, ErrorOrigin},
    types::{DateRange, FieldId, Timestamp},
    value::Value,
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

///
/// RuleFactory
///
/// Builds the condition rule for one field definition from the
/// caller's raw filter value. Resolved once per field definition.
///

pub type RuleFactory =
    fn(&FieldDef, &Value) -> Result<Box<dyn ConditionRule>, ConditionError>;

///
/// RegistryError
///

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("field '{0}' already registered")]
    AlreadyRegistered(String),
}

impl From<RegistryError> for EngineError {
    fn from(err: RegistryError) -> Self {
        Self::new(
            ErrorClass::InvalidParams,
            ErrorOrigin::Condition,
            err.to_string(),
        )
    }
}

///
/// FieldDef
///
/// One custom-field definition: stable id (referenced by relation
/// edges), handle (referenced by filter params), and the optional
/// factory producing the field's query-level condition rule.
///

#[derive(Clone, Debug)]
pub struct FieldDef {
    pub id: FieldId,
    pub handle: String,
    pub rule: Option<RuleFactory>,
}

impl FieldDef {
    #[must_use]
    pub fn new(id: FieldId, handle: impl Into<String>, rule: Option<RuleFactory>) -> Self {
        Self {
            id,
            handle: handle.into(),
            rule,
        }
    }

    /// A text field filtered with the comma/operator equality syntax.
    #[must_use]
    pub fn text(id: FieldId, handle: impl Into<String>) -> Self {
        Self::new(id, handle, Some(text_rule))
    }

    /// A numeric field filtered by exact value or `[min, max]` range.
    #[must_use]
    pub fn number(id: FieldId, handle: impl Into<String>) -> Self {
        Self::new(id, handle, Some(number_rule))
    }

    /// A date field filtered by `[after, before]` window.
    #[must_use]
    pub fn date(id: FieldId, handle: impl Into<String>) -> Self {
        Self::new(id, handle, Some(date_rule))
    }

    /// A boolean field.
    #[must_use]
    pub fn lightswitch(id: FieldId, handle: impl Into<String>) -> Self {
        Self::new(id, handle, Some(lightswitch_rule))
    }

    /// A relation field: scopes relation edges, contributes no
    /// query-level filter of its own.
    #[must_use]
    pub fn relation(id: FieldId, handle: impl Into<String>) -> Self {
        Self::new(id, handle, None)
    }
}

///
/// FieldRegistry
///
/// Maps field handles to definitions. Populated once by the schema
/// collaborator; the compiler resolves handles through it.
///

#[derive(Clone, Debug, Default)]
pub struct FieldRegistry {
    fields: BTreeMap<String, FieldDef>,
}

impl FieldRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, def: FieldDef) -> Result<(), RegistryError> {
        if self.fields.contains_key(&def.handle) {
            return Err(RegistryError::AlreadyRegistered(def.handle));
        }

        self.fields.insert(def.handle.clone(), def);
        Ok(())
    }

    #[must_use]
    pub fn field(&self, handle: &str) -> Option<&FieldDef> {
        self.fields.get(handle)
    }

    #[must_use]
    pub fn field_id(&self, handle: &str) -> Option<FieldId> {
        self.fields.get(handle).map(|def| def.id)
    }

    ///
    /// Build the condition rule for a field filter. Unknown handles and
    /// fields without a rule are configuration errors.
    ///
    pub fn rule_for(
        &self,
        handle: &str,
        raw: &Value,
    ) -> Result<Box<dyn ConditionRule>, ConditionError> {
        let def = self
            .field(handle)
            .ok_or_else(|| ConditionError::UnknownField {
                handle: handle.to_string(),
            })?;

        let factory = def.rule.ok_or_else(|| ConditionError::NoRuleForField {
            handle: handle.to_string(),
        })?;

        factory(def, raw)
    }
}

// ------------------------------------------------------------------
// Stock factories
// ------------------------------------------------------------------

fn text_rule(def: &FieldDef, raw: &Value) -> Result<Box<dyn ConditionRule>, ConditionError> {
    // Re-join lists so the rule's own comma parsing applies.
    let value = match raw {
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
            parts.join(",")
        }
        other => other.to_string(),
    };

    Ok(Box::new(TextConditionRule::new(
        def.handle.clone(),
        TextOperator::Equals,
        value,
    )))
}

fn number_rule(def: &FieldDef, raw: &Value) -> Result<Box<dyn ConditionRule>, ConditionError> {
    let invalid = |detail: String| ConditionError::InvalidConfig {
        rule: "number",
        detail,
    };

    let as_int = |value: &Value| -> Result<i64, ConditionError> {
        match value {
            Value::Int(v) => Ok(*v),
            Value::Uint(v) => i64::try_from(*v)
                .map_err(|_| invalid(format!("{v} exceeds the numeric filter range"))),
            Value::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid(format!("'{s}' is not a number"))),
            other => Err(invalid(format!("'{other:?}' is not a number"))),
        }
    };

    let rule = match raw {
        Value::List(items) if items.len() == 2 => NumberConditionRule::between(
            def.handle.clone(),
            as_int(&items[0])?,
            as_int(&items[1])?,
        ),
        Value::List(items) => {
            return Err(invalid(format!(
                "expected [min, max], got {} values",
                items.len()
            )));
        }
        other => NumberConditionRule::exactly(def.handle.clone(), as_int(other)?),
    };

    Ok(Box::new(rule))
}

fn date_rule(def: &FieldDef, raw: &Value) -> Result<Box<dyn ConditionRule>, ConditionError> {
    let invalid = |detail: String| ConditionError::InvalidConfig {
        rule: "date_range",
        detail,
    };

    let as_ts = |value: &Value| -> Result<Option<Timestamp>, ConditionError> {
        match value {
            Value::Null => Ok(None),
            Value::Timestamp(ts) => Ok(Some(*ts)),
            Value::Text(s) => Timestamp::parse_rfc3339(s)
                .map(Some)
                .map_err(|err| invalid(err.to_string())),
            other => Err(invalid(format!("'{other:?}' is not a timestamp"))),
        }
    };

    let range = match raw {
        Value::List(items) if items.len() == 2 => DateRange {
            after: as_ts(&items[0])?,
            before: as_ts(&items[1])?,
        },
        other => DateRange {
            after: as_ts(other)?,
            before: None,
        },
    };

    Ok(Box::new(DateRangeConditionRule::new(
        def.handle.clone(),
        range,
    )))
}

fn lightswitch_rule(def: &FieldDef, raw: &Value) -> Result<Box<dyn ConditionRule>, ConditionError> {
    let value = match raw {
        Value::Bool(v) => *v,
        other => {
            return Err(ConditionError::InvalidConfig {
                rule: "lightswitch",
                detail: format!("'{other:?}' is not a boolean"),
            });
        }
    };

    Ok(Box::new(LightswitchConditionRule::new(
        def.handle.clone(),
        value,
    )))
}
