use crate::{
    types::{ElementId, SiteId, Timestamp},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error as ThisError;

///
/// ElementStatusError
///

#[derive(Debug, ThisError)]
pub enum ElementStatusError {
    #[error("unknown element status '{0}'")]
    Unknown(String),
}

///
/// ElementStatus
///
/// One stored status per element. Type-specific statuses (`pending`,
/// `expired`) are written by the content services that own the rows;
/// the engine filters on the stored value and derives nothing.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementStatus {
    #[default]
    Enabled,
    Disabled,
    Archived,
    Pending,
    Expired,
}

impl ElementStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Archived => "archived",
            Self::Pending => "pending",
            Self::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ElementStatusError> {
        match s.to_ascii_lowercase().as_str() {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            "archived" => Ok(Self::Archived),
            "pending" => Ok(Self::Pending),
            "expired" => Ok(Self::Expired),
            _ => Err(ElementStatusError::Unknown(s.to_string())),
        }
    }
}

///
/// Element
///
/// An element row: identity, status, per-site availability, native
/// columns, and custom field values. Created by higher-level content
/// services; the engine only reads and filters rows.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Element {
    pub id: ElementId,
    pub status: ElementStatus,
    pub slug: String,
    pub uri: Option<String>,
    pub title: String,

    /// Sites on which this element is available.
    pub site_enabled: BTreeSet<SiteId>,

    pub date_created: Timestamp,
    pub date_updated: Timestamp,

    /// Soft-delete marker; `Some` means the element is trashed.
    pub date_deleted: Option<Timestamp>,

    /// Custom field values keyed by field handle.
    pub fields: BTreeMap<String, Value>,
}

impl Element {
    #[must_use]
    pub fn new(id: ElementId) -> Self {
        Self {
            id,
            status: ElementStatus::Enabled,
            slug: String::new(),
            uri: None,
            title: String::new(),
            site_enabled: BTreeSet::new(),
            date_created: Timestamp::default(),
            date_updated: Timestamp::default(),
            date_deleted: None,
            fields: BTreeMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Row construction (fixtures and content services)
    // ------------------------------------------------------------------

    #[must_use]
    pub fn with_status(mut self, status: ElementStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_site(mut self, site_id: SiteId) -> Self {
        self.site_enabled.insert(site_id);
        self
    }

    #[must_use]
    pub const fn with_dates(mut self, created: Timestamp, updated: Timestamp) -> Self {
        self.date_created = created;
        self.date_updated = updated;
        self
    }

    #[must_use]
    pub const fn with_deleted(mut self, deleted: Timestamp) -> Self {
        self.date_deleted = Some(deleted);
        self
    }

    #[must_use]
    pub fn with_field(mut self, handle: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(handle.into(), value.into());
        self
    }

    // ------------------------------------------------------------------
    // Row inspection
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn trashed(&self) -> bool {
        self.date_deleted.is_some()
    }

    #[must_use]
    pub fn enabled_for_site(&self, site_id: SiteId) -> bool {
        self.site_enabled.contains(&site_id)
    }

    ///
    /// Look up a native column or custom field value by name. Native
    /// columns shadow custom fields of the same name.
    ///
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Uint(self.id)),
            "status" => Some(Value::Text(self.status.as_str().to_string())),
            "slug" => Some(Value::Text(self.slug.clone())),
            "title" => Some(Value::Text(self.title.clone())),
            "uri" => Some(
                self.uri
                    .as_ref()
                    .map_or(Value::Null, |uri| Value::Text(uri.clone())),
            ),
            "date_created" => Some(Value::Timestamp(self.date_created)),
            "date_updated" => Some(Value::Timestamp(self.date_updated)),
            "date_deleted" => Some(
                self.date_deleted
                    .map_or(Value::Null, Value::Timestamp),
            ),
            _ => self.fields.get(name).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(ElementStatus::parse("Enabled").unwrap(), ElementStatus::Enabled);
        assert!(ElementStatus::parse("live").is_err());
    }

    #[test]
    fn value_lookup_prefers_native_columns() {
        let element = Element::new(9)
            .with_slug("about")
            .with_field("slug", "shadowed")
            .with_field("rating", 4i64);

        assert_eq!(element.value("slug"), Some(Value::Text("about".into())));
        assert_eq!(element.value("rating"), Some(Value::Int(4)));
        assert_eq!(element.value("missing"), None);
    }

    #[test]
    fn uri_and_deleted_render_null_when_absent() {
        let element = Element::new(1);
        assert_eq!(element.value("uri"), Some(Value::Null));
        assert_eq!(element.value("date_deleted"), Some(Value::Null));
        assert!(!element.trashed());
    }
}
