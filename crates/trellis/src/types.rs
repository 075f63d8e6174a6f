use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

///
/// Identifiers
///
/// Element, site, field, and structure identifiers are plain integers
/// assigned by the content services that own the rows. The engine only
/// compares and joins on them.
///

pub type ElementId = u64;
pub type SiteId = u64;
pub type FieldId = u64;
pub type StructureId = u64;

///
/// TimestampError
///

#[derive(Debug, ThisError)]
pub enum TimestampError {
    #[error("invalid rfc3339 timestamp '{0}'")]
    Parse(String),

    #[error("timestamp {0} is outside the formattable range")]
    Range(i64),
}

///
/// Timestamp
///
/// Unix seconds. RFC 3339 text is the interchange form at the edges;
/// comparisons and storage use the integer.
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
    Serialize,
)]
#[display("{_0}")]
pub struct Timestamp(i64);

impl Timestamp {
    #[must_use]
    pub const fn from_unix(secs: i64) -> Self {
        Self(secs)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Parse an RFC 3339 timestamp string.
    pub fn parse_rfc3339(s: &str) -> Result<Self, TimestampError> {
        OffsetDateTime::parse(s, &Rfc3339)
            .map(|dt| Self(dt.unix_timestamp()))
            .map_err(|_| TimestampError::Parse(s.to_string()))
    }

    /// Format as an RFC 3339 timestamp string.
    pub fn format_rfc3339(self) -> Result<String, TimestampError> {
        let dt = OffsetDateTime::from_unix_timestamp(self.0)
            .map_err(|_| TimestampError::Range(self.0))?;

        dt.format(&Rfc3339).map_err(|_| TimestampError::Range(self.0))
    }
}

///
/// DateRange
///
/// Half-open window: `after` is inclusive, `before` is exclusive.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DateRange {
    pub after: Option<Timestamp>,
    pub before: Option<Timestamp>,
}

impl DateRange {
    #[must_use]
    pub const fn after(ts: Timestamp) -> Self {
        Self {
            after: Some(ts),
            before: None,
        }
    }

    #[must_use]
    pub const fn before(ts: Timestamp) -> Self {
        Self {
            after: None,
            before: Some(ts),
        }
    }

    #[must_use]
    pub const fn between(after: Timestamp, before: Timestamp) -> Self {
        Self {
            after: Some(after),
            before: Some(before),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.after.is_none() && self.before.is_none()
    }
}
