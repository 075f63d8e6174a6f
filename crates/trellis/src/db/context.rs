use crate::types::SiteId;

///
/// ReadConsistency
/// Missing-row handling policy for query execution.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReadConsistency {
    /// Missing rows are ignored (no error).
    #[default]
    MissingOk,

    /// Missing rows are treated as corruption.
    Strict,
}

///
/// DbConfig
///
/// Engine tunables supplied when the `Db` handle is built.
///

#[derive(Clone, Copy, Debug)]
pub struct DbConfig {
    /// Rows hydrated from the element store per batch during iteration.
    pub hydration_batch: usize,

    pub consistency: ReadConsistency,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            hydration_batch: 100,
            consistency: ReadConsistency::MissingOk,
        }
    }
}

///
/// QueryContext
///
/// Explicit per-query context. Defaults that would otherwise come from
/// ambient request state (current site, requesting principal) are
/// carried here and passed to the query constructor.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryContext {
    pub site_id: Option<SiteId>,
    pub principal: Option<String>,
}

impl QueryContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            site_id: None,
            principal: None,
        }
    }

    #[must_use]
    pub const fn for_site(mut self, site_id: SiteId) -> Self {
        self.site_id = Some(site_id);
        self
    }

    #[must_use]
    pub fn for_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }
}
