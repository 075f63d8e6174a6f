use crate::types::{ElementId, FieldId, SiteId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

///
/// RelationEdge
///
/// Directed many-to-many edge between two elements, optionally scoped
/// by the relation field that produced it and the site of the source
/// element's version. `sort_order` preserves editor-defined ordering
/// and is contiguous per `(source_id, field_id, source_site_id)`,
/// starting at 1.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RelationEdge {
    pub source_id: ElementId,
    pub target_id: ElementId,
    pub field_id: Option<FieldId>,
    pub source_site_id: Option<SiteId>,
    pub sort_order: u32,
}

impl RelationEdge {
    #[must_use]
    pub const fn new(source_id: ElementId, target_id: ElementId, sort_order: u32) -> Self {
        Self {
            source_id,
            target_id,
            field_id: None,
            source_site_id: None,
            sort_order,
        }
    }

    #[must_use]
    pub const fn for_field(mut self, field_id: FieldId) -> Self {
        self.field_id = Some(field_id);
        self
    }

    #[must_use]
    pub const fn for_site(mut self, site_id: SiteId) -> Self {
        self.source_site_id = Some(site_id);
        self
    }

    // Scope match: a `None` scope on the probe matches any edge.
    const fn matches_scope(&self, field_id: Option<FieldId>, source_site_id: Option<SiteId>) -> bool {
        let field_ok = match field_id {
            Some(probe) => matches!(self.field_id, Some(own) if own == probe),
            None => true,
        };
        let site_ok = match source_site_id {
            Some(probe) => matches!(self.source_site_id, Some(own) if own == probe),
            None => true,
        };

        field_ok && site_ok
    }
}

///
/// RelationStore
///
/// The durable relation graph. Written by content-save services,
/// read-only here.
///

#[derive(Debug, Default)]
pub struct RelationStore {
    edges: Vec<RelationEdge>,
}

impl RelationStore {
    #[must_use]
    pub const fn new() -> Self {
        Self { edges: Vec::new() }
    }

    pub fn save(&mut self, edge: RelationEdge) {
        self.edges.push(edge);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    ///
    /// Elements with an edge to or from any of `ids` (relation
    /// direction is symmetric for query purposes), under the given
    /// field/site scopes. Returns the matching counterpart ids.
    ///
    #[must_use]
    pub fn related_element_ids(
        &self,
        ids: &BTreeSet<ElementId>,
        field_id: Option<FieldId>,
        source_site_id: Option<SiteId>,
    ) -> BTreeSet<ElementId> {
        let mut out = BTreeSet::new();

        for edge in &self.edges {
            if !edge.matches_scope(field_id, source_site_id) {
                continue;
            }

            if ids.contains(&edge.target_id) {
                out.insert(edge.source_id);
            }
            if ids.contains(&edge.source_id) {
                out.insert(edge.target_id);
            }
        }

        out
    }

    ///
    /// Targets of one source under the given scopes, in editor order
    /// (`sort_order` ascending). Used by eager-loading collaborators.
    ///
    #[must_use]
    pub fn ordered_targets(
        &self,
        source_id: ElementId,
        field_id: Option<FieldId>,
        source_site_id: Option<SiteId>,
    ) -> Vec<ElementId> {
        let mut hits: Vec<&RelationEdge> = self
            .edges
            .iter()
            .filter(|edge| {
                edge.source_id == source_id && edge.matches_scope(field_id, source_site_id)
            })
            .collect();

        hits.sort_by_key(|edge| edge.sort_order);
        hits.into_iter().map(|edge| edge.target_id).collect()
    }
}
