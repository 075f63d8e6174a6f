use crate::types::{ElementId, StructureId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

///
/// StructureNode
///
/// Nested-set position of one element inside one structure. Invariants
/// maintained by the structure-management services that write rows:
/// `lft < rgt`; descendants fall strictly inside the parent interval;
/// `level` equals depth with roots at 1; an element appears at most
/// once per structure.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StructureNode {
    pub element_id: ElementId,
    pub structure_id: StructureId,
    pub lft: u32,
    pub rgt: u32,
    pub level: u32,
}

impl StructureNode {
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.rgt == self.lft + 1
    }

    /// Strict interval containment: is `self` a descendant of `other`?
    #[must_use]
    pub const fn is_descendant_of(&self, other: &Self) -> bool {
        self.structure_id == other.structure_id && self.lft > other.lft && self.rgt < other.rgt
    }
}

///
/// StructureStore
///
/// Nested-set rows per structure instance. Written by the structure
/// services, read-only here.
///

#[derive(Debug, Default)]
pub struct StructureStore {
    nodes: Vec<StructureNode>,
}

impl StructureStore {
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn save(&mut self, node: StructureNode) {
        self.nodes.push(node);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node for one element in one structure, if positioned.
    #[must_use]
    pub fn node(&self, structure_id: StructureId, element_id: ElementId) -> Option<&StructureNode> {
        self.nodes
            .iter()
            .find(|node| node.structure_id == structure_id && node.element_id == element_id)
    }

    pub fn members(&self, structure_id: StructureId) -> impl Iterator<Item = &StructureNode> {
        self.nodes
            .iter()
            .filter(move |node| node.structure_id == structure_id)
    }

    /// Element ids of members passing `keep`, for window filters.
    #[must_use]
    pub fn member_ids_where(
        &self,
        structure_id: StructureId,
        keep: impl Fn(&StructureNode) -> bool,
    ) -> BTreeSet<ElementId> {
        self.members(structure_id)
            .filter(|node| keep(node))
            .map(|node| node.element_id)
            .collect()
    }

    ///
    /// Descendants of `anchor`: nodes whose interval lies strictly
    /// inside the anchor's, optionally within `max_depth` levels below
    /// it.
    ///
    #[must_use]
    pub fn descendant_ids(&self, anchor: &StructureNode, max_depth: Option<u32>) -> BTreeSet<ElementId> {
        self.member_ids_where(anchor.structure_id, |node| {
            node.is_descendant_of(anchor)
                && max_depth.is_none_or(|depth| node.level <= anchor.level + depth)
        })
    }

    ///
    /// Ancestors of `anchor`: nodes whose interval strictly contains
    /// the anchor's, optionally within `max_depth` levels above it.
    ///
    #[must_use]
    pub fn ancestor_ids(&self, anchor: &StructureNode, max_depth: Option<u32>) -> BTreeSet<ElementId> {
        self.member_ids_where(anchor.structure_id, |node| {
            anchor.is_descendant_of(node)
                && max_depth.is_none_or(|depth| node.level + depth >= anchor.level)
        })
    }

    /// Tree position (`lft`) of one element, for structure ordering.
    #[must_use]
    pub fn position(&self, structure_id: StructureId, element_id: ElementId) -> Option<u32> {
        self.node(structure_id, element_id).map(|node| node.lft)
    }
}
