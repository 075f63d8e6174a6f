//! Deterministic, read-only explanation of compiled plans; must not
//! execute row scans.

use crate::{
    db::query::{
        ElementQuery,
        compile::{IdFilter, QueryPlan, RelationNode, StructureWindow},
        order::OrderSpec,
        predicate::Predicate,
        related::RelationOperator,
    },
    error::EngineError,
    types::{ElementId, FieldId, SiteId, StructureId},
};

///
/// ExplainPlan
///
/// Stable representation of a compiled plan for observability. Two
/// explains of the same unmutated query compare equal.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExplainPlan {
    pub access: ExplainAccessPath,
    pub relation: Option<ExplainRelation>,
    pub structure: Option<ExplainStructure>,
    pub predicate: Predicate,
    pub site: Option<SiteId>,
    pub restricted_to: Option<Vec<ElementId>>,
    pub order: ExplainOrderBy,
    pub page: ExplainPagination,
}

///
/// ExplainAccessPath
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExplainAccessPath {
    ByIds { ids: Vec<ElementId> },
    ExcludingIds { ids: Vec<ElementId> },
    FullScan,
}

///
/// ExplainRelation
///
/// Mirror of the compiled relation constraint, one aliased join per
/// leaf.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExplainRelation {
    Group {
        operator: RelationOperator,
        negated: bool,
        children: Vec<Self>,
    },
    Join {
        alias: String,
        element_ids: Vec<ElementId>,
        field_id: Option<FieldId>,
        source_site_id: Option<SiteId>,
    },
}

///
/// ExplainStructure
///
/// The compiled nested-set window, anchors already resolved to
/// interval bounds.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExplainStructure {
    pub structure_id: StructureId,
    pub level: Option<u32>,
    pub descendants: Option<ExplainDescendants>,
    pub ancestors: Option<ExplainAncestors>,
    pub has_descendants: Option<bool>,
    pub leaves: Option<bool>,
}

///
/// ExplainDescendants
///
/// `lft` between `lft_min` and `lft_max` inclusive, the open interior
/// of the anchor's interval.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExplainDescendants {
    pub lft_min: u32,
    pub lft_max: u32,
    pub max_level: Option<u32>,
}

///
/// ExplainAncestors
///
/// `lft < lft_below AND rgt > rgt_above`, the containing intervals.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExplainAncestors {
    pub lft_below: u32,
    pub rgt_above: u32,
    pub min_level: Option<u32>,
}

///
/// ExplainOrderBy
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExplainOrderBy {
    FixedOrder { ids: Vec<ElementId> },
    Columns(OrderSpec),
    TreeOrder { structure_id: StructureId },
    Natural,
}

///
/// ExplainPagination
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExplainPagination {
    None,
    Window {
        limit: Option<usize>,
        offset: usize,
    },
}

impl ElementQuery<'_> {
    /// Compile and explain this query without executing it.
    pub fn explain(&self) -> Result<ExplainPlan, EngineError> {
        let plan = self.compile()?;

        Ok(ExplainPlan::from_plan(&plan))
    }
}

impl ExplainPlan {
    fn from_plan(plan: &QueryPlan) -> Self {
        Self {
            access: ExplainAccessPath::from_ids(plan.ids.as_ref()),
            relation: plan.relation.as_ref().map(ExplainRelation::from_node),
            structure: plan.structure.as_ref().map(ExplainStructure::from_window),
            predicate: plan.predicate.clone(),
            site: plan.site_id,
            restricted_to: plan
                .id_restriction
                .as_ref()
                .map(|ids| ids.iter().copied().collect()),
            order: ExplainOrderBy::from_plan(plan),
            page: match (plan.limit, plan.offset) {
                (None, None) => ExplainPagination::None,
                (limit, offset) => ExplainPagination::Window {
                    limit,
                    offset: offset.unwrap_or(0),
                },
            },
        }
    }
}

impl ExplainAccessPath {
    fn from_ids(filter: Option<&IdFilter>) -> Self {
        match filter {
            Some(filter) if filter.negated => Self::ExcludingIds {
                ids: filter.ids.clone(),
            },
            Some(filter) => Self::ByIds {
                ids: filter.ids.clone(),
            },
            None => Self::FullScan,
        }
    }
}

impl ExplainRelation {
    fn from_node(node: &RelationNode) -> Self {
        match node {
            RelationNode::Group {
                operator,
                negated,
                children,
            } => Self::Group {
                operator: *operator,
                negated: *negated,
                children: children.iter().map(Self::from_node).collect(),
            },
            RelationNode::Join(join) => Self::Join {
                alias: join.alias.clone(),
                element_ids: join.element_ids.iter().copied().collect(),
                field_id: join.field_id,
                source_site_id: join.source_site_id,
            },
        }
    }
}

impl ExplainStructure {
    fn from_window(window: &StructureWindow) -> Self {
        Self {
            structure_id: window.structure_id,
            level: window.level,
            descendants: window.descendant_of.map(|(anchor, dist)| ExplainDescendants {
                lft_min: anchor.lft + 1,
                lft_max: anchor.rgt - 1,
                max_level: dist.map(|dist| anchor.level + dist),
            }),
            ancestors: window.ancestor_of.map(|(anchor, dist)| ExplainAncestors {
                lft_below: anchor.lft,
                rgt_above: anchor.rgt,
                min_level: dist.map(|dist| anchor.level.saturating_sub(dist)),
            }),
            has_descendants: window.has_descendants,
            leaves: window.leaves,
        }
    }
}

impl ExplainOrderBy {
    fn from_plan(plan: &QueryPlan) -> Self {
        if let Some(ids) = &plan.fixed_order
            && !ids.is_empty()
        {
            return Self::FixedOrder { ids: ids.clone() };
        }

        if !plan.order.is_empty() {
            return Self::Columns(plan.order.clone());
        }

        match &plan.structure {
            Some(window) => Self::TreeOrder {
                structure_id: window.structure_id,
            },
            None => Self::Natural,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::query::related::RelatedToInput,
        test_fixtures::{STRUCTURE, TAG_BLUE, TAG_RED, content_db},
    };

    #[test]
    fn and_leaves_join_under_distinct_aliases() {
        let db = content_db();

        let plan = db
            .query()
            .related_to(RelatedToInput::and([
                RelatedToInput::Id(TAG_RED),
                RelatedToInput::Id(TAG_BLUE),
            ]))
            .explain()
            .unwrap();

        let Some(ExplainRelation::Group {
            operator, children, ..
        }) = plan.relation
        else {
            panic!("expected a relation group");
        };
        assert_eq!(operator, RelationOperator::And);

        let aliases: Vec<&str> = children
            .iter()
            .map(|child| match child {
                ExplainRelation::Join { alias, .. } => alias.as_str(),
                ExplainRelation::Group { .. } => panic!("expected joins"),
            })
            .collect();
        assert_eq!(aliases.len(), 2);
        assert_ne!(aliases[0], aliases[1]);
    }

    #[test]
    fn explains_of_an_unmutated_query_compare_equal() {
        let db = content_db();

        let query = db
            .query()
            .related_to(vec![RelatedToInput::Id(TAG_RED)])
            .order_by("date_created desc")
            .limit(10);

        assert_eq!(query.explain().unwrap(), query.explain().unwrap());
    }

    #[test]
    fn structure_windows_surface_interval_bounds() {
        let db = content_db();

        let plan = db
            .query()
            .structure_id(STRUCTURE)
            .descendant_of(21)
            .descendant_dist(1)
            .explain()
            .unwrap();

        let structure = plan.structure.unwrap();
        assert_eq!(
            structure.descendants,
            Some(ExplainDescendants {
                lft_min: 3,
                lft_max: 6,
                max_level: Some(3),
            })
        );
        assert_eq!(plan.order, ExplainOrderBy::TreeOrder {
            structure_id: STRUCTURE
        });
    }

    #[test]
    fn access_path_classifies_id_filters() {
        let db = content_db();

        let plan = db.query().id("3,1,2").explain().unwrap();
        assert_eq!(plan.access, ExplainAccessPath::ByIds {
            ids: vec![3, 1, 2]
        });

        let plan = db.query().id("not 4").explain().unwrap();
        assert_eq!(plan.access, ExplainAccessPath::ExcludingIds { ids: vec![4] });

        let plan = db.query().slug("alpha").explain().unwrap();
        assert_eq!(plan.access, ExplainAccessPath::FullScan);
        assert_eq!(plan.page, ExplainPagination::None);
    }

    #[test]
    fn pagination_windows_surface_limit_and_offset() {
        let db = content_db();

        let plan = db.query().limit(5).offset(10).explain().unwrap();
        assert_eq!(plan.page, ExplainPagination::Window {
            limit: Some(5),
            offset: 10,
        });
    }
}
