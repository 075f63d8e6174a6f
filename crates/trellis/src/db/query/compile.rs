use crate::{
    db::{
        condition::rules::date_window,
        query::{
            ElementQuery, QueryError,
            order::OrderSpec,
            param::{ParamOperator, QueryParam},
            predicate::{Predicate, normalize},
            related::{
                CriterionGroup, CriterionLeaf, RelatedToCriterion, RelationOperator,
                normalize_related_to,
            },
        },
        element::ElementStatus,
        store::StructureNode,
    },
    error::EngineError,
    obs::sink::{self, MetricsEvent, PlanKind},
    types::{ElementId, FieldId, SiteId, StructureId},
    value::Value,
};
use std::collections::BTreeSet;

///
/// QueryPlan
///
/// Compiled query state: the logical join/condition shape the builder's
/// raw params expand into. Rebuilt per execution call; building it
/// twice from unchanged params yields an equivalent plan.
///

#[derive(Clone, Debug)]
pub(crate) struct QueryPlan {
    pub ids: Option<IdFilter>,
    pub predicate: Predicate,
    pub relation: Option<RelationNode>,
    pub structure: Option<StructureWindow>,
    pub site_id: Option<SiteId>,
    pub id_restriction: Option<BTreeSet<ElementId>>,
    pub order: OrderSpec,
    pub fixed_order: Option<Vec<ElementId>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

///
/// IdFilter
///
/// Id access path. `ids` preserves the caller's order for
/// `fixed_order`; `negated` turns the list into an exclusion.
///

#[derive(Clone, Debug)]
pub(crate) struct IdFilter {
    pub negated: bool,
    pub ids: Vec<ElementId>,
}

///
/// RelationNode
///
/// Compiled relation constraint. Each leaf is one uniquely-aliased
/// join against the relation store; groups combine child result sets.
///

#[derive(Clone, Debug)]
pub(crate) enum RelationNode {
    Group {
        operator: RelationOperator,
        negated: bool,
        children: Vec<RelationNode>,
    },
    Join(RelationJoin),
}

///
/// RelationJoin
///

#[derive(Clone, Debug)]
pub(crate) struct RelationJoin {
    /// Unique per leaf so sibling joins under an AND never collide.
    pub alias: String,
    pub element_ids: BTreeSet<ElementId>,
    pub field_id: Option<FieldId>,
    pub source_site_id: Option<SiteId>,
}

///
/// StructureWindow
///
/// Compiled structure filters, anchors already resolved to nodes.
///

#[derive(Clone, Copy, Debug)]
pub(crate) struct StructureWindow {
    pub structure_id: StructureId,
    pub level: Option<u32>,
    pub descendant_of: Option<(StructureNode, Option<u32>)>,
    pub ancestor_of: Option<(StructureNode, Option<u32>)>,
    pub has_descendants: Option<bool>,
    pub leaves: Option<bool>,
}

impl ElementQuery<'_> {
    ///
    /// Compile the raw parameter state into a plan. All parameter-shape
    /// errors surface here, before any row is read.
    ///
    pub(crate) fn compile(&self) -> Result<QueryPlan, EngineError> {
        // Field filters route through the registry's condition rules,
        // which mutate a scratch copy of the query before expansion.
        let query = self.with_field_rules_applied()?;

        let ids = query.compile_id_filter()?;
        let predicate = query.compile_predicate()?;
        let relation = query.compile_relation()?;
        let structure = query.compile_structure()?;

        let fixed_order = if query.fixed_order {
            Some(
                ids.as_ref()
                    .filter(|filter| !filter.negated)
                    .map(|filter| filter.ids.clone())
                    .unwrap_or_default(),
            )
        } else {
            None
        };

        let plan = QueryPlan {
            ids,
            predicate,
            relation,
            structure,
            site_id: query.site_id.or(query.ctx.site_id),
            id_restriction: query.id_restriction.clone(),
            order: query.order.clone().unwrap_or_default(),
            fixed_order,
            limit: query.limit,
            offset: query.offset,
        };

        sink::record(MetricsEvent::Plan {
            kind: plan.kind(),
        });

        Ok(plan)
    }

    // Apply registered condition rules for every field filter.
    fn with_field_rules_applied(&self) -> Result<Self, EngineError> {
        let mut query = self.clone();

        for (handle, raw) in &self.field_filters {
            let rule = self.db.fields().rule_for(handle, raw)?;
            rule.validate()?;

            for &param in rule.exclusive_query_params() {
                if self.has_param(param) {
                    return Err(crate::db::condition::ConditionError::ExclusiveParam {
                        rule: rule.type_key(),
                        param,
                    }
                    .into());
                }
            }

            rule.modify_query(&mut query)?;
        }

        Ok(query)
    }

    fn compile_id_filter(&self) -> Result<Option<IdFilter>, EngineError> {
        let Some(raw) = &self.id else {
            return Ok(None);
        };

        let mut values = QueryParam::to_array(raw);
        let operator = QueryParam::extract_operator(&mut values);
        let negated = matches!(operator, Some(ParamOperator::Not));

        let mut seen = BTreeSet::new();
        let mut ids = Vec::new();
        for value in values {
            let id = value
                .parse::<ElementId>()
                .map_err(|_| QueryError::InvalidId { value })?;
            if seen.insert(id) {
                ids.push(id);
            }
        }

        if ids.is_empty() {
            return Ok(None);
        }

        Ok(Some(IdFilter { negated, ids }))
    }

    fn compile_predicate(&self) -> Result<Predicate, EngineError> {
        let mut parts = Vec::new();

        if let Some(fragment) = string_column("slug", self.slug.as_ref()) {
            parts.push(fragment);
        }
        if let Some(fragment) = string_column("uri", self.uri.as_ref()) {
            parts.push(fragment);
        }
        if let Some(fragment) = string_column("title", self.title.as_ref()) {
            parts.push(fragment);
        }
        if let Some(fragment) = self.compile_status()? {
            parts.push(fragment);
        }

        // Trashed elements are excluded unless asked for.
        parts.push(match self.trashed {
            Some(true) => Predicate::is_not_null("date_deleted"),
            _ => Predicate::is_null("date_deleted"),
        });

        if let Some(term) = &self.search {
            parts.push(
                Predicate::contains_ci("title", Value::from(term.as_str()))
                    | Predicate::contains_ci("slug", Value::from(term.as_str())),
            );
        }

        if let Some(range) = self.date_created {
            parts.push(date_window("date_created", range));
        }
        if let Some(range) = self.date_updated {
            parts.push(date_window("date_updated", range));
        }

        parts.extend(self.extra_where.iter().cloned());

        Ok(normalize(&Predicate::And(parts)))
    }

    fn compile_status(&self) -> Result<Option<Predicate>, EngineError> {
        let Some(raw) = &self.status else {
            return Ok(None);
        };

        let mut values = QueryParam::to_array(raw);
        let operator = QueryParam::extract_operator(&mut values);

        let mut statuses = Vec::new();
        for value in values {
            let status =
                ElementStatus::parse(&value).map_err(|_| QueryError::InvalidStatus { value })?;
            statuses.push(Value::Text(status.as_str().to_string()));
        }

        if statuses.is_empty() {
            return Ok(None);
        }

        Ok(Some(match operator {
            Some(ParamOperator::Not) => Predicate::not_in("status", statuses),
            _ => Predicate::in_("status", statuses),
        }))
    }

    fn compile_relation(&self) -> Result<Option<RelationNode>, EngineError> {
        let root = normalize_related_to(self.related_to.as_ref())?;
        if root.is_empty() {
            return Ok(None);
        }

        let mut counter = 0;
        Ok(Some(self.compile_criterion_group(&root, &mut counter)))
    }

    fn compile_criterion_group(&self, group: &CriterionGroup, counter: &mut usize) -> RelationNode {
        let children = group
            .children
            .iter()
            .map(|child| match child {
                RelatedToCriterion::Group(inner) => self.compile_criterion_group(inner, counter),
                RelatedToCriterion::Leaf(leaf) => self.compile_criterion_leaf(leaf, counter),
            })
            .collect();

        RelationNode::Group {
            operator: group.operator,
            negated: group.negated,
            children,
        }
    }

    fn compile_criterion_leaf(&self, leaf: &CriterionLeaf, counter: &mut usize) -> RelationNode {
        *counter += 1;

        // A field handle only narrows the join when it resolves to a
        // registered field.
        let field_id = leaf
            .field
            .as_deref()
            .and_then(|handle| self.db.fields().field_id(handle));

        RelationNode::Join(RelationJoin {
            alias: format!("relations_{counter}"),
            element_ids: leaf.element_ids.iter().copied().collect(),
            field_id,
            source_site_id: leaf.source_site,
        })
    }

    fn compile_structure(&self) -> Result<Option<StructureWindow>, EngineError> {
        let has_structure_filter = self.level.is_some()
            || self.ancestor_of.is_some()
            || self.descendant_of.is_some()
            || self.has_descendants.is_some()
            || self.leaves.is_some();

        let Some(structure_id) = self.structure_id else {
            if has_structure_filter {
                return Err(QueryError::StructureFilterWithoutStructure.into());
            }
            return Ok(None);
        };

        let anchor = |element_id: ElementId| -> Result<StructureNode, EngineError> {
            self.db
                .structures()
                .node(structure_id, element_id)
                .copied()
                .ok_or_else(|| {
                    QueryError::AnchorNotInStructure {
                        element_id,
                        structure_id,
                    }
                    .into()
                })
        };

        let descendant_of = match self.descendant_of {
            Some(element_id) => Some((anchor(element_id)?, self.descendant_dist)),
            None => None,
        };
        let ancestor_of = match self.ancestor_of {
            Some(element_id) => Some((anchor(element_id)?, self.ancestor_dist)),
            None => None,
        };

        Ok(Some(StructureWindow {
            structure_id,
            level: self.level,
            descendant_of,
            ancestor_of,
            has_descendants: self.has_descendants,
            leaves: self.leaves,
        }))
    }
}

impl QueryPlan {
    // Access-path classification, in priority order.
    fn kind(&self) -> PlanKind {
        if let Some(filter) = &self.ids {
            if !filter.negated {
                return PlanKind::Ids;
            }
        }
        if self.relation.is_some() {
            return PlanKind::Relation;
        }
        if self.structure.is_some() {
            return PlanKind::Structure;
        }

        PlanKind::FullScan
    }
}

// In/NotIn fragment over one text column, honoring the operator prefix.
fn string_column(column: &str, raw: Option<&Value>) -> Option<Predicate> {
    let raw = raw?;

    let mut values = QueryParam::to_array(raw);
    let operator = QueryParam::extract_operator(&mut values);
    if values.is_empty() {
        return None;
    }

    let values: Vec<Value> = values.into_iter().map(Value::from).collect();
    Some(match operator {
        Some(ParamOperator::Not) => Predicate::not_in(column, values),
        _ => Predicate::in_(column, values),
    })
}

