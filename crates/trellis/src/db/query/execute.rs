use crate::{
    db::{
        context::ReadConsistency,
        element::Element,
        query::{
            ElementQuery,
            compile::{QueryPlan, RelationNode, StructureWindow},
            order::{OrderDirection, OrderSpec},
            predicate::eval,
            related::RelationOperator,
        },
        store::{ElementStore, StoreError, StructureStore},
    },
    error::{EngineError, ErrorClass, ErrorOrigin},
    obs::sink::{self, MetricsEvent},
    types::ElementId,
    value::Value,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use thiserror::Error as ThisError;

///
/// ResponseError
/// Errors related to interpreting a materialized response.
///

#[derive(Debug, ThisError)]
pub enum ResponseError {
    #[error("expected exactly one element, found 0")]
    NotFound,

    #[error("expected exactly one element, found {count}")]
    NotUnique { count: u64 },
}

impl ResponseError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound => ErrorClass::NotFound,
            Self::NotUnique { .. } => ErrorClass::Conflict,
        }
    }
}

impl From<ResponseError> for EngineError {
    fn from(err: ResponseError) -> Self {
        Self::new(err.class(), ErrorOrigin::Response, err.to_string())
    }
}

///
/// Response
/// Materialized query result: ordered hydrated elements.
///

#[derive(Debug)]
pub struct Response(pub Vec<Element>);

impl Response {
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.0.len() as u64
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<ElementId> {
        self.0.iter().map(|element| element.id).collect()
    }

    #[must_use]
    pub fn rows(self) -> Vec<Element> {
        self.0
    }

    pub fn require_one(&self) -> Result<(), EngineError> {
        match self.count() {
            1 => Ok(()),
            0 => Err(ResponseError::NotFound.into()),
            n => Err(ResponseError::NotUnique { count: n }.into()),
        }
    }

    pub fn require_some(&self) -> Result<(), EngineError> {
        if self.is_empty() {
            Err(ResponseError::NotFound.into())
        } else {
            Ok(())
        }
    }

    pub fn row(self) -> Result<Element, EngineError> {
        self.require_one()?;
        Ok(self.0.into_iter().next().unwrap())
    }
}

impl IntoIterator for Response {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

///
/// ElementIter
///
/// Lazily-hydrated result sequence. Matching ids are resolved up
/// front; rows hydrate from the element store in fixed-size batches as
/// the iterator advances. Re-running the originating query restarts
/// the sequence.
///

pub struct ElementIter<'a> {
    elements: &'a ElementStore,
    ids: std::vec::IntoIter<ElementId>,
    batch: VecDeque<Element>,
    batch_size: usize,
    consistency: ReadConsistency,
    failed: bool,
}

impl Iterator for ElementIter<'_> {
    type Item = Result<Element, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if self.batch.is_empty()
            && let Err(err) = self.fill_batch()
        {
            self.failed = true;
            return Some(Err(err));
        }

        self.batch.pop_front().map(Ok)
    }
}

impl ElementIter<'_> {
    fn fill_batch(&mut self) -> Result<(), EngineError> {
        let mut hydrated = 0u64;

        while self.batch.len() < self.batch_size {
            let Some(id) = self.ids.next() else {
                break;
            };

            match self.elements.row(id) {
                Some(element) => {
                    self.batch.push_back(element.clone());
                    hydrated += 1;
                }
                None => match self.consistency {
                    ReadConsistency::MissingOk => {}
                    ReadConsistency::Strict => {
                        return Err(StoreError::MissingRow { id }.into());
                    }
                },
            }
        }

        if hydrated > 0 {
            sink::record(MetricsEvent::RowsHydrated { rows: hydrated });
        }

        Ok(())
    }
}

impl<'a> ElementQuery<'a> {
    // ------------------------------------------------------------------
    // Execution terminals
    // ------------------------------------------------------------------

    ///
    /// Execute and materialize all matching elements, honoring
    /// limit/offset/order. Each call independently recompiles.
    ///
    pub fn all(&self) -> Result<Response, EngineError> {
        let rows: Result<Vec<Element>, EngineError> = self.iter()?.collect();

        Ok(Response(rows?))
    }

    /// Execute and return the first matching element, if any.
    pub fn one(&self) -> Result<Option<Element>, EngineError> {
        let limited = self.clone().limit(1);

        Ok(limited.all()?.rows().into_iter().next())
    }

    ///
    /// Execute and return the number of matching elements. Order,
    /// limit, and offset are stripped: they cannot change a count.
    ///
    pub fn count(&self) -> Result<u64, EngineError> {
        let plan = self.compile()?;
        let ids = self.matching_ids(&plan, false)?;

        Ok(ids.len() as u64)
    }

    /// Execute and return matching ids in result order.
    pub fn element_ids(&self) -> Result<Vec<ElementId>, EngineError> {
        let plan = self.compile()?;
        self.matching_ids(&plan, true)
    }

    /// Execute and stream matching elements in hydration batches.
    pub fn iter(&self) -> Result<ElementIter<'a>, EngineError> {
        let plan = self.compile()?;
        let ids = self.matching_ids(&plan, true)?;

        Ok(ElementIter {
            elements: self.db.elements(),
            ids: ids.into_iter(),
            batch: VecDeque::new(),
            batch_size: self.db.config().hydration_batch.max(1),
            consistency: self.db.config().consistency,
            failed: false,
        })
    }

    // ------------------------------------------------------------------
    // Plan evaluation
    // ------------------------------------------------------------------

    ///
    /// Evaluate a compiled plan into matching ids. With `ordered`,
    /// result order and the limit/offset window apply; without, the
    /// raw match set is returned (for counts).
    ///
    fn matching_ids(
        &self,
        plan: &QueryPlan,
        ordered: bool,
    ) -> Result<Vec<ElementId>, EngineError> {
        sink::record(MetricsEvent::QueryStart);

        let elements = self.db.elements();

        let relation_allowed = plan
            .relation
            .as_ref()
            .map(|node| self.eval_relation(node));
        let structure_allowed = plan
            .structure
            .as_ref()
            .map(|window| structure_window_ids(self.db.structures(), window));

        let keep = |element: &Element| -> bool {
            if let Some(site_id) = plan.site_id
                && !element.enabled_for_site(site_id)
            {
                return false;
            }
            if let Some(allowed) = &relation_allowed
                && !allowed.contains(&element.id)
            {
                return false;
            }
            if let Some(allowed) = &structure_allowed
                && !allowed.contains(&element.id)
            {
                return false;
            }
            if let Some(allowed) = &plan.id_restriction
                && !allowed.contains(&element.id)
            {
                return false;
            }

            eval(element, &plan.predicate)
        };

        let mut scanned = 0u64;
        let mut matched = Vec::new();

        match &plan.ids {
            // Id access path: probe the listed ids in caller order.
            Some(filter) if !filter.negated => {
                for &id in &filter.ids {
                    scanned += 1;
                    match elements.row(id) {
                        Some(element) => {
                            if keep(element) {
                                matched.push(id);
                            }
                        }
                        None => match self.db.config().consistency {
                            ReadConsistency::MissingOk => {}
                            ReadConsistency::Strict => {
                                return Err(StoreError::MissingRow { id }.into());
                            }
                        },
                    }
                }
            }

            // Scan path, with an optional id exclusion.
            _ => {
                let excluded: Option<BTreeSet<ElementId>> = match &plan.ids {
                    Some(filter) => Some(filter.ids.iter().copied().collect()),
                    None => None,
                };

                for element in elements.rows() {
                    scanned += 1;
                    if let Some(excluded) = &excluded
                        && excluded.contains(&element.id)
                    {
                        continue;
                    }
                    if keep(element) {
                        matched.push(element.id);
                    }
                }
            }
        }

        sink::record(MetricsEvent::RowsScanned { rows: scanned });

        if ordered {
            self.order_ids(plan, &mut matched);

            let offset = plan.offset.unwrap_or(0);
            matched = matched.into_iter().skip(offset).collect();
            if let Some(limit) = plan.limit {
                matched.truncate(limit);
            }
        }

        sink::record(MetricsEvent::QueryFinish {
            rows: matched.len() as u64,
        });

        Ok(matched)
    }

    // Resolve one compiled relation node into the set of element ids
    // satisfying it. Each join probes the relation store independently;
    // groups combine child sets, so an AND is one probe per child and
    // an OR's union is set-correct by construction.
    fn eval_relation(&self, node: &RelationNode) -> BTreeSet<ElementId> {
        match node {
            RelationNode::Join(join) => self.db.relations().related_element_ids(
                &join.element_ids,
                join.field_id,
                join.source_site_id,
            ),

            RelationNode::Group {
                operator,
                negated,
                children,
            } => {
                let mut sets = children.iter().map(|child| self.eval_relation(child));

                let combined: BTreeSet<ElementId> = match operator {
                    RelationOperator::Or => sets.flatten().collect(),
                    RelationOperator::And => sets
                        .next()
                        .map(|first| {
                            sets.fold(first, |acc, set| {
                                acc.intersection(&set).copied().collect()
                            })
                        })
                        .unwrap_or_default(),
                };

                if *negated {
                    self.db
                        .elements()
                        .ids()
                        .filter(|id| !combined.contains(id))
                        .collect()
                } else {
                    combined
                }
            }
        }
    }

    // Sort matched ids per the plan's ordering rules.
    fn order_ids(&self, plan: &QueryPlan, matched: &mut Vec<ElementId>) {
        // Fixed order overrides any other ordering criteria; an empty
        // ordinal list falls back to natural order.
        if let Some(ordinal_ids) = &plan.fixed_order {
            if !ordinal_ids.is_empty() {
                let ordinal: BTreeMap<ElementId, usize> = ordinal_ids
                    .iter()
                    .enumerate()
                    .map(|(position, &id)| (id, position))
                    .collect();

                matched.sort_by_key(|id| (ordinal.get(id).copied().unwrap_or(usize::MAX), *id));
            }
            return;
        }

        if plan.order.is_empty() {
            // Structure queries default to tree order.
            if let Some(window) = &plan.structure {
                let structures = self.db.structures();
                matched.sort_by_key(|&id| {
                    (
                        structures.position(window.structure_id, id).unwrap_or(u32::MAX),
                        id,
                    )
                });
            } else {
                matched.sort_unstable();
            }
            return;
        }

        self.sort_by_columns(&plan.order, matched);
    }

    fn sort_by_columns(&self, order: &OrderSpec, matched: &mut [ElementId]) {
        let elements = self.db.elements();

        let keys: BTreeMap<ElementId, Vec<Option<Value>>> = matched
            .iter()
            .map(|&id| {
                let values = elements.row(id).map_or_else(Vec::new, |element| {
                    order
                        .columns
                        .iter()
                        .map(|(column, _)| element.value(column))
                        .collect()
                });
                (id, values)
            })
            .collect();

        matched.sort_by(|a, b| {
            let (left, right) = (&keys[a], &keys[b]);

            for (index, (_, direction)) in order.columns.iter().enumerate() {
                let ordering = match (left.get(index), right.get(index)) {
                    (Some(Some(lv)), Some(Some(rv))) => {
                        lv.compare_order(rv).unwrap_or(Ordering::Equal)
                    }
                    (Some(Some(_)), _) => Ordering::Greater,
                    (_, Some(Some(_))) => Ordering::Less,
                    _ => Ordering::Equal,
                };

                let ordering = match direction {
                    OrderDirection::Asc => ordering,
                    OrderDirection::Desc => ordering.reverse(),
                };

                if ordering != Ordering::Equal {
                    return ordering;
                }
            }

            a.cmp(b)
        });
    }
}

// Members of the structure passing every window filter.
fn structure_window_ids(
    structures: &StructureStore,
    window: &StructureWindow,
) -> BTreeSet<ElementId> {
    let mut allowed = structures.member_ids_where(window.structure_id, |node| {
        let level_ok = window.level.is_none_or(|level| node.level == level);
        let leaves_ok = window.leaves.is_none_or(|leaves| node.is_leaf() == leaves);
        let descendants_ok = window
            .has_descendants
            .is_none_or(|has| !node.is_leaf() == has);

        level_ok && leaves_ok && descendants_ok
    });

    if let Some((anchor, dist)) = &window.descendant_of {
        let descendants = structures.descendant_ids(anchor, *dist);
        allowed = allowed.intersection(&descendants).copied().collect();
    }
    if let Some((anchor, dist)) = &window.ancestor_of {
        let ancestors = structures.ancestor_ids(anchor, *dist);
        allowed = allowed.intersection(&ancestors).copied().collect();
    }

    allowed
}
