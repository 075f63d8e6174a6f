use crate::{
    db::{
        Db,
        condition::Condition,
        context::QueryContext,
        query::{
            order::{OrderBy, OrderSpec, normalize_order_by},
            param::ParamOperator,
            predicate::Predicate,
            related::RelatedToInput,
        },
    },
    error::{EngineError, ErrorClass, ErrorOrigin},
    types::{DateRange, ElementId, SiteId, StructureId},
    value::Value,
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error as ThisError;

///
/// QueryError
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    #[error("cannot merge an additional related-to filter: {detail}")]
    RelatedToMerge { detail: &'static str },

    #[error("id param '{value}' is not an integer element id")]
    InvalidId { value: String },

    #[error("unknown element status '{value}'")]
    InvalidStatus { value: String },

    #[error("structure filters require structure_id")]
    StructureFilterWithoutStructure,

    #[error("element {element_id} has no node in structure {structure_id}")]
    AnchorNotInStructure {
        element_id: ElementId,
        structure_id: StructureId,
    },
}

impl QueryError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::RelatedToMerge { .. } => ErrorClass::Unsupported,
            _ => ErrorClass::InvalidParams,
        }
    }
}

impl From<QueryError> for EngineError {
    fn from(err: QueryError) -> Self {
        Self::new(err.class(), ErrorOrigin::Query, err.to_string())
    }
}

///
/// ElementQuery
///
/// Mutable query builder over one `Db` handle. Holds raw parameter
/// state; normalization and expansion happen at compile time, once per
/// execution call. Owned exclusively by the calling code; `Clone`
/// produces a deep, independent copy.
///

#[derive(Clone, Debug)]
pub struct ElementQuery<'a> {
    pub(crate) db: &'a Db,
    pub(crate) ctx: QueryContext,

    pub(crate) id: Option<Value>,
    pub(crate) slug: Option<Value>,
    pub(crate) uri: Option<Value>,
    pub(crate) title: Option<Value>,
    pub(crate) status: Option<Value>,
    pub(crate) trashed: Option<bool>,
    pub(crate) site_id: Option<SiteId>,
    pub(crate) search: Option<String>,
    pub(crate) date_created: Option<DateRange>,
    pub(crate) date_updated: Option<DateRange>,
    pub(crate) related_to: Option<RelatedToInput>,
    pub(crate) field_filters: BTreeMap<String, Value>,

    pub(crate) structure_id: Option<StructureId>,
    pub(crate) level: Option<u32>,
    pub(crate) ancestor_of: Option<ElementId>,
    pub(crate) ancestor_dist: Option<u32>,
    pub(crate) descendant_of: Option<ElementId>,
    pub(crate) descendant_dist: Option<u32>,
    pub(crate) has_descendants: Option<bool>,
    pub(crate) leaves: Option<bool>,
    pub(crate) fixed_order: bool,

    pub(crate) order: Option<OrderSpec>,
    pub(crate) limit: Option<usize>,
    pub(crate) offset: Option<usize>,

    pub(crate) extra_where: Vec<Predicate>,
    pub(crate) id_restriction: Option<BTreeSet<ElementId>>,
    set_params: BTreeSet<&'static str>,
}

impl<'a> ElementQuery<'a> {
    #[must_use]
    pub fn new(db: &'a Db, ctx: QueryContext) -> Self {
        Self {
            db,
            ctx,
            id: None,
            slug: None,
            uri: None,
            title: None,
            status: None,
            trashed: None,
            site_id: None,
            search: None,
            date_created: None,
            date_updated: None,
            related_to: None,
            field_filters: BTreeMap::new(),
            structure_id: None,
            level: None,
            ancestor_of: None,
            ancestor_dist: None,
            descendant_of: None,
            descendant_dist: None,
            has_descendants: None,
            leaves: None,
            fixed_order: false,
            order: None,
            limit: None,
            offset: None,
            extra_where: Vec::new(),
            id_restriction: None,
            set_params: BTreeSet::new(),
        }
    }

    // ------------------------------------------------------------------
    // Value filters
    // ------------------------------------------------------------------

    /// Filter by element id. Accepts the comma/operator syntax.
    #[must_use]
    pub fn id(mut self, value: impl Into<Value>) -> Self {
        self.id = Some(value.into());
        self.set_params.insert("id");
        self
    }

    #[must_use]
    pub fn slug(mut self, value: impl Into<Value>) -> Self {
        self.slug = Some(value.into());
        self.set_params.insert("slug");
        self
    }

    #[must_use]
    pub fn uri(mut self, value: impl Into<Value>) -> Self {
        self.uri = Some(value.into());
        self.set_params.insert("uri");
        self
    }

    #[must_use]
    pub fn title(mut self, value: impl Into<Value>) -> Self {
        self.title = Some(value.into());
        self.set_params.insert("title");
        self
    }

    /// Filter by stored status. Accepts the comma/operator syntax.
    #[must_use]
    pub fn status(mut self, value: impl Into<Value>) -> Self {
        self.status = Some(value.into());
        self.set_params.insert("status");
        self
    }

    /// `true` returns only trashed elements; the default excludes them.
    #[must_use]
    pub fn trashed(mut self, trashed: bool) -> Self {
        self.trashed = Some(trashed);
        self.set_params.insert("trashed");
        self
    }

    /// Restrict to elements available on one site. Defaults to the
    /// context's site scope when unset.
    #[must_use]
    pub fn site(mut self, site_id: SiteId) -> Self {
        self.site_id = Some(site_id);
        self.set_params.insert("site");
        self
    }

    /// Case-insensitive term match over title and slug.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self.set_params.insert("search");
        self
    }

    #[must_use]
    pub fn date_created(mut self, range: DateRange) -> Self {
        self.date_created = Some(range);
        self.set_params.insert("date_created");
        self
    }

    #[must_use]
    pub fn date_updated(mut self, range: DateRange) -> Self {
        self.date_updated = Some(range);
        self.set_params.insert("date_updated");
        self
    }

    /// Filter by a custom field's value, routed through the rule
    /// registered for the field's handle at compile time.
    #[must_use]
    pub fn field(mut self, handle: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field_filters.insert(handle.into(), value.into());
        self.set_params.insert("fields");
        self
    }

    // ------------------------------------------------------------------
    // Relation filters
    // ------------------------------------------------------------------

    /// Replace the raw relation filter.
    #[must_use]
    pub fn related_to(mut self, value: impl Into<RelatedToInput>) -> Self {
        self.related_to = Some(value.into());
        self.set_params.insert("related_to");
        self
    }

    ///
    /// Merge a further relation filter under an implicit AND. Fails
    /// with an Unsupported error when the existing filter cannot be
    /// losslessly combined; see `merge_related_to` for the merge rules.
    ///
    pub fn and_related_to(mut self, value: impl Into<RelatedToInput>) -> Result<Self, EngineError> {
        self.merge_related_to(value.into())?;
        Ok(self)
    }

    ///
    /// Mutation-contract form of `and_related_to`.
    ///
    /// Merge rules: an absent filter is replaced; an `and` list gains a
    /// criterion; an `or` or unprefixed list with exactly one criterion
    /// is rewrapped under `and`. A bare single-target shorthand, a
    /// `not` list, or an `or` list with several criteria refuses the
    /// merge: combining those would silently change meaning.
    ///
    pub fn merge_related_to(&mut self, value: RelatedToInput) -> Result<(), EngineError> {
        self.set_params.insert("related_to");

        let merged = match self.related_to.take() {
            None => value,
            Some(existing) => merge_related(existing, value)?,
        };
        self.related_to = Some(merged);

        Ok(())
    }

    // ------------------------------------------------------------------
    // Structure filters
    // ------------------------------------------------------------------

    #[must_use]
    pub fn structure_id(mut self, structure_id: StructureId) -> Self {
        self.structure_id = Some(structure_id);
        self.set_params.insert("structure_id");
        self
    }

    #[must_use]
    pub fn level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self.set_params.insert("level");
        self
    }

    /// Restrict to ancestors of the given element.
    #[must_use]
    pub fn ancestor_of(mut self, element_id: ElementId) -> Self {
        self.ancestor_of = Some(element_id);
        self.set_params.insert("ancestor_of");
        self
    }

    /// Bound `ancestor_of` to at most this many levels above the anchor.
    #[must_use]
    pub fn ancestor_dist(mut self, dist: u32) -> Self {
        self.ancestor_dist = Some(dist);
        self
    }

    /// Restrict to descendants of the given element.
    #[must_use]
    pub fn descendant_of(mut self, element_id: ElementId) -> Self {
        self.descendant_of = Some(element_id);
        self.set_params.insert("descendant_of");
        self
    }

    /// Bound `descendant_of` to at most this many levels below the anchor.
    #[must_use]
    pub fn descendant_dist(mut self, dist: u32) -> Self {
        self.descendant_dist = Some(dist);
        self
    }

    #[must_use]
    pub fn has_descendants(mut self, has: bool) -> Self {
        self.has_descendants = Some(has);
        self.set_params.insert("has_descendants");
        self
    }

    #[must_use]
    pub fn leaves(mut self, leaves: bool) -> Self {
        self.leaves = Some(leaves);
        self.set_params.insert("leaves");
        self
    }

    /// Return results in the order of the `id` param's id list,
    /// overriding any other ordering criteria.
    #[must_use]
    pub fn fixed_order(mut self, fixed: bool) -> Self {
        self.fixed_order = fixed;
        self.set_params.insert("fixed_order");
        self
    }

    // ------------------------------------------------------------------
    // Ordering / paging
    // ------------------------------------------------------------------

    #[must_use]
    pub fn order_by(mut self, order: impl Into<OrderBy>) -> Self {
        self.order = Some(normalize_order_by(&order.into()));
        self.set_params.insert("order_by");
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    // ------------------------------------------------------------------
    // Conditions / mutation contract
    // ------------------------------------------------------------------

    ///
    /// Apply a condition against the query's current state. `All`
    /// conditions mutate this query in sequence; `Any` conditions
    /// evaluate a cloned branch per rule and restrict this query to the
    /// union of branch results.
    ///
    pub fn apply_condition(mut self, condition: &Condition) -> Result<Self, EngineError> {
        condition.apply(&mut self)?;
        Ok(self)
    }

    /// AND a further WHERE-shaped fragment onto the query.
    pub fn and_where(&mut self, predicate: Predicate) {
        self.extra_where.push(predicate);
    }

    /// Intersect the result set with an explicit id set.
    pub fn restrict_to_ids(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        let ids: BTreeSet<ElementId> = ids.into_iter().collect();
        self.id_restriction = Some(match self.id_restriction.take() {
            Some(existing) => existing.intersection(&ids).copied().collect(),
            None => ids,
        });
    }

    /// Whether a native param was explicitly set by the caller.
    #[must_use]
    pub fn has_param(&self, name: &str) -> bool {
        self.set_params.contains(name)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn db(&self) -> &'a Db {
        self.db
    }

    #[must_use]
    pub const fn context(&self) -> &QueryContext {
        &self.ctx
    }
}

// Merge an additional criterion onto an existing raw filter, refusing
// ambiguous shapes instead of guessing.
fn merge_related(
    existing: RelatedToInput,
    new: RelatedToInput,
) -> Result<RelatedToInput, QueryError> {
    let RelatedToInput::List(items) = existing else {
        return Err(QueryError::RelatedToMerge {
            detail: "the existing filter is a single-target shorthand",
        });
    };

    if items.is_empty() {
        return Ok(new);
    }

    let operator = match items.first() {
        Some(RelatedToInput::Word(word)) => ParamOperator::parse(word),
        _ => None,
    };
    let criteria = if operator.is_some() {
        items[1..].to_vec()
    } else {
        items
    };

    match operator {
        Some(ParamOperator::And) => {
            let mut merged = criteria;
            merged.push(new);
            Ok(RelatedToInput::and(merged))
        }

        Some(ParamOperator::Or) | None if criteria.len() == 1 => {
            Ok(RelatedToInput::and([criteria.into_iter().next().unwrap(), new]))
        }

        Some(ParamOperator::Or) | None => Err(QueryError::RelatedToMerge {
            detail: "the existing filter is an 'or' of several criteria",
        }),

        Some(ParamOperator::Not) => Err(QueryError::RelatedToMerge {
            detail: "the existing filter is negated",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::query::related::ScopedCriterion;
    use crate::test_fixtures::empty_db;

    fn query(db: &Db) -> ElementQuery<'_> {
        ElementQuery::new(db, QueryContext::default())
    }

    #[test]
    fn and_related_to_replaces_an_absent_filter() {
        let db = empty_db();
        let q = query(&db).and_related_to(5u64).unwrap();

        assert_eq!(q.related_to, Some(RelatedToInput::Id(5)));
    }

    #[test]
    fn and_related_to_appends_to_an_and_list() {
        let db = empty_db();
        let q = query(&db)
            .related_to(RelatedToInput::and([RelatedToInput::Id(1), RelatedToInput::Id(2)]))
            .and_related_to(3u64)
            .unwrap();

        assert_eq!(
            q.related_to,
            Some(RelatedToInput::and([
                RelatedToInput::Id(1),
                RelatedToInput::Id(2),
                RelatedToInput::Id(3),
            ]))
        );
    }

    #[test]
    fn and_related_to_rewraps_a_single_criterion_list() {
        let db = empty_db();
        let q = query(&db)
            .related_to(vec![RelatedToInput::Id(1)])
            .and_related_to(2u64)
            .unwrap();

        assert_eq!(
            q.related_to,
            Some(RelatedToInput::and([RelatedToInput::Id(1), RelatedToInput::Id(2)]))
        );
    }

    #[test]
    fn and_related_to_refuses_bare_shorthand() {
        let db = empty_db();
        let err = query(&db)
            .related_to(5u64)
            .and_related_to(6u64)
            .unwrap_err();

        assert_eq!(err.class, ErrorClass::Unsupported);
    }

    #[test]
    fn and_related_to_refuses_scoped_shorthand() {
        let db = empty_db();
        let err = query(&db)
            .related_to(ScopedCriterion::element(5u64).via_field("tags"))
            .and_related_to(6u64)
            .unwrap_err();

        assert_eq!(err.class, ErrorClass::Unsupported);
    }

    #[test]
    fn and_related_to_refuses_multi_criteria_or() {
        let db = empty_db();
        let err = query(&db)
            .related_to(vec![RelatedToInput::Id(1), RelatedToInput::Id(2)])
            .and_related_to(3u64)
            .unwrap_err();

        assert_eq!(err.class, ErrorClass::Unsupported);
    }

    #[test]
    fn clones_are_independent() {
        let db = empty_db();
        let original = query(&db).slug("about");
        let mut clone = original.clone();
        clone.and_where(Predicate::eq("title", Value::from("About")));
        clone = clone.limit(1);

        assert!(original.extra_where.is_empty());
        assert_eq!(original.limit, None);
        assert_eq!(clone.extra_where.len(), 1);
    }

    #[test]
    fn set_params_track_explicit_calls() {
        let db = empty_db();
        let q = query(&db).slug("about");

        assert!(q.has_param("slug"));
        assert!(!q.has_param("title"));
    }
}
