use crate::{
    db::query::param::ParamOperator,
    error::{EngineError, ErrorClass, ErrorOrigin},
    types::{ElementId, SiteId},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// SiteRef
///
/// Site scope on a raw criterion. Human-readable handles must be
/// resolved to ids by the caller's resolver before normalization; a
/// handle reaching the normalizer is an input error.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SiteRef {
    Id(SiteId),
    Handle(String),
}

///
/// RelatedToInput
///
/// Raw "related to" filter value as supplied by the caller: a bare id,
/// an operator keyword or stringified id, a field/site-scoped
/// criterion, or a nested list of any of these.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelatedToInput {
    Id(ElementId),
    Word(String),
    Scoped(ScopedCriterion),
    List(Vec<RelatedToInput>),
}

impl RelatedToInput {
    #[must_use]
    pub fn and(items: impl IntoIterator<Item = Self>) -> Self {
        Self::prefixed(ParamOperator::And, items)
    }

    #[must_use]
    pub fn or(items: impl IntoIterator<Item = Self>) -> Self {
        Self::prefixed(ParamOperator::Or, items)
    }

    #[must_use]
    pub fn none_of(items: impl IntoIterator<Item = Self>) -> Self {
        Self::prefixed(ParamOperator::Not, items)
    }

    fn prefixed(operator: ParamOperator, items: impl IntoIterator<Item = Self>) -> Self {
        let mut list = vec![Self::Word(operator.as_str().to_string())];
        list.extend(items);

        Self::List(list)
    }
}

impl From<ElementId> for RelatedToInput {
    fn from(id: ElementId) -> Self {
        Self::Id(id)
    }
}

impl From<ScopedCriterion> for RelatedToInput {
    fn from(criterion: ScopedCriterion) -> Self {
        Self::Scoped(criterion)
    }
}

impl<T: Into<Self>> From<Vec<T>> for RelatedToInput {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

///
/// ScopedCriterion
///
/// One criterion scoped by the relation field that produced the edge
/// and/or the site of the source element's version. The `element`
/// sub-value may itself be a nested boolean combination.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ScopedCriterion {
    pub element: Option<Box<RelatedToInput>>,

    #[serde(default)]
    pub field: Option<String>,

    #[serde(default)]
    pub source_site: Option<SiteRef>,
}

impl ScopedCriterion {
    #[must_use]
    pub fn element(value: impl Into<RelatedToInput>) -> Self {
        Self {
            element: Some(Box::new(value.into())),
            field: None,
            source_site: None,
        }
    }

    #[must_use]
    pub fn via_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    #[must_use]
    pub fn from_site(mut self, site_id: SiteId) -> Self {
        self.source_site = Some(SiteRef::Id(site_id));
        self
    }
}

///
/// RelationOperator
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RelationOperator {
    And,
    #[default]
    Or,
}

///
/// RelatedToCriterion
///
/// Canonical criterion tree. Always rooted at a group so the compiler
/// can uniformly recurse. Built once per compile pass, never mutated.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RelatedToCriterion {
    Group(CriterionGroup),
    Leaf(CriterionLeaf),
}

///
/// CriterionGroup
///
/// `negated` records a top-level `not`, applied as the complement of
/// the group's match set by the containing query.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CriterionGroup {
    pub operator: RelationOperator,
    pub negated: bool,
    pub children: Vec<RelatedToCriterion>,
}

impl CriterionGroup {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

///
/// CriterionLeaf
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CriterionLeaf {
    pub element_ids: Vec<ElementId>,
    pub field: Option<String>,
    pub source_site: Option<SiteId>,
}

///
/// RelatedToError
///

#[derive(Debug, ThisError)]
pub enum RelatedToError {
    #[error("related-to criterion resolves to no elements: {detail}")]
    EmptyCriterion { detail: String },

    #[error("related-to criterion references unresolved site '{site}'")]
    UnresolvedSite { site: String },
}

impl RelatedToError {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::InvalidParams
    }
}

impl From<RelatedToError> for EngineError {
    fn from(err: RelatedToError) -> Self {
        Self::new(err.class(), ErrorOrigin::Relation, err.to_string())
    }
}

///
/// Normalize a raw "related to" value into the canonical criterion
/// tree. `None` yields an empty `Or` root (a no-op filter). Pure: ids
/// must already be resolved; no store access happens here.
///
pub fn normalize_related_to(
    input: Option<&RelatedToInput>,
) -> Result<CriterionGroup, RelatedToError> {
    match input {
        None => Ok(CriterionGroup::default()),
        Some(value) => normalize_group(value),
    }
}

// Step 2: interpret a value as an operator-prefixed criterion list.
fn normalize_group(value: &RelatedToInput) -> Result<CriterionGroup, RelatedToError> {
    let items: &[RelatedToInput] = match value {
        RelatedToInput::List(items) => items,
        other => std::slice::from_ref(other),
    };

    let (operator, negated, rest) = match items.first() {
        Some(RelatedToInput::Word(word)) => match ParamOperator::parse(word) {
            Some(ParamOperator::And) => (RelationOperator::And, false, &items[1..]),
            Some(ParamOperator::Or) => (RelationOperator::Or, false, &items[1..]),
            Some(ParamOperator::Not) => (RelationOperator::Or, true, &items[1..]),
            None => (RelationOperator::Or, false, items),
        },
        _ => (RelationOperator::Or, false, items),
    };

    let children = rest
        .iter()
        .map(normalize_criterion)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CriterionGroup {
        operator,
        negated,
        children,
    })
}

// Step 3: normalize one criterion element.
fn normalize_criterion(value: &RelatedToInput) -> Result<RelatedToCriterion, RelatedToError> {
    match value {
        RelatedToInput::Id(id) => Ok(leaf(vec![*id], None, None)),

        RelatedToInput::Word(word) => {
            let id = word
                .trim()
                .parse::<ElementId>()
                .map_err(|_| RelatedToError::EmptyCriterion {
                    detail: format!("'{word}' is not an element id"),
                })?;

            Ok(leaf(vec![id], None, None))
        }

        RelatedToInput::List(_) => {
            let group = normalize_group(value)?;
            if group.is_empty() {
                return Err(RelatedToError::EmptyCriterion {
                    detail: "empty criterion list".to_string(),
                });
            }

            Ok(collapse(group, None, None))
        }

        RelatedToInput::Scoped(scoped) => normalize_scoped(scoped),
    }
}

fn normalize_scoped(scoped: &ScopedCriterion) -> Result<RelatedToCriterion, RelatedToError> {
    let source_site = match &scoped.source_site {
        None => None,
        Some(SiteRef::Id(id)) => Some(*id),
        Some(SiteRef::Handle(handle)) => {
            return Err(RelatedToError::UnresolvedSite {
                site: handle.clone(),
            });
        }
    };

    let element = scoped
        .element
        .as_deref()
        .ok_or_else(|| RelatedToError::EmptyCriterion {
            detail: "criterion has no element value".to_string(),
        })?;

    let group = normalize_group(element)?;
    if group.is_empty() {
        return Err(RelatedToError::EmptyCriterion {
            detail: "criterion element value resolves to nothing".to_string(),
        });
    }

    Ok(collapse(group, scoped.field.clone(), source_site))
}

///
/// Collapse a normalized group under an outer field/site scope. Plain
/// unscoped leaves under a non-negated `Or` merge into one leaf;
/// anything else keeps the group and pushes the scope down to leaves
/// that lack their own.
///
fn collapse(
    group: CriterionGroup,
    field: Option<String>,
    source_site: Option<SiteId>,
) -> RelatedToCriterion {
    let plain_or = !group.negated
        && (group.operator == RelationOperator::Or || group.children.len() == 1)
        && group.children.iter().all(|child| {
            matches!(
                child,
                RelatedToCriterion::Leaf(leaf)
                    if leaf.field.is_none() && leaf.source_site.is_none()
            )
        });

    if plain_or {
        let element_ids = group
            .children
            .into_iter()
            .flat_map(|child| match child {
                RelatedToCriterion::Leaf(leaf) => leaf.element_ids,
                RelatedToCriterion::Group(_) => unreachable!(),
            })
            .collect();

        return RelatedToCriterion::Leaf(CriterionLeaf {
            element_ids,
            field,
            source_site,
        });
    }

    RelatedToCriterion::Group(apply_scope(group, field.as_deref(), source_site))
}

// Inherit the outer scope wherever a leaf has none of its own.
fn apply_scope(
    mut group: CriterionGroup,
    field: Option<&str>,
    source_site: Option<SiteId>,
) -> CriterionGroup {
    for child in &mut group.children {
        match child {
            RelatedToCriterion::Leaf(leaf) => {
                if leaf.field.is_none() {
                    leaf.field = field.map(ToString::to_string);
                }
                if leaf.source_site.is_none() {
                    leaf.source_site = source_site;
                }
            }
            RelatedToCriterion::Group(inner) => {
                *inner = apply_scope(std::mem::take(inner), field, source_site);
            }
        }
    }

    group
}

const fn leaf(
    element_ids: Vec<ElementId>,
    field: Option<String>,
    source_site: Option<SiteId>,
) -> RelatedToCriterion {
    RelatedToCriterion::Leaf(CriterionLeaf {
        element_ids,
        field,
        source_site,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_leaf(ids: &[ElementId]) -> RelatedToCriterion {
        leaf(ids.to_vec(), None, None)
    }

    #[test]
    fn empty_input_is_a_noop_or_root() {
        let root = normalize_related_to(None).unwrap();
        assert_eq!(root.operator, RelationOperator::Or);
        assert!(!root.negated);
        assert!(root.is_empty());
    }

    #[test]
    fn bare_id_becomes_one_or_rooted_leaf() {
        let input = RelatedToInput::Id(1);
        let root = normalize_related_to(Some(&input)).unwrap();

        assert_eq!(root.operator, RelationOperator::Or);
        assert_eq!(root.children, vec![plain_leaf(&[1])]);
    }

    #[test]
    fn stringified_ids_resolve() {
        let input = RelatedToInput::List(vec![
            RelatedToInput::Word("4".into()),
            RelatedToInput::Id(5),
        ]);
        let root = normalize_related_to(Some(&input)).unwrap();

        assert_eq!(root.children, vec![plain_leaf(&[4]), plain_leaf(&[5])]);
    }

    #[test]
    fn operator_word_sets_the_root() {
        let input = RelatedToInput::and([RelatedToInput::Id(1), RelatedToInput::Id(2)]);
        let root = normalize_related_to(Some(&input)).unwrap();

        assert_eq!(root.operator, RelationOperator::And);
        assert!(!root.negated);
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn not_is_a_negated_or_root() {
        let input = RelatedToInput::none_of([RelatedToInput::Id(3)]);
        let root = normalize_related_to(Some(&input)).unwrap();

        assert_eq!(root.operator, RelationOperator::Or);
        assert!(root.negated);
    }

    #[test]
    fn scoped_criterion_carries_field_and_site() {
        let input = RelatedToInput::Scoped(
            ScopedCriterion::element(7u64).via_field("author").from_site(2),
        );
        let root = normalize_related_to(Some(&input)).unwrap();

        assert_eq!(
            root.children,
            vec![leaf(vec![7], Some("author".into()), Some(2))]
        );
    }

    #[test]
    fn scoped_list_collapses_to_one_leaf() {
        let input = RelatedToInput::Scoped(
            ScopedCriterion::element(vec![7u64, 8, 9]).via_field("tags"),
        );
        let root = normalize_related_to(Some(&input)).unwrap();

        assert_eq!(
            root.children,
            vec![leaf(vec![7, 8, 9], Some("tags".into()), None)]
        );
    }

    #[test]
    fn nested_boolean_groups_keep_structure_and_inherit_scope() {
        let nested = RelatedToInput::and([RelatedToInput::Id(7), RelatedToInput::Id(8)]);
        let input = RelatedToInput::Scoped(ScopedCriterion::element(nested).via_field("tags"));
        let root = normalize_related_to(Some(&input)).unwrap();

        let RelatedToCriterion::Group(inner) = &root.children[0] else {
            panic!("expected nested group");
        };
        assert_eq!(inner.operator, RelationOperator::And);
        assert_eq!(
            inner.children,
            vec![
                leaf(vec![7], Some("tags".into()), None),
                leaf(vec![8], Some("tags".into()), None),
            ]
        );
    }

    #[test]
    fn inner_scope_wins_over_outer() {
        let inner = RelatedToInput::Scoped(ScopedCriterion::element(7u64).via_field("author"));
        let outer = RelatedToInput::Scoped(
            ScopedCriterion::element(RelatedToInput::List(vec![
                RelatedToInput::Word("and".into()),
                inner,
                RelatedToInput::Id(8),
            ]))
            .via_field("tags"),
        );
        let root = normalize_related_to(Some(&outer)).unwrap();

        let RelatedToCriterion::Group(group) = &root.children[0] else {
            panic!("expected nested group");
        };
        assert_eq!(
            group.children,
            vec![
                leaf(vec![7], Some("author".into()), None),
                leaf(vec![8], Some("tags".into()), None),
            ]
        );
    }

    #[test]
    fn unresolved_site_handle_is_an_error() {
        let input = RelatedToInput::Scoped(ScopedCriterion {
            element: Some(Box::new(RelatedToInput::Id(1))),
            field: None,
            source_site: Some(SiteRef::Handle("default".into())),
        });

        assert!(matches!(
            normalize_related_to(Some(&input)),
            Err(RelatedToError::UnresolvedSite { .. })
        ));
    }

    #[test]
    fn criterion_without_elements_is_an_error() {
        let input = RelatedToInput::Scoped(ScopedCriterion {
            element: None,
            field: Some("author".into()),
            source_site: None,
        });
        assert!(matches!(
            normalize_related_to(Some(&input)),
            Err(RelatedToError::EmptyCriterion { .. })
        ));

        let word = RelatedToInput::Word("draft-slug".into());
        assert!(matches!(
            normalize_related_to(Some(&word)),
            Err(RelatedToError::EmptyCriterion { .. })
        ));
    }

    #[test]
    fn serde_accepts_mixed_json_forms() {
        let input: RelatedToInput = serde_json::from_str(
            r#"["and", 12, {"element": [4, 5], "field": "tags", "source_site": 2}]"#,
        )
        .unwrap();

        let root = normalize_related_to(Some(&input)).unwrap();
        assert_eq!(root.operator, RelationOperator::And);
        assert_eq!(root.children.len(), 2);
        assert_eq!(
            root.children[1],
            leaf(vec![4, 5], Some("tags".into()), Some(2))
        );
    }
}
