use super::*;
use crate::{
    db::{DbConfig, ReadConsistency, element::ElementStatus},
    error::ErrorClass,
    types::{DateRange, Timestamp},
    value::Value,
};

#[test]
fn id_param_honors_the_operator_prefix() {
    let db = content_db();

    let ids = db.query().id("1,2,3").element_ids().unwrap();
    assert_eq!(ids, vec![1, 2, 3]);

    let ids = db.query().id("not 1,2,3").element_ids().unwrap();
    assert!(!ids.contains(&1));
    assert!(!ids.contains(&2));
    assert!(!ids.contains(&3));
    assert!(ids.contains(&4));
}

#[test]
fn malformed_ids_fail_at_compile_time() {
    let db = content_db();

    let err = db.query().id("1,banana").element_ids().unwrap_err();
    assert_eq!(err.class, ErrorClass::InvalidParams);
}

#[test]
fn fixed_order_returns_the_requested_sequence() {
    let db = content_db();

    let ids = db
        .query()
        .id(vec![3u64, 1, 2])
        .fixed_order(true)
        .order_by("slug")
        .element_ids()
        .unwrap();

    assert_eq!(ids, vec![3, 1, 2]);
}

#[test]
fn fixed_order_without_ids_falls_back_to_natural_order() {
    let db = content_db();

    let ids = db
        .query()
        .slug("alpha,beta")
        .fixed_order(true)
        .element_ids()
        .unwrap();

    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn status_filters_parse_and_negate() {
    let db = content_db();

    let ids = db.query().status("pending").element_ids().unwrap();
    assert_eq!(ids, vec![3]);

    let ids = db
        .query()
        .status("not pending,disabled")
        .id("1,2,3,4")
        .element_ids()
        .unwrap();
    assert_eq!(ids, vec![1, 2]);

    let err = db.query().status("live").element_ids().unwrap_err();
    assert_eq!(err.class, ErrorClass::InvalidParams);
}

#[test]
fn trashed_elements_are_excluded_by_default() {
    let db = content_db();

    let ids = db.query().slug("epsilon").element_ids().unwrap();
    assert!(ids.is_empty());

    let ids = db.query().trashed(true).element_ids().unwrap();
    assert_eq!(ids, vec![5]);
}

#[test]
fn site_scope_restricts_availability() {
    let db = content_db();

    let ids = db.query().site(2).element_ids().unwrap();
    assert_eq!(ids, vec![2, 4]);
}

#[test]
fn context_site_applies_when_no_site_param_is_set() {
    let db = content_db();
    let ctx = crate::db::QueryContext::new().for_site(2);

    let ids = db.query_with(ctx).element_ids().unwrap();
    assert_eq!(ids, vec![2, 4]);
}

#[test]
fn search_matches_title_and_slug_case_insensitively() {
    let db = content_db();

    let ids = db.query().search("ALPHA").element_ids().unwrap();
    assert_eq!(ids, vec![1]);

    let ids = db.query().search("post").id("1,2,3,4").element_ids().unwrap();
    assert_eq!(ids, vec![1, 2, 4]);
}

#[test]
fn date_windows_are_half_open() {
    let db = content_db();

    let range = DateRange::between(Timestamp::from_unix(1_000), Timestamp::from_unix(3_000));
    let ids = db.query().date_created(range).element_ids().unwrap();
    assert_eq!(sorted(ids), vec![1, 2]);
}

#[test]
fn count_is_independent_of_order_and_pagination() {
    let db = content_db();

    let base = db.query().structure_id(STRUCTURE);
    let windowed = base.clone().order_by("slug desc").limit(2).offset(1);

    assert_eq!(windowed.count().unwrap(), base.count().unwrap());
    assert_eq!(windowed.count().unwrap(), 6);
    assert_eq!(windowed.element_ids().unwrap().len(), 2);
}

#[test]
fn compilation_is_idempotent() {
    let db = content_db();

    let query = db
        .query()
        .related_to(vec![crate::db::query::related::RelatedToInput::Id(TAG_RED)])
        .order_by("date_created desc")
        .limit(10);

    let first = query.element_ids().unwrap();
    let second = query.element_ids().unwrap();
    assert_eq!(first, second);
    assert_eq!(query.count().unwrap(), first.len() as u64);
}

#[test]
fn one_returns_the_first_row_or_none() {
    let db = content_db();

    let element = db.query().slug("beta").one().unwrap().unwrap();
    assert_eq!(element.id, 2);

    assert!(db.query().slug("nonexistent").one().unwrap().is_none());
}

#[test]
fn all_hydrates_in_order() {
    let db = content_db();

    let response = db.query().id("1,2,3").order_by("date_created desc").all().unwrap();
    assert_eq!(response.ids(), vec![3, 2, 1]);
    assert_eq!(response.count(), 3);
}

#[test]
fn iter_is_restartable_and_batches() {
    let config = DbConfig {
        hydration_batch: 2,
        ..DbConfig::default()
    };
    let db = content_db_with_config(config);

    let query = db.query().structure_id(STRUCTURE);

    let first: Vec<u64> = query
        .iter()
        .unwrap()
        .map(|row| row.unwrap().id)
        .collect();
    let second: Vec<u64> = query
        .iter()
        .unwrap()
        .map(|row| row.unwrap().id)
        .collect();

    assert_eq!(first, vec![20, 21, 22, 23, 24, 25]);
    assert_eq!(first, second);
}

#[test]
fn missing_rows_follow_the_consistency_policy() {
    let db = content_db();

    // Default policy skips ids with no row.
    let ids = db.query().id("1,999").element_ids().unwrap();
    assert_eq!(ids, vec![1]);

    let strict = content_db_with_config(DbConfig {
        consistency: ReadConsistency::Strict,
        ..DbConfig::default()
    });
    let err = strict.query().id("1,999").element_ids().unwrap_err();
    assert_eq!(err.class, ErrorClass::Corruption);
}

#[test]
fn ordering_sorts_by_value_with_id_tiebreak() {
    let db = content_db();

    let ids = db
        .query()
        .id("1,2,3")
        .order_by("rating desc")
        .element_ids()
        .unwrap();

    assert_eq!(ids, vec![2, 1, 3]);
}

#[test]
fn response_cardinality_helpers() {
    let db = content_db();

    let response = db.query().slug("alpha").all().unwrap();
    response.require_one().unwrap();
    assert_eq!(response.row().unwrap().id, 1);

    let response = db.query().slug("alpha,beta").all().unwrap();
    assert!(response.require_one().is_err());
    response.require_some().unwrap();

    let response = db.query().slug("nonexistent").all().unwrap();
    assert!(response.require_some().is_err());
}

#[test]
fn status_enum_round_trips_through_values() {
    let db = content_db();

    let element = db.query().id(3u64).one().unwrap().unwrap();
    assert_eq!(element.status, ElementStatus::Pending);
    assert_eq!(
        element.value("status"),
        Some(Value::Text("pending".into()))
    );
}
