use super::*;
use crate::{
    db::condition::{
        Condition, LightswitchConditionRule, NumberConditionRule, SlugConditionRule,
        TextConditionRule, TextOperator,
    },
    error::ErrorClass,
    value::Value,
};

#[test]
fn all_conditions_intersect_their_rules() {
    let db = content_db();

    let condition = Condition::all()
        .with_rule(NumberConditionRule::at_least("rating", 3))
        .with_rule(TextConditionRule::new("category", TextOperator::Equals, "news"));

    let ids = db
        .query()
        .apply_condition(&condition)
        .unwrap()
        .element_ids()
        .unwrap();

    assert_eq!(ids, vec![1]);
}

#[test]
fn any_conditions_union_their_branches() {
    let db = content_db();

    let condition = Condition::any()
        .with_rule(TextConditionRule::new("category", TextOperator::Equals, "news"))
        .with_rule(NumberConditionRule::at_least("rating", 5));

    let ids = db
        .query()
        .apply_condition(&condition)
        .unwrap()
        .element_ids()
        .unwrap();

    assert_eq!(sorted(ids), vec![1, 2]);
}

#[test]
fn invalid_rule_configuration_fails_before_execution() {
    let db = content_db();

    let condition = Condition::all().with_rule(NumberConditionRule {
        field: "rating".into(),
        min: None,
        max: None,
    });

    let err = db.query().apply_condition(&condition).unwrap_err();
    assert_eq!(err.class, ErrorClass::InvalidParams);
}

#[test]
fn exclusive_params_conflict_with_direct_filters() {
    let db = content_db();

    let condition = Condition::all().with_rule(SlugConditionRule::new("beta"));

    let err = db
        .query()
        .slug("alpha")
        .apply_condition(&condition)
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::Conflict);

    // Without the direct filter the rule applies cleanly.
    let ids = db
        .query()
        .apply_condition(&condition)
        .unwrap()
        .element_ids()
        .unwrap();
    assert_eq!(ids, vec![2]);
}

#[test]
fn lightswitch_rules_match_boolean_fields() {
    let db = content_db();

    let condition = Condition::all().with_rule(LightswitchConditionRule::new("featured", true));

    let ids = db
        .query()
        .apply_condition(&condition)
        .unwrap()
        .element_ids()
        .unwrap();

    assert_eq!(ids, vec![1]);
}

#[test]
fn field_filters_route_through_registered_rules() {
    let db = content_db();

    // Number field: [min, max] range.
    let ids = db
        .query()
        .field("rating", vec![Value::Int(2), Value::Int(5)])
        .element_ids()
        .unwrap();
    assert_eq!(sorted(ids), vec![1, 2]);

    // Text field: comma/operator equality syntax.
    let ids = db
        .query()
        .field("category", "news,tech")
        .element_ids()
        .unwrap();
    assert_eq!(sorted(ids), vec![1, 2]);

    let ids = db
        .query()
        .field("category", "not news")
        .id("1,2")
        .element_ids()
        .unwrap();
    assert_eq!(ids, vec![2]);
}

#[test]
fn unknown_field_filters_fail_at_compile_time() {
    let db = content_db();

    let err = db.query().field("bogus", 1i64).element_ids().unwrap_err();
    assert_eq!(err.class, ErrorClass::InvalidParams);
}

#[test]
fn relation_fields_reject_value_filters() {
    let db = content_db();

    let err = db.query().field("tags", 1i64).element_ids().unwrap_err();
    assert_eq!(err.class, ErrorClass::InvalidParams);
}

#[test]
fn malformed_field_values_fail_at_compile_time() {
    let db = content_db();

    let err = db
        .query()
        .field("rating", "lots")
        .element_ids()
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::InvalidParams);
}
