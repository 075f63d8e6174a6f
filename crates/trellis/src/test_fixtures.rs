use crate::{
    db::{
        Db, DbConfig,
        condition::FieldDef,
        element::{Element, ElementStatus},
        store::{RelationEdge, StructureNode},
    },
    types::Timestamp,
};

pub(crate) const TAGS_FIELD: u64 = 10;
pub(crate) const AUTHOR_FIELD: u64 = 11;

pub(crate) const TAG_RED: u64 = 100;
pub(crate) const TAG_BLUE: u64 = 101;
pub(crate) const AUTHOR_JANE: u64 = 102;

pub(crate) const STRUCTURE: u64 = 7;

pub(crate) fn empty_db() -> Db {
    Db::new()
}

///
/// Content fixture shared by the query tests.
///
/// Entries 1–5 (5 is trashed), relation targets 100–102, and a
/// structure over elements 20–25:
///
///   20 (1,12)
///   ├── 21 (2,7)
///   │   ├── 22 (3,4)
///   │   └── 23 (5,6)
///   ├── 24 (8,9)
///   └── 25 (10,11)
///
pub(crate) fn content_db() -> Db {
    content_db_with_config(DbConfig::default())
}

pub(crate) fn content_db_with_config(config: DbConfig) -> Db {
    let mut db = Db::with_config(config);

    let fields = db.fields_mut();
    fields.register(FieldDef::relation(TAGS_FIELD, "tags")).unwrap();
    fields.register(FieldDef::relation(AUTHOR_FIELD, "author")).unwrap();
    fields.register(FieldDef::text(12, "category")).unwrap();
    fields.register(FieldDef::number(13, "rating")).unwrap();
    fields.register(FieldDef::date(14, "published_at")).unwrap();
    fields.register(FieldDef::lightswitch(15, "featured")).unwrap();

    let ts = Timestamp::from_unix;
    let elements = [
        Element::new(1)
            .with_slug("alpha")
            .with_title("Alpha Post")
            .with_site(1)
            .with_dates(ts(1_000), ts(1_500))
            .with_field("category", "news")
            .with_field("rating", 3i64)
            .with_field("featured", true),
        Element::new(2)
            .with_slug("beta")
            .with_title("Beta Post")
            .with_site(1)
            .with_site(2)
            .with_dates(ts(2_000), ts(2_500))
            .with_field("category", "tech")
            .with_field("rating", 5i64),
        Element::new(3)
            .with_slug("gamma")
            .with_title("Gamma Draft")
            .with_status(ElementStatus::Pending)
            .with_site(1)
            .with_dates(ts(3_000), ts(3_500))
            .with_field("rating", 1i64),
        Element::new(4)
            .with_slug("delta")
            .with_title("Delta Post")
            .with_status(ElementStatus::Disabled)
            .with_site(2)
            .with_dates(ts(4_000), ts(4_500)),
        Element::new(5)
            .with_slug("epsilon")
            .with_title("Epsilon Post")
            .with_site(1)
            .with_dates(ts(5_000), ts(5_500))
            .with_deleted(ts(6_000)),
        Element::new(TAG_RED).with_slug("tag-red").with_title("Red").with_site(1),
        Element::new(TAG_BLUE).with_slug("tag-blue").with_title("Blue").with_site(1),
        Element::new(AUTHOR_JANE)
            .with_slug("jane")
            .with_title("Jane")
            .with_site(1),
    ];
    for element in elements {
        db.elements_mut().save(element);
    }

    // Structure members.
    for id in 20..=25 {
        db.elements_mut().save(
            Element::new(id)
                .with_slug(format!("node-{id}"))
                .with_title(format!("Node {id}"))
                .with_site(1),
        );
    }
    for (element_id, lft, rgt, level) in [
        (20, 1, 12, 1),
        (21, 2, 7, 2),
        (22, 3, 4, 3),
        (23, 5, 6, 3),
        (24, 8, 9, 2),
        (25, 10, 11, 2),
    ] {
        db.structures_mut().save(StructureNode {
            element_id,
            structure_id: STRUCTURE,
            lft,
            rgt,
            level,
        });
    }

    // Element 1 relates to both tags, element 2 to red only.
    let edges = [
        RelationEdge::new(1, TAG_RED, 1).for_field(TAGS_FIELD).for_site(1),
        RelationEdge::new(1, TAG_BLUE, 2).for_field(TAGS_FIELD).for_site(1),
        RelationEdge::new(2, TAG_RED, 1).for_field(TAGS_FIELD).for_site(1),
        RelationEdge::new(3, AUTHOR_JANE, 1).for_field(AUTHOR_FIELD).for_site(1),
        RelationEdge::new(2, AUTHOR_JANE, 1).for_field(AUTHOR_FIELD).for_site(2),
    ];
    for edge in edges {
        db.relations_mut().save(edge);
    }

    db
}

pub(crate) fn sorted(mut ids: Vec<u64>) -> Vec<u64> {
    ids.sort_unstable();
    ids
}
