use odm::{Field, Schema, Value};
use odm_core::stmt::ValueRef;
use pretty_assertions::assert_eq;
use tests::{assert_err, assert_none, assert_ok, schemas, DbTest};

fn user() -> Schema {
    Schema::builder("user")
        .field(Field::string("name").primary())
        .field(Field::integer("age").default(18))
        .field(Field::string("tags").list())
        .build()
        .unwrap()
}

#[test]
fn save_then_load_round_trips() {
    let test = DbTest::new();
    let db = test.setup_db(schemas!(user()));

    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();
    ann.set("age", 31).unwrap();
    ann.set("tags", vec!["admin", "ops"]).unwrap();
    assert!(!ann.is_loaded());
    assert_ok!(ann.save(&db));
    assert!(ann.is_loaded());
    assert_eq!(test.log().count_inserts(), 1);

    db.clear_caches();
    let loaded = db.get("user", "ann").unwrap();
    assert!(!loaded.ptr_eq(&ann));
    assert_eq!(loaded.get("age").unwrap(), Value::I64(31));
    assert_eq!(loaded.get("tags").unwrap(), Value::from(vec!["admin", "ops"]));
}

#[test]
fn defaults_apply_lazily() {
    let db = tests::setup(schemas!(user()));
    let bob = db.create("user").unwrap();
    assert_eq!(bob.get("age").unwrap(), Value::I64(18));
    assert_eq!(bob.get("tags").unwrap(), Value::List(vec![]));
    assert_eq!(bob.primary_key(), Value::Null);
}

#[test]
fn load_returns_the_cached_instance() {
    let test = DbTest::new();
    let db = test.setup_db(schemas!(user()));

    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();
    ann.save(&db).unwrap();
    test.log().clear();

    let first = db.get("user", "ann").unwrap();
    let second = db.get("user", "ann").unwrap();
    assert!(first.ptr_eq(&ann));
    assert!(second.ptr_eq(&ann));
    assert!(test.log().is_empty());

    db.clear_cached("user", "ann").unwrap();
    let third = db.get("user", "ann").unwrap();
    assert!(!third.ptr_eq(&ann));
    assert_eq!(test.log().count_gets(), 1);

    let fourth = db.get("user", "ann").unwrap();
    assert!(fourth.ptr_eq(&third));
}

#[test]
fn missing_records() {
    let db = tests::setup(schemas!(user()));
    assert_none!(db.load("user", "nobody").unwrap());
    let err = assert_err!(db.get("user", "nobody"));
    assert!(err.is_no_results_found());

    let err = assert_err!(db.create("ghost"));
    assert!(err.is_invalid_schema());
}

#[test]
fn update_sends_only_changed_fields() {
    let test = DbTest::new();
    let db = test.setup_db(schemas!(user()));

    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();
    ann.save(&db).unwrap();
    test.log().clear();

    ann.set("age", 40).unwrap();
    ann.save(&db).unwrap();

    let ops = test.log().ops();
    assert_eq!(ops.len(), 1);
    let tests::StorageOp::Update { changes, .. } = &ops[0] else {
        panic!("expected an update; actual={ops:?}");
    };
    let fields: Vec<_> = changes.keys().map(String::as_str).collect();
    assert_eq!(fields, ["age", "__backrefs", "__version"]);

    db.clear_caches();
    assert_eq!(db.get("user", "ann").unwrap().get("age").unwrap(), Value::I64(40));
}

#[test]
fn reload_discards_unsaved_changes() {
    let db = tests::setup(schemas!(user()));
    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();
    ann.set("age", 20).unwrap();
    ann.save(&db).unwrap();

    ann.set("age", 99).unwrap();
    ann.reload(&db).unwrap();
    assert_eq!(ann.get("age").unwrap(), Value::I64(20));

    let fresh = db.create("user").unwrap();
    assert!(assert_err!(fresh.reload(&db)).is_record_not_loaded());
}

#[test]
fn clone_record_drops_the_key() {
    let db = tests::setup(schemas!(user()));
    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();
    ann.set("age", 33).unwrap();
    ann.save(&db).unwrap();

    let copy = ann.clone_record().unwrap();
    assert_eq!(copy.primary_key(), Value::Null);
    assert_eq!(copy.get("age").unwrap(), Value::I64(33));
    assert!(!copy.is_loaded());

    copy.set("name", "ann2").unwrap();
    copy.save(&db).unwrap();
    assert_eq!(db.find_all("user").unwrap().count().unwrap(), 2);
}

#[test]
fn to_storage_includes_internal_entries() {
    let db = tests::setup(schemas!(user()));
    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();

    let document = ann.to_storage(&db).unwrap();
    assert_eq!(document["name"], Value::from("ann"));
    assert_eq!(document["__version"], Value::I64(1));
    assert_eq!(document["__backrefs"], Value::Map(Default::default()));
}

#[test]
fn removed_records_are_detached() {
    let test = DbTest::new();
    let db = test.setup_db(schemas!(user()));
    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();
    ann.save(&db).unwrap();

    ann.remove(&db).unwrap();
    assert!(ann.is_detached());
    assert!(assert_err!(ann.get("age")).is_detached_record());
    assert!(assert_err!(ann.set("age", 1)).is_detached_record());
    assert!(assert_err!(ann.save(&db)).is_detached_record());
    assert_none!(db.load("user", "ann").unwrap());
    assert!(test.storage().documents("user").is_empty());
}

#[test]
fn removing_an_unsaved_record_fails() {
    let db = tests::setup(schemas!(user()));
    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();
    assert!(assert_err!(ann.remove(&db)).is_record_not_loaded());
}

#[test]
fn duplicate_insert_is_key_exists() {
    let db = tests::setup(schemas!(user()));
    for _ in 0..2 {
        let ann = db.create("user").unwrap();
        ann.set("name", "ann").unwrap();
        if let Err(err) = ann.save(&db) {
            assert!(err.is_key_exists());
            return;
        }
    }
    panic!("second insert of the same key succeeded");
}

#[test]
fn primary_key_change_rekeys_the_caches() {
    let test = DbTest::new();
    let db = test.setup_db(schemas!(user()));
    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();
    ann.save(&db).unwrap();

    ann.set("name", "anne").unwrap();
    ann.save(&db).unwrap();

    assert_none!(db.load("user", "ann").unwrap());
    assert!(db.get("user", "anne").unwrap().ptr_eq(&ann));
    assert_eq!(test.storage().documents("user").len(), 1);
}

#[test]
fn unknown_fields_are_rejected() {
    let db = tests::setup(schemas!(user()));
    let ann = db.create("user").unwrap();
    assert!(assert_err!(ann.get("email")).is_unknown_field());
    assert!(assert_err!(ann.set("email", "a@b")).is_unknown_field());

    // assignment is unchecked; the type is checked on save
    ann.set("name", ValueRef::new("user", "x")).unwrap();
    let err = assert_err!(ann.save(&db));
    assert_eq!(err.as_validation().unwrap().kind(), odm::ValidationKind::Type);
}

#[test]
fn keys_are_cast_to_the_primary_type() {
    let item = Schema::builder("item")
        .field(Field::integer("_id"))
        .field(Field::string("label"))
        .build()
        .unwrap();
    let test = DbTest::new();
    let db = test.setup_db(schemas!(item));

    let first = db.create("item").unwrap();
    first.set("_id", 1).unwrap();
    first.set("label", "first").unwrap();
    first.save(&db).unwrap();

    // both spellings hit the same identity map entry
    assert!(db.get("item", 1).unwrap().ptr_eq(&first));
    assert!(db.get("item", "1").unwrap().ptr_eq(&first));

    db.clear_caches();
    test.log().clear();
    let by_string = db.get("item", "1").unwrap();
    assert!(db.get("item", 1).unwrap().ptr_eq(&by_string));
    assert_eq!(test.log().len(), 1);

    db.clear_cached("item", "1").unwrap();
    assert!(!db.get("item", 1).unwrap().ptr_eq(&by_string));

    assert!(assert_err!(db.load("item", "one")).is_type_conversion());
}

#[test]
fn dictionary_fields_round_trip() {
    let settings = Schema::builder("settings")
        .field(Field::string("_id"))
        .field(Field::dictionary("prefs"))
        .build()
        .unwrap();
    let test = DbTest::new();
    let db = test.setup_db(schemas!(settings));

    let ann = db.create("settings").unwrap();
    ann.set("_id", "ann").unwrap();
    assert_eq!(ann.get("prefs").unwrap(), Value::Map(Default::default()));

    let prefs: indexmap::IndexMap<String, Value> = [
        ("theme".to_string(), Value::from("dark")),
        ("size".to_string(), Value::I64(12)),
    ]
    .into_iter()
    .collect();
    ann.set("prefs", "dark").unwrap();
    assert!(assert_err!(ann.save(&db)).is_validation());

    ann.set("prefs", Value::Map(prefs.clone())).unwrap();
    ann.save(&db).unwrap();

    let documents = test.storage().documents("settings");
    assert_eq!(documents[0]["prefs"], Value::Map(prefs.clone()));

    db.clear_caches();
    let loaded = db.get("settings", "ann").unwrap();
    assert_eq!(loaded.get("prefs").unwrap(), Value::Map(prefs));
}
