use odm::{Field, Schema, ValidationKind, Validator, Value};
use pretty_assertions::assert_eq;
use tests::{assert_err, assert_ok, schemas, DbTest};

fn account() -> Schema {
    Schema::builder("account")
        .field(Field::string("handle").primary().validate(Validator::regex("^[a-z][a-z0-9_]*$").unwrap()))
        .field(Field::string("email").required())
        .field(
            Field::string("bio")
                .validate(Validator::min_length(3))
                .validate(Validator::max_length(20)),
        )
        .field(
            Field::integer("age")
                .validate(Validator::min_value(0))
                .validate(Validator::max_value(150)),
        )
        .field(Field::float("score"))
        .field(Field::string("site").validate(Validator::url()))
        .field(Field::string("nick").list().validate(Validator::max_length(2)))
        .field(Field::integer("even").validate(Validator::custom(|value| {
            match value.as_i64() {
                Some(n) if n % 2 != 0 => Err(format!("{n} is odd")),
                _ => Ok(()),
            }
        })))
        .field(Field::datetime("created").auto_now_add())
        .field(Field::datetime("touched").auto_now())
        .build()
        .unwrap()
}

fn valid(db: &odm::Db) -> odm::Record {
    let record = db.create("account").unwrap();
    record.set("handle", "ann_1").unwrap();
    record.set("email", "ann@example.com").unwrap();
    record
}

fn rejected(record: &odm::Record, db: &odm::Db) -> (ValidationKind, String) {
    let err = assert_err!(record.save(db));
    let validation = err.as_validation().expect("not a validation error");
    (validation.kind(), validation.field().to_string())
}

#[test]
fn valid_record_saves() {
    let db = tests::setup(schemas!(account()));
    let record = valid(&db);
    record.set("bio", "hello there").unwrap();
    record.set("age", 40).unwrap();
    record.set("score", 9.5).unwrap();
    record.set("site", "example.com/about").unwrap();
    record.set("nick", vec!["a", "b"]).unwrap();
    record.set("even", 4).unwrap();
    assert_ok!(record.save(&db));
}

#[test]
fn required_fields() {
    let db = tests::setup(schemas!(account()));
    let record = db.create("account").unwrap();
    record.set("handle", "ann").unwrap();
    assert_eq!(rejected(&record, &db), (ValidationKind::Required, "email".into()));

    let record = db.create("account").unwrap();
    record.set("email", "x@example.com").unwrap();
    assert_eq!(rejected(&record, &db), (ValidationKind::Required, "handle".into()));
}

#[test]
fn type_checks_are_strict() {
    let db = tests::setup(schemas!(account()));

    let record = valid(&db);
    record.set("age", "forty").unwrap();
    assert_eq!(rejected(&record, &db), (ValidationKind::Type, "age".into()));

    // integers are not floats
    let record = valid(&db);
    record.set("score", 9).unwrap();
    assert_eq!(rejected(&record, &db), (ValidationKind::Type, "score".into()));

    let record = valid(&db);
    record.set("nick", "solo").unwrap();
    assert_eq!(rejected(&record, &db), (ValidationKind::Type, "nick".into()));
}

#[test]
fn bounds() {
    let db = tests::setup(schemas!(account()));
    let cases: Vec<(&str, Value, ValidationKind)> = vec![
        ("bio", "hi".into(), ValidationKind::Length),
        ("bio", "x".repeat(21).into(), ValidationKind::Length),
        ("age", (-1).into(), ValidationKind::Value),
        ("age", 151.into(), ValidationKind::Value),
        ("nick", vec!["a", "b", "c"].into(), ValidationKind::Length),
    ];

    for (field, value, kind) in cases {
        let record = valid(&db);
        record.set(field, value.clone()).unwrap();
        assert_eq!(rejected(&record, &db), (kind, field.to_string()), "{field}={value}");
    }
}

#[test]
fn pattern_and_url() {
    let db = tests::setup(schemas!(account()));

    let record = valid(&db);
    record.set("handle", "Ann").unwrap();
    assert_eq!(rejected(&record, &db), (ValidationKind::Regex, "handle".into()));

    let record = valid(&db);
    record.set("site", "not a url").unwrap();
    assert_eq!(rejected(&record, &db), (ValidationKind::Url, "site".into()));

    let record = valid(&db);
    record.set("site", "gopher://example.com").unwrap();
    assert_eq!(rejected(&record, &db), (ValidationKind::Url, "site".into()));
}

#[test]
fn custom_validators_supply_the_message() {
    let db = tests::setup(schemas!(account()));
    let record = valid(&db);
    record.set("even", 3).unwrap();

    let err = assert_err!(record.save(&db));
    let validation = err.as_validation().unwrap();
    assert_eq!(validation.kind(), ValidationKind::Custom);
    assert_eq!(validation.message(), "3 is odd");
    assert_eq!(validation.value(), &Value::I64(3));
}

#[test]
fn failed_validation_writes_nothing() {
    let test = DbTest::new();
    let db = test.setup_db(schemas!(account()));
    let record = valid(&db);
    record.set("age", 200).unwrap();

    assert_err!(record.save(&db));
    assert!(test.log().is_empty());
    assert!(!record.is_loaded());
}

#[test]
fn non_editable_fields() {
    let db = tests::setup(schemas!(account()));
    let record = valid(&db);

    let err = assert_err!(record.set("created", chrono::Utc::now()));
    assert!(err.is_not_editable());
    assert!(assert_err!(record.set("touched", chrono::Utc::now())).is_not_editable());

    record.save(&db).unwrap();
    let err = assert_err!(db.update_one("account", "ann_1", [("created", Value::Null)]));
    assert!(err.is_not_editable());
}

#[test]
fn automatic_timestamps() {
    let db = tests::setup(schemas!(account()));
    let record = valid(&db);
    assert_eq!(record.get("touched").unwrap(), Value::Null);

    record.save(&db).unwrap();
    let created = record.get("created").unwrap();
    let first_touch = record.get("touched").unwrap();
    assert!(matches!(created, Value::DateTime(_)));
    assert!(matches!(first_touch, Value::DateTime(_)));

    record.set("bio", "updated").unwrap();
    record.save(&db).unwrap();
    assert_eq!(record.get("created").unwrap(), created);
    let second_touch = record.get("touched").unwrap();
    assert!(second_touch.partial_compare(&first_touch).is_some_and(|ord| ord.is_ge()));

    db.clear_caches();
    let loaded = db.get("account", "ann_1").unwrap();
    assert_eq!(loaded.get("created").unwrap(), created);
}
