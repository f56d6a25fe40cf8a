use chrono::{TimeZone, Utc};
use odm::{Field, JsonTranslator, Query, Schema, StringTranslator, Value};
use odm_driver_memory::MemoryStorage;
use pretty_assertions::assert_eq;
use tests::{schemas, DbTest};

fn event() -> Schema {
    Schema::builder("event")
        .field(Field::string("_id"))
        .field(Field::integer("seats"))
        .field(Field::float("price"))
        .field(Field::boolean("public"))
        .field(Field::datetime("starts"))
        .field(Field::string("note"))
        .build()
        .unwrap()
}

fn save_event(db: &odm::Db) {
    let event = db.create("event").unwrap();
    event.set("_id", "launch").unwrap();
    event.set("seats", 120).unwrap();
    event.set("price", 9.5).unwrap();
    event.set("public", true).unwrap();
    event
        .set("starts", Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap())
        .unwrap();
    event.save(db).unwrap();
}

#[test]
fn string_translator_stores_text() {
    let test = DbTest::with_storage(MemoryStorage::new().with_translator(StringTranslator));
    let db = test.setup_db(schemas!(event()));
    save_event(&db);

    let documents = test.storage().documents("event");
    let stored = &documents[0];
    assert_eq!(stored["seats"], Value::from("120"));
    assert_eq!(stored["price"], Value::from("9.5"));
    assert_eq!(stored["public"], Value::from("true"));
    assert_eq!(stored["starts"], Value::from("2024-03-01T18:00:00+00:00"));
    assert_eq!(stored["note"], Value::from("none"));

    db.clear_caches();
    let event = db.get("event", "launch").unwrap();
    assert_eq!(event.get("seats").unwrap(), Value::I64(120));
    assert_eq!(event.get("price").unwrap(), Value::F64(9.5));
    assert_eq!(event.get("public").unwrap(), Value::Bool(true));
    assert_eq!(event.get("note").unwrap(), Value::Null);

    // query arguments are translated the same way
    let found = db.find("event", Query::eq("seats", 120)).unwrap();
    assert_eq!(found.count().unwrap(), 1);
    let found = db.find("event", Query::eq("public", true)).unwrap();
    assert_eq!(found.count().unwrap(), 1);
}

#[test]
fn json_translator_stores_datetimes_as_strings() {
    let test = DbTest::with_storage(MemoryStorage::new().with_translator(JsonTranslator));
    let db = test.setup_db(schemas!(event()));
    save_event(&db);

    let documents = test.storage().documents("event");
    let stored = &documents[0];
    assert_eq!(stored["seats"], Value::I64(120));
    assert_eq!(stored["starts"], Value::from("2024-03-01T18:00:00+00:00"));
    assert_eq!(stored["note"], Value::Null);

    db.clear_caches();
    let event = db.get("event", "launch").unwrap();
    assert_eq!(
        event.get("starts").unwrap(),
        Value::DateTime(Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap())
    );

    let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    let found = db.find("event", Query::gt("starts", later)).unwrap();
    assert_eq!(found.count().unwrap(), 1);
}

#[test]
fn default_translator_passes_values_through() {
    let test = DbTest::new();
    let db = test.setup_db(schemas!(event()));
    save_event(&db);

    let documents = test.storage().documents("event");
    assert_eq!(
        documents[0]["starts"],
        Value::DateTime(Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap())
    );
    assert_eq!(documents[0]["price"], Value::F64(9.5));
}
