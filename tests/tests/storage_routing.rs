use odm::{Db, Field, Schema};
use odm_driver_memory::MemoryStorage;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tests::{assert_err, schemas, LoggingStorage};

fn user() -> Schema {
    Schema::builder("user")
        .field(Field::string("name").primary())
        .build()
        .unwrap()
}

fn audit() -> Schema {
    Schema::builder("audit")
        .field(Field::string("_id"))
        .field(Field::string("message"))
        .build()
        .unwrap()
}

#[test]
fn schemas_use_their_bound_storage() {
    let main = Arc::new(LoggingStorage::new(MemoryStorage::new()));
    let side = Arc::new(LoggingStorage::new(MemoryStorage::new()));

    let mut builder = schemas!(user(), audit());
    builder.default_storage(main.clone()).storage("audit", side.clone());
    let db = builder.build().unwrap();

    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();
    ann.save(&db).unwrap();

    let entry = db.create("audit").unwrap();
    entry.set("_id", "a1").unwrap();
    entry.set("message", "ann joined").unwrap();
    entry.save(&db).unwrap();

    assert_eq!(main.inner().documents("user").len(), 1);
    assert!(main.inner().documents("audit").is_empty());
    assert_eq!(side.inner().documents("audit").len(), 1);
    assert!(side.inner().documents("user").is_empty());
}

#[test]
fn unbound_schemas_fail_to_save() {
    let mut builder = Db::builder();
    builder.register(user());
    let db = builder.build().unwrap();

    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();
    assert!(assert_err!(ann.save(&db)).is_no_storage_backend());
    assert!(assert_err!(db.find_all("user").unwrap().count()).is_no_storage_backend());
}

#[test]
fn binding_an_unknown_schema_is_rejected() {
    let mut builder = schemas!(user());
    builder.storage("ghost", Arc::new(MemoryStorage::new()));
    assert!(assert_err!(builder.build()).is_invalid_schema());
}

#[test]
fn references_to_unregistered_schemas_are_rejected() {
    let post = Schema::builder("post")
        .field(Field::string("_id"))
        .field(Field::foreign("author", "user"))
        .build()
        .unwrap();
    let mut builder = Db::builder();
    builder.register(post);
    assert_err!(builder.build());
}
