use odm::{db::Builder, Field, Schema, Value};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tests::{assert_err, schemas, DbTest};

fn chain() -> (Arc<Schema>, Arc<Schema>, Arc<Schema>) {
    let v1 = Arc::new(
        Schema::builder("schema1")
            .field(Field::string("_id"))
            .field(Field::integer("number"))
            .field(Field::float("deleted"))
            .build()
            .unwrap(),
    );

    let v2 = Arc::new(
        Schema::builder("schema2")
            .field(Field::string("_id"))
            .field(Field::string("name").default("name"))
            .field(Field::integer("number"))
            .version(2)
            .version_of(v1.clone())
            .migrate(|old, new| {
                new.set("number", old.get("number").as_i64().unwrap_or(0) + 1);
                Ok(())
            })
            .unmigrate(|new, old| {
                old.set("number", new.get("number").as_i64().unwrap_or(0) - 1);
                Ok(())
            })
            .build()
            .unwrap(),
    );

    let v3 = Arc::new(
        Schema::builder("schema3")
            .field(Field::string("_id"))
            .field(Field::string("name"))
            .field(Field::integer("number"))
            .version(3)
            .version_of(v2.clone())
            .migrate(|old, new| {
                new.set("number", old.get("number").as_i64().unwrap_or(0) + 1);
                Ok(())
            })
            .unmigrate(|new, old| {
                old.set("number", new.get("number").as_i64().unwrap_or(0) - 1);
                Ok(())
            })
            .build()
            .unwrap(),
    );

    (v1, v2, v3)
}

fn models() -> Builder {
    let (v1, v2, v3) = chain();
    schemas!(v1, v2, v3)
}

#[test]
fn versions_share_one_collection() {
    let (v1, v2, v3) = chain();
    assert_eq!(v1.collection(), "schema1");
    assert_eq!(v2.collection(), "schema1");
    assert_eq!(v3.collection(), "schema1");
    assert_eq!(v3.version_chain().len(), 3);
}

#[test]
fn loading_through_a_newer_version_migrates_forward() {
    let test = DbTest::new();
    let db = test.setup_db(models());

    let old = db.create("schema1").unwrap();
    old.set("_id", "a").unwrap();
    old.set("number", 1).unwrap();
    old.set("deleted", 0.5).unwrap();
    old.save(&db).unwrap();

    let v2 = db.get("schema2", "a").unwrap();
    assert_eq!(v2.get("number").unwrap(), Value::I64(2));
    assert_eq!(v2.get("name").unwrap(), Value::from("name"));

    let v3 = db.get("schema3", "a").unwrap();
    assert_eq!(v3.get("number").unwrap(), Value::I64(3));
    assert!(!v3.ptr_eq(&v2));

    // saving through the newest version rewrites the stored version
    v3.save(&db).unwrap();
    let documents = test.storage().documents("schema1");
    let stored = &documents[0];
    assert_eq!(stored["__version"], Value::I64(3));
    assert_eq!(stored["number"], Value::I64(3));
}

#[test]
fn loading_through_an_older_version_migrates_backward() {
    let db = tests::setup(models());

    let new = db.create("schema3").unwrap();
    new.set("_id", "b").unwrap();
    new.set("name", "bee").unwrap();
    new.set("number", 5).unwrap();
    new.save(&db).unwrap();

    let old = db.get("schema1", "b").unwrap();
    assert_eq!(old.get("number").unwrap(), Value::I64(3));
    assert_eq!(old.get("deleted").unwrap(), Value::Null);

    let middle = db.get("schema2", "b").unwrap();
    assert_eq!(middle.get("number").unwrap(), Value::I64(4));
    assert_eq!(middle.get("name").unwrap(), Value::from("bee"));
}

#[test]
fn queries_span_every_version() {
    let db = tests::setup(models());
    for (schema, id) in [("schema1", "x"), ("schema3", "y")] {
        let record = db.create(schema).unwrap();
        record.set("_id", id).unwrap();
        record.set("number", 10).unwrap();
        record.save(&db).unwrap();
    }

    let numbers: Vec<_> = db
        .find_all("schema3")
        .unwrap()
        .sort(["_id"])
        .to_vec()
        .unwrap()
        .iter()
        .map(|record| record.get("number").unwrap())
        .collect();
    assert_eq!(numbers, [Value::I64(12), Value::I64(10)]);
}

#[test]
fn failing_transforms_fail_the_load() {
    let v1 = Arc::new(
        Schema::builder("ledger")
            .field(Field::string("_id"))
            .build()
            .unwrap(),
    );
    let v2 = Schema::builder("ledger2")
        .field(Field::string("_id"))
        .version(2)
        .version_of(v1.clone())
        .migrate(|_, _| Err(odm::err!("ledger entries cannot be upgraded")))
        .build()
        .unwrap();
    let db = tests::setup(schemas!(v1, v2));

    let entry = db.create("ledger").unwrap();
    entry.set("_id", "e1").unwrap();
    entry.save(&db).unwrap();

    let err = assert_err!(db.get("ledger2", "e1"));
    assert!(err.to_string().contains("ledger entries cannot be upgraded"));
}

#[test]
fn explain_describes_each_step() {
    let (_, _, v3) = chain();
    assert_eq!(
        v3.explain_migration(),
        "schema1 (version 1) -> schema2 (version 2)\n  add: name\n  drop: deleted\n  migrate: custom\n\
         schema2 (version 2) -> schema3 (version 3)\n  migrate: custom\n"
    );
}
