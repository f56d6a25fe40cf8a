use odm::{Field, Query, Schema};
use pretty_assertions::assert_eq;
use tests::schemas;

fn user() -> Schema {
    Schema::builder("user")
        .field(Field::string("name").primary())
        .field(Field::integer("age"))
        .build()
        .unwrap()
}

fn ops(listener: &odm::Listener) -> Vec<(String, &'static str)> {
    listener
        .events()
        .into_iter()
        .map(|event| (event.schema, event.op))
        .collect()
}

#[test]
fn records_storage_calls_while_alive() {
    let db = tests::setup(schemas!(user()));
    let listener = db.listen();

    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();
    ann.save(&db).unwrap();
    db.get("user", "ann").unwrap();
    db.find("user", Query::gt("age", 1)).unwrap().count().unwrap();

    assert_eq!(
        ops(&listener),
        [("user".to_string(), "insert"), ("user".to_string(), "count")]
    );
}

#[test]
fn nothing_is_recorded_without_a_listener() {
    let db = tests::setup(schemas!(user()));
    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();
    ann.save(&db).unwrap();

    let listener = db.listen();
    assert!(listener.events().is_empty());
}

#[test]
fn nested_listeners_share_the_outer_recording() {
    let db = tests::setup(schemas!(user()));
    let outer = db.listen();

    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();
    ann.save(&db).unwrap();

    {
        let inner = db.listen();
        ann.set("age", 3).unwrap();
        ann.save(&db).unwrap();
        assert_eq!(inner.events().len(), 2);
    }

    assert_eq!(outer.events().len(), 2);
    db.find_all("user").unwrap().to_vec().unwrap();

    let report = outer.report();
    assert_eq!(report[&("user".to_string(), "insert")].0, 1);
    assert_eq!(report[&("user".to_string(), "update")].0, 1);
    assert_eq!(report[&("user".to_string(), "find")].0, 1);

    drop(outer);
    let fresh = db.listen();
    assert!(fresh.events().is_empty());
}
