use odm::{Db, Field, Record, Schema};
use std::{collections::HashSet, thread};
use tests::schemas;

fn assert_sync_send<T: Send + Sync>() {}

#[test]
fn handles_are_sync_send() {
    assert_sync_send::<Db>();
    assert_sync_send::<Record>();
    assert_sync_send::<odm::Cursor>();
    assert_sync_send::<odm::Error>();
}

#[test]
fn concurrent_optimistic_inserts_get_distinct_keys() {
    let note = Schema::builder("note")
        .field(Field::string("_id"))
        .field(Field::integer("n"))
        .optimistic(true)
        .build()
        .unwrap();
    let mut builder = schemas!(note);
    builder.optimistic_key_len(2);
    let db = tests::setup(builder);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let db = db.clone();
            thread::spawn(move || {
                (0..25)
                    .map(|i| {
                        let note = db.create("note").unwrap();
                        note.set("n", t * 100 + i).unwrap();
                        note.save(&db).unwrap();
                        note.primary_key().as_str().unwrap().to_string()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let keys: HashSet<String> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();
    assert_eq!(keys.len(), 200);
    assert_eq!(db.find_all("note").unwrap().count().unwrap(), 200);
}
