use odm::{Db, Field, Query, Schema, Value};
use pretty_assertions::assert_eq;
use tests::{assert_err, schemas, DbTest};

fn item() -> Schema {
    Schema::builder("item")
        .field(Field::string("_id"))
        .field(Field::integer("order").index())
        .field(Field::string("group"))
        .field(Field::string("tags").list())
        .build()
        .unwrap()
}

fn seed(db: &Db) {
    for i in 0..10 {
        let item = db.create("item").unwrap();
        item.set("_id", format!("i{i}")).unwrap();
        item.set("order", i as i64).unwrap();
        item.set("group", if i % 2 == 0 { "even" } else { "odd" }).unwrap();
        item.set("tags", if i < 3 { vec!["small"] } else { vec!["large"] }).unwrap();
        item.save(db).unwrap();
    }
}

fn orders(records: Vec<odm::Record>) -> Vec<i64> {
    records
        .iter()
        .map(|record| record.get("order").unwrap().as_i64().unwrap())
        .collect()
}

#[test]
fn operators() {
    let db = tests::setup(schemas!(item()));
    seed(&db);

    let count = |query: Query| db.find("item", query).unwrap().count().unwrap();

    assert_eq!(count(Query::eq("group", "even")), 5);
    assert_eq!(count(Query::ne("group", "even")), 5);
    assert_eq!(count(Query::gt("order", 6)), 3);
    assert_eq!(count(Query::ge("order", 6)), 4);
    assert_eq!(count(Query::lt("order", 2)), 2);
    assert_eq!(count(Query::le("order", 2)), 3);
    assert_eq!(count(Query::in_list("order", vec![1, 3, 42])), 2);
    assert_eq!(count(Query::not_in_list("order", vec![1, 3])), 8);
    assert_eq!(count(Query::parse("_id", "startswith", "i1").unwrap()), 1);
    assert_eq!(count(Query::parse("group", "icontains", "VE").unwrap()), 5);
    assert_eq!(count(Query::parse("group", "endswith", "dd").unwrap()), 5);

    // eq against a list field is membership
    assert_eq!(count(Query::eq("tags", "small")), 3);
}

#[test]
fn boolean_composition() {
    let db = tests::setup(schemas!(item()));
    seed(&db);

    let count = |query: Query| db.find("item", query).unwrap().count().unwrap();

    assert_eq!(count(Query::eq("group", "even") & Query::gt("order", 4)), 2);
    assert_eq!(count(Query::lt("order", 2) | Query::gt("order", 7)), 4);
    assert_eq!(count(!Query::eq("group", "even")), 5);
    assert_eq!(
        count(!(Query::lt("order", 2) | Query::gt("order", 7)) & Query::eq("group", "odd")),
        3
    );
}

#[test]
fn sort_offset_limit_compose() {
    let db = tests::setup(schemas!(item()));
    seed(&db);

    let all = db.find_all("item").unwrap();
    assert_eq!(orders(all.sort(["-order"]).to_vec().unwrap()), [9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);

    let window = all.sort(["order"]).offset(2).limit(5);
    assert_eq!(orders(window.to_vec().unwrap()), [2, 3, 4, 5, 6]);

    // nested windows slice the previous window
    let nested = window.offset(1).limit(2);
    assert_eq!(orders(nested.to_vec().unwrap()), [3, 4]);
    assert_eq!(nested.count().unwrap(), 2);

    // sorting after windowing still sorts first
    let late_sort = all.limit(3).sort(["-order"]);
    assert_eq!(orders(late_sort.to_vec().unwrap()), [9, 8, 7]);
}

#[test]
fn repeated_sort_is_idempotent() {
    let db = tests::setup(schemas!(item()));
    seed(&db);

    let cursor = db.find("item", Query::ge("order", 0)).unwrap();
    let once = cursor.sort(["group", "-order"]);
    let twice = once.sort(["group", "-order"]);
    assert_eq!(once.options(), twice.options());
    assert_eq!(orders(once.to_vec().unwrap()), orders(twice.to_vec().unwrap()));

    // a later sort takes precedence; earlier keys still break ties
    let refined = once.sort(["order"]);
    let fields: Vec<_> = refined
        .options()
        .sort
        .iter()
        .map(|key| key.field.as_str())
        .collect();
    assert_eq!(fields, ["order", "group"]);
}

#[test]
fn indexing() {
    let db = tests::setup(schemas!(item()));
    seed(&db);

    let sorted = db.find_all("item").unwrap().sort(["order"]);
    assert_eq!(sorted.get(0).unwrap().get("order").unwrap(), Value::I64(0));
    assert_eq!(sorted.get(-1).unwrap().get("order").unwrap(), Value::I64(9));
    assert_eq!(sorted.get(-10).unwrap().get("order").unwrap(), Value::I64(0));
    assert!(assert_err!(sorted.get(-11)).is_no_results_found());
    assert!(assert_err!(sorted.get(10)).is_no_results_found());
    assert!(assert_err!(sorted.limit(2).get(2)).is_no_results_found());

    let first = sorted.offset(3).first().unwrap().unwrap();
    assert_eq!(first.get("order").unwrap(), Value::I64(3));

    let keys = sorted.limit(3).keys().unwrap();
    assert_eq!(keys, [Value::from("i0"), Value::from("i1"), Value::from("i2")]);
}

#[test]
fn results_go_through_the_identity_map() {
    let test = DbTest::new();
    let db = test.setup_db(schemas!(item()));
    seed(&db);

    let i3 = db.get("item", "i3").unwrap();
    let found = db.find("item", Query::eq("order", 3)).unwrap().to_vec().unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].ptr_eq(&i3));

    test.log().clear();
    let cursor = db.find("item", Query::eq("order", 3)).unwrap().sort(["order"]).limit(1);
    assert!(test.log().is_empty());
    cursor.to_vec().unwrap();
    assert_eq!(test.log().count_finds(), 1);
}

#[test]
fn find_one_cardinality() {
    let db = tests::setup(schemas!(item()));
    seed(&db);

    let one = db.find_one("item", Query::eq("order", 4)).unwrap();
    assert_eq!(one.primary_key(), Value::from("i4"));

    let err = assert_err!(db.find_one("item", Query::eq("order", 42)));
    assert!(err.is_no_results_found());

    let err = assert_err!(db.find_one("item", Query::eq("group", "odd")));
    assert!(err.is_multiple_results_found());
}

#[test]
fn records_as_query_arguments() {
    let user = Schema::builder("user")
        .field(Field::string("name").primary())
        .build()
        .unwrap();
    let post = Schema::builder("post")
        .field(Field::string("_id"))
        .field(Field::foreign("author", "user"))
        .build()
        .unwrap();
    let comment = Schema::builder("comment")
        .field(Field::string("_id"))
        .field(Field::abstract_foreign("subject"))
        .build()
        .unwrap();
    let db = tests::setup(schemas!(user, post, comment));

    let ann = db.create("user").unwrap();
    ann.set("name", "ann").unwrap();
    ann.save(&db).unwrap();

    for id in ["p1", "p2"] {
        let post = db.create("post").unwrap();
        post.set("_id", id).unwrap();
        post.set("author", &ann).unwrap();
        post.save(&db).unwrap();
    }

    assert_eq!(db.find("post", Query::eq("author", &ann)).unwrap().count().unwrap(), 2);
    assert_eq!(db.find("post", Query::eq("author", "ann")).unwrap().count().unwrap(), 2);

    // a post keyed "ann" must not match a reference to the user "ann"
    let twin = db.create("post").unwrap();
    twin.set("_id", "ann").unwrap();
    twin.save(&db).unwrap();

    let p1 = db.get("post", "p1").unwrap();
    for (id, subject) in [("c1", &ann), ("c2", &ann), ("c3", &p1), ("c4", &twin)] {
        let comment = db.create("comment").unwrap();
        comment.set("_id", id).unwrap();
        comment.set("subject", subject).unwrap();
        comment.save(&db).unwrap();
    }

    let about = |record: &odm::Record| {
        db.find("comment", Query::eq("subject", record))
            .unwrap()
            .keys()
            .unwrap()
    };
    assert_eq!(about(&ann), [Value::from("c1"), Value::from("c2")]);
    assert_eq!(about(&p1), [Value::from("c3")]);
    assert_eq!(about(&twin), [Value::from("c4")]);
    assert_eq!(
        db.find("comment", Query::ne("subject", &ann)).unwrap().count().unwrap(),
        2
    );
    assert_eq!(db.find("post", Query::eq("_id", &p1)).unwrap().count().unwrap(), 1);
}

#[test]
fn unknown_operator() {
    assert!(assert_err!(Query::parse("order", "between", 1)).is_unsupported());
}
