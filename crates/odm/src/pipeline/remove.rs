use super::save;
use crate::{
    backref::{self, Link},
    Backrefs, Db, Record,
};

use odm_core::{
    stmt::{Query, Value, ValueRef},
    Error, Result,
};

/// Removes a record from storage.
///
/// Records referencing it have those references nulled (or dropped from
/// reference lists) and are saved; records it references forget it in their
/// backreference maps. The record is detached afterwards.
pub(crate) fn remove_one(db: &Db, record: &Record) -> Result<()> {
    let (schema, stored_key, pk, backrefs) = {
        let mut state = record.state();
        state.ensure_attached()?;
        let stored_key = match (&state.stored_key, state.loaded) {
            (Some(stored_key), true) => stored_key.clone(),
            _ => return Err(Error::record_not_loaded(state.schema.name())),
        };
        state.removing = true;
        let pk = state.primary_key();
        (state.schema.clone(), stored_key, pk, state.backrefs.clone())
    };

    let result = unwind(db, record, &stored_key, &pk, &backrefs);

    let storage = db.storage_for(&schema)?;
    let filter = Query::eq(schema.primary_name(), stored_key.clone());
    let removed = db.exec("remove", &schema, || storage.remove(&schema, &filter));

    {
        let mut state = record.state();
        state.removing = false;
        if removed.is_ok() {
            state.detached = true;
            state.loaded = false;
        }
    }
    removed?;
    db.cache().evict(schema.name(), &stored_key);

    tracing::debug!(schema = %schema.name(), key = %pk, "removed record");
    result
}

/// Drops every reference to and from the record. Keeps going after a
/// failure and returns the first one.
fn unwind(
    db: &Db,
    record: &Record,
    stored_key: &Value,
    pk: &Value,
    backrefs: &Backrefs,
) -> Result<()> {
    let schema = record.schema();
    let storage = db.storage_for(&schema)?;
    let this = ValueRef::new(schema.name(), pk.clone());

    let mut first_err = None;
    let mut note = |result: Result<()>| {
        if let Err(err) = result {
            tracing::warn!(schema = %schema.name(), error = %err, "reference cleanup failed");
            first_err.get_or_insert(err);
        }
    };

    for (_, ref_schema, ref_field, ref_key) in backrefs.entries() {
        note(clear_reference(db, record, &ref_schema, &ref_field, ref_key, &this));
    }

    // the stored snapshot names the links that were actually persisted
    let snapshot = db.cache().data(schema.name(), stored_key).unwrap_or_default();
    for field in schema.foreign_fields() {
        let Some(backref) = field.backref_name() else {
            continue;
        };
        let value = match snapshot.get(&field.name) {
            Some(stored) => field.from_storage(stored, storage.translator(), db.registry())?,
            None => record.state().value(field),
        };

        let link = Link {
            backref,
            schema: schema.name(),
            field: &field.name,
        };
        for target in backref::references(field, &value) {
            note(backref::unlink(db, &target, &link, pk));
        }
    }

    first_err.map_or(Ok(()), Err)
}

/// Drops the references held in `field` of the record `key` of `schema` to
/// `target`, then saves that record.
fn clear_reference(
    db: &Db,
    removed: &Record,
    schema: &str,
    field: &str,
    key: Value,
    target: &ValueRef,
) -> Result<()> {
    let Some(referencing) = db.load(schema, key)? else {
        return Ok(());
    };
    if referencing.ptr_eq(removed) {
        return Ok(());
    }

    {
        let mut state = referencing.state();
        let schema = state.schema.clone();
        let field = schema.expect_field(field)?;
        let value = backref::rewrite(field, &state.value(field), target, None);
        state.set_unchecked(&field.name, value);
    }

    save(db, &referencing)
}
