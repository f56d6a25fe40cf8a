use crate::{
    backref::{self, Link},
    keygen, Db, Record,
};

use indexmap::IndexMap;
use odm_core::{
    schema::{Field, Schema},
    stmt::{Document, Query, Value, ValueKey, ValueRef, BACKREFS_KEY, VERSION_KEY},
    Error, Result, ValidationKind,
};
use std::sync::Arc;

/// Validates and writes a record, then brings the backreference graph in
/// line with its reference fields.
///
/// A loaded record writes only the fields that differ from the last stored
/// snapshot. An optimistic record without a key retries insertion with fresh
/// generated keys until one is free.
pub(crate) fn save(db: &Db, record: &Record) -> Result<()> {
    let schema = {
        let state = record.state();
        state.ensure_attached()?;
        state.schema.clone()
    };
    let storage = db.storage_for(&schema)?.clone();
    let translator = storage.translator();
    let registry = db.registry();
    let primary = schema.primary_field();

    let (values, old_key) = {
        let mut state = record.state();
        for field in schema.fields() {
            if let Some(now) = field.before_save_value() {
                state.set_unchecked(&field.name, now);
            }
        }
        let values: IndexMap<String, Value> = schema
            .fields()
            .map(|field| (field.name.clone(), state.value(field)))
            .collect();
        let old_key = state.loaded.then(|| state.stored_key.clone()).flatten();
        (values, old_key)
    };

    let mut pk = values[&primary.name].clone();
    if pk.is_null() && (old_key.is_some() || !schema.is_optimistic()) {
        return Err(Error::validation(
            ValidationKind::Required,
            &primary.name,
            Value::Null,
            "primary key is required",
        ));
    }
    for field in schema.fields() {
        if field.primary && pk.is_null() {
            continue;
        }
        field.validate_value(&values[&field.name])?;
    }

    let snapshot = old_key
        .as_ref()
        .and_then(|key| db.cache().data(schema.name(), key))
        .unwrap_or_default();
    check_referents(db, &schema, &values, &snapshot, &pk)?;

    let mut document = record.state().to_document(translator, registry)?;
    let changed: Vec<&Field> = schema
        .fields()
        .filter(|field| old_key.is_none() || snapshot.get(&field.name) != document.get(&field.name))
        .collect();

    let new_key = match &old_key {
        Some(old_key) => {
            let mut changes: Document = changed
                .iter()
                .map(|field| (field.name.clone(), document[&field.name].clone()))
                .collect();
            for internal in [BACKREFS_KEY, VERSION_KEY] {
                changes.insert(internal.to_string(), document[internal].clone());
            }

            let filter = Query::eq(&primary.name, old_key.clone());
            let updated = db.exec("update", &schema, || storage.update(&schema, &filter, changes))?;
            let new_key = document[&primary.name].clone();
            if updated == 0 {
                tracing::warn!(
                    schema = %schema.name(),
                    key = %old_key,
                    "record missing from storage; inserting it again"
                );
                db.exec("insert", &schema, || storage.insert(&schema, &new_key, document.clone()))?;
            }
            new_key
        }
        None if pk.is_null() => {
            let (key, stored) = insert_optimistic(db, &schema, &mut document)?;
            record.state().set_unchecked(&primary.name, key.clone());
            pk = key;
            stored
        }
        None => {
            let new_key = document[&primary.name].clone();
            db.exec("insert", &schema, || storage.insert(&schema, &new_key, document.clone()))?;
            new_key
        }
    };

    {
        let mut state = record.state();
        state.loaded = true;
        state.stored_key = Some(new_key.clone());
    }

    let key_changed = old_key
        .as_ref()
        .is_some_and(|old_key| ValueKey::from(old_key) != ValueKey::from(&new_key));
    if let Some(old_key) = old_key.as_ref().filter(|_| key_changed) {
        db.cache().evict(schema.name(), old_key);
    }
    db.cache().set_object(schema.name(), &new_key, record.clone());
    db.cache().set_data(schema.name(), &new_key, document);

    tracing::debug!(schema = %schema.name(), key = %pk, "saved record");

    let old_pk = match snapshot.get(&primary.name) {
        Some(stored) => primary.from_storage(stored, translator, registry)?,
        None => pk.clone(),
    };

    let mut first_err = None;
    let mut note = |result: Result<()>| {
        if let Err(err) = result {
            tracing::warn!(schema = %schema.name(), error = %err, "reference update failed");
            first_err.get_or_insert(err);
        }
    };

    for field in schema.foreign_fields() {
        let Some(backref) = field.backref_name() else {
            continue;
        };
        let field_changed = changed.iter().any(|changed| changed.name == field.name);
        if !field_changed && !key_changed {
            continue;
        }

        let old_refs = match snapshot.get(&field.name) {
            Some(stored) => backref::references(field, &field.from_storage(stored, translator, registry)?),
            None => vec![],
        };
        let new_refs = backref::references(field, &values[&field.name]);

        let (unlinked, linked): (Vec<&ValueRef>, Vec<&ValueRef>) = if key_changed {
            (old_refs.iter().collect(), new_refs.iter().collect())
        } else {
            (
                old_refs.iter().filter(|r| !new_refs.contains(r)).collect(),
                new_refs.iter().filter(|r| !old_refs.contains(r)).collect(),
            )
        };

        let link = Link {
            backref,
            schema: schema.name(),
            field: &field.name,
        };
        for target in unlinked {
            note(backref::unlink(db, target, &link, &old_pk));
        }
        for target in linked {
            note(backref::link(db, target, &link, pk.clone()));
        }
    }

    if key_changed {
        let this = ValueRef::new(schema.name(), old_pk.clone());
        let referencing = record.state().backrefs.entries();
        for (_, ref_schema, ref_field, ref_key) in referencing {
            note(repoint(db, &ref_schema, &ref_field, ref_key, &this, &pk));
        }
    }

    first_err.map_or(Ok(()), Err)
}

/// Fails before anything is written if a newly assigned reference on a
/// field with a backref names a record that does not exist. References to
/// the record itself are left to the link step.
fn check_referents(
    db: &Db,
    schema: &Schema,
    values: &IndexMap<String, Value>,
    snapshot: &Document,
    pk: &Value,
) -> Result<()> {
    let storage = db.storage_for(schema)?;
    for field in schema.foreign_fields() {
        if field.backref_name().is_none() {
            continue;
        }
        let old_refs = match snapshot.get(&field.name) {
            Some(stored) => backref::references(
                field,
                &field.from_storage(stored, storage.translator(), db.registry())?,
            ),
            None => vec![],
        };

        for target in backref::references(field, &values[&field.name]) {
            let is_self = target.schema == schema.name() && *target.key == *pk;
            if is_self || old_refs.contains(&target) {
                continue;
            }
            if db.load(&target.schema, (*target.key).clone())?.is_none() {
                return Err(backref::missing(&target));
            }
        }
    }
    Ok(())
}

/// Inserts a document under fresh generated keys until one is free. Returns
/// the key in memory and storage form.
fn insert_optimistic(db: &Db, schema: &Arc<Schema>, document: &mut Document) -> Result<(Value, Value)> {
    let storage = db.storage_for(schema)?;
    let primary = schema.primary_field();

    loop {
        let key = Value::String(keygen::generate(db.key_len()));
        let stored = primary.to_storage(&key, storage.translator(), db.registry())?;
        document.insert(primary.name.clone(), stored.clone());

        match db.exec("insert", schema, || storage.insert(schema, &stored, document.clone())) {
            Ok(()) => return Ok((key, stored)),
            Err(err) if err.is_key_exists() => {
                tracing::warn!(schema = %schema.name(), key = %key, "generated key taken; retrying");
            }
            Err(err) => return Err(err),
        }
    }
}

/// Points the field `field` of the record `key` of `schema` at `new_key`
/// wherever it referenced `target`.
fn repoint(
    db: &Db,
    schema: &str,
    field: &str,
    key: Value,
    target: &ValueRef,
    new_key: &Value,
) -> Result<()> {
    let Some(referencing) = db.load(schema, key)? else {
        return Ok(());
    };

    let (schema, stored_key, stored) = {
        let mut state = referencing.state();
        let schema = state.schema.clone();
        let field = schema.expect_field(field)?;
        let value = backref::rewrite(field, &state.value(field), target, Some(new_key));
        state.set_unchecked(&field.name, value.clone());

        let Some(stored_key) = state.stored_key.clone() else {
            return Ok(());
        };
        let storage = db.storage_for(&schema)?;
        let stored = field.to_storage(&value, storage.translator(), db.registry())?;
        (schema, stored_key, stored)
    };

    let storage = db.storage_for(&schema)?;
    let filter = Query::eq(schema.primary_name(), stored_key.clone());
    let changes = [(field.to_string(), stored.clone())].into_iter().collect();
    db.exec("update", &schema, || storage.update(&schema, &filter, changes))?;
    db.cache().patch_data(schema.name(), &stored_key, field, stored);
    Ok(())
}
