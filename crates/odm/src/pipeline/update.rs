use super::save;
use crate::{cursor, Cursor, Db, Input, Record};

use odm_core::{
    schema::Schema,
    stmt::{Document, Query, Value},
    Error, Result, ValidationKind,
};
use std::sync::Arc;

/// Applies `changes` to every record matching `query`.
///
/// Changes touching only plain fields go to storage as one bulk update, and
/// cached records that matched beforehand are patched in place. Changes to
/// the primary key or a reference field go through a full save of each
/// record so the backreference graph stays consistent.
pub(crate) fn update(
    db: &Db,
    schema: &Arc<Schema>,
    query: &Query,
    changes: Vec<(String, Input)>,
) -> Result<usize> {
    if is_direct(schema, &changes)? {
        let filter = cursor::translate_query(db, schema, query)?;
        return direct(db, schema, &filter, changes);
    }

    let records = Cursor::new(db.clone(), schema.clone(), Some(query.clone()))?.to_vec()?;
    let count = records.len();
    update_records(db, schema, records, changes)?;
    Ok(count)
}

pub(crate) fn update_records(
    db: &Db,
    schema: &Arc<Schema>,
    records: Vec<Record>,
    changes: Vec<(String, Input)>,
) -> Result<()> {
    let direct_path = is_direct(schema, &changes)?;

    for record in records {
        let stored_key = record.state().stored_key.clone();
        match stored_key {
            Some(stored_key) if direct_path => {
                let filter = Query::eq(schema.primary_name(), stored_key);
                direct(db, schema, &filter, changes.clone())?;
            }
            _ => {
                for (field, input) in changes.iter().cloned() {
                    record.set(&field, input)?;
                }
                save(db, &record)?;
            }
        }
    }

    Ok(())
}

fn is_direct(schema: &Schema, changes: &[(String, Input)]) -> Result<bool> {
    for (name, _) in changes {
        let field = schema.expect_field(name)?;
        if field.primary || field.is_foreign() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// `filter` is in storage form.
fn direct(
    db: &Db,
    schema: &Arc<Schema>,
    filter: &Query,
    changes: Vec<(String, Input)>,
) -> Result<usize> {
    let storage = db.storage_for(schema)?;
    let translator = storage.translator();

    let mut values: Vec<(String, Value)> = vec![];
    let mut document = Document::new();
    for (name, input) in changes {
        let field = schema.expect_field(&name)?;
        if !field.editable {
            return Err(Error::validation(
                ValidationKind::NotEditable,
                &field.name,
                Value::Null,
                "field is not editable",
            ));
        }
        let value = input.into_value(field)?;
        field.validate_value(&value)?;
        document.insert(
            field.name.clone(),
            field.to_storage(&value, translator, db.registry())?,
        );
        values.push((field.name.clone(), value));
    }

    let mut matching = vec![];
    for record in db.cache().objects(schema.name()) {
        let Some(stored_key) = record.state().stored_key.clone() else {
            continue;
        };
        let Some(snapshot) = db.cache().data(schema.name(), &stored_key) else {
            continue;
        };
        if filter.matches(&snapshot)? {
            matching.push((record, stored_key));
        }
    }

    let updated = db.exec("update", schema, || storage.update(schema, filter, document.clone()))?;

    for (record, stored_key) in matching {
        {
            let mut state = record.state();
            for (name, value) in &values {
                state.set_unchecked(name, value.clone());
            }
        }
        for (name, stored) in &document {
            db.cache().patch_data(schema.name(), &stored_key, name, stored.clone());
        }
    }

    tracing::debug!(schema = %schema.name(), %filter, updated, "bulk update");
    Ok(updated as usize)
}
