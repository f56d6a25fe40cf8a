use crate::{migrate, record::RecordState, Backrefs, Db, Record};

use odm_core::{
    schema::Schema,
    stmt::{Document, Value, BACKREFS_KEY, VERSION_KEY},
    Error, Result,
};
use std::sync::Arc;

pub(crate) fn load(db: &Db, schema: &Arc<Schema>, key: &Value) -> Result<Option<Record>> {
    let stored_key = db.storage_key(schema, key)?;
    if let Some(record) = db.cache().object(schema.name(), &stored_key) {
        return Ok(Some(record));
    }

    let storage = db.storage_for(schema)?;
    let Some(document) = db.exec("get", schema, || storage.get(schema, &stored_key))? else {
        return Ok(None);
    };

    hydrate(db, schema, document).map(Some)
}

/// Builds the record stored as `document`. If a record with the same key is
/// already in the identity map, that instance is returned unchanged.
pub(crate) fn hydrate(db: &Db, schema: &Arc<Schema>, document: Document) -> Result<Record> {
    let stored_key = document
        .get(schema.primary_name())
        .cloned()
        .unwrap_or_default();

    if let Some(record) = db.cache().object(schema.name(), &stored_key) {
        return Ok(record);
    }

    let mut state = RecordState::new(schema.clone());
    read_into(db, &mut state, &document)?;
    state.stored_key = Some(stored_key.clone());

    let record = Record::from_state(state);
    db.cache().set_object(schema.name(), &stored_key, record.clone());
    db.cache().set_data(schema.name(), &stored_key, document);
    Ok(record)
}

/// Replaces a record's fields with the stored ones. Unsaved assignments are
/// discarded.
pub(crate) fn reload(db: &Db, record: &Record) -> Result<()> {
    let (schema, stored_key) = {
        let state = record.state();
        state.ensure_attached()?;
        let stored_key = state
            .stored_key
            .clone()
            .ok_or_else(|| Error::record_not_loaded(state.schema.name()))?;
        (state.schema.clone(), stored_key)
    };

    let storage = db.storage_for(&schema)?;
    let Some(document) = db.exec("get", &schema, || storage.get(&schema, &stored_key))? else {
        return Err(Error::no_results_found(format!(
            "schema={} key={stored_key}",
            schema.name()
        )));
    };

    read_into(db, &mut record.state(), &document)?;
    db.cache().set_data(schema.name(), &stored_key, document);
    Ok(())
}

fn read_into(db: &Db, state: &mut RecordState, document: &Document) -> Result<()> {
    let schema = state.schema.clone();
    let storage = db.storage_for(&schema)?;
    let translator = storage.translator();

    let version = stored_version(&schema, document)?;
    let data = if version == schema.version() {
        migrate::read_fields(&schema, document, translator, db.registry())?
    } else {
        tracing::info!(
            schema = %schema.name(),
            from = version,
            to = schema.version(),
            "migrating record"
        );
        migrate::migrate(&schema, document, version, translator, db.registry())?
    };

    state.values = data.into_inner();
    state.backrefs = Backrefs::from_value(document.get(BACKREFS_KEY).unwrap_or(&Value::Null))?;
    state.loaded = true;
    Ok(())
}

/// Version a document was written at. Documents without one are taken to be
/// at the reading schema's version.
fn stored_version(schema: &Schema, document: &Document) -> Result<u32> {
    let version = match document.get(VERSION_KEY) {
        None | Some(Value::Null) => return Ok(schema.version()),
        Some(Value::I64(version)) => *version,
        Some(Value::String(version)) => version
            .parse()
            .map_err(|_| Error::type_conversion(Value::from(version), "u32"))?,
        Some(other) => return Err(Error::type_conversion(other.clone(), "u32")),
    };

    u32::try_from(version).map_err(|_| Error::type_conversion(Value::I64(version), "u32"))
}
