//! Reading documents written by another version of a schema.

use odm_core::{
    schema::{RecordData, Registry, Schema},
    stmt::Document,
    Error, Result, Translator,
};

/// Reads the fields of `schema` present in `document`.
pub(crate) fn read_fields(
    schema: &Schema,
    document: &Document,
    translator: &dyn Translator,
    registry: &Registry,
) -> Result<RecordData> {
    let mut data = RecordData::new();
    for field in schema.fields() {
        if let Some(stored) = document.get(&field.name) {
            let value = field
                .from_storage(stored, translator, registry)
                .map_err(|err| err.context(odm_core::err!("field `{}`", field.name)))?;
            data.set(field.name.clone(), value);
        }
    }
    Ok(data)
}

/// Reads `document`, stored at `version`, as a record of `target`.
///
/// Older documents run each step's migrate transform in order; newer ones
/// run the unmigrate transforms of the newer versions in reverse order. A
/// step first copies the fields both versions share, then calls the
/// transform.
pub(crate) fn migrate(
    target: &Schema,
    document: &Document,
    version: u32,
    translator: &dyn Translator,
    registry: &Registry,
) -> Result<RecordData> {
    let chain = target.version_chain();

    if let Some(start) = chain.iter().position(|schema| schema.version() == version) {
        let mut data = read_fields(chain[start], document, translator, registry)?;
        for pair in chain[start..].windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let mut next = shared_fields(to, &data);
            if let Some(f) = to.migrate_fn() {
                f(&data, &mut next)
                    .map_err(|err| err.context(migration_context(from, to)))?;
            }
            data = next;
        }
        return Ok(data);
    }

    let Some(newer) = registry.find_version(target, version) else {
        return Err(Error::invalid_schema(
            target.name(),
            format!("no registered version {version} to read the record from"),
        ));
    };

    let chain = newer.version_chain();
    let Some(stop) = chain.iter().position(|schema| schema.version() == target.version()) else {
        return Err(Error::invalid_schema(
            target.name(),
            format!("version {version} does not descend from this schema"),
        ));
    };

    let mut data = read_fields(newer, document, translator, registry)?;
    for pair in chain[stop..].windows(2).rev() {
        let (to, from) = (pair[0], pair[1]);
        let mut next = shared_fields(to, &data);
        if let Some(f) = from.unmigrate_fn() {
            f(&data, &mut next)
                .map_err(|err| err.context(migration_context(from, to)))?;
        }
        data = next;
    }
    Ok(data)
}

fn shared_fields(to: &Schema, data: &RecordData) -> RecordData {
    data.iter()
        .filter(|(name, _)| to.has_field(name))
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn migration_context(from: &Schema, to: &Schema) -> odm_core::Error {
    odm_core::err!(
        "migrating `{}` version {} to `{}` version {}",
        from.name(),
        from.version(),
        to.name(),
        to.version()
    )
}
