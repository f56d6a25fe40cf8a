mod builder;
pub use builder::Builder;

use crate::{
    cache::Cache,
    cursor::{self, Cursor},
    listen::{Listener, Recorder},
    pipeline, Input, Record,
};

use indexmap::IndexMap;
use odm_core::{
    driver::Storage,
    schema::{FieldTy, Registry},
    stmt::{Query, Value},
    Error, Result, Schema,
};

use std::{fmt, sync::Arc};

/// Shared state between all `Db` clones.
pub(crate) struct Shared {
    pub(crate) registry: Registry,
    pub(crate) storages: IndexMap<String, Arc<dyn Storage>>,
    pub(crate) default_storage: Option<Arc<dyn Storage>>,
    pub(crate) cache: Cache,
    pub(crate) recorder: Recorder,
    pub(crate) key_len: usize,
}

/// A database handle: registered schemas, their storage backends, and the
/// identity map. Clones share all state.
#[derive(Clone)]
pub struct Db {
    shared: Arc<Shared>,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.shared.registry
    }

    pub fn schema(&self, name: &str) -> Result<Arc<Schema>> {
        self.registry().get(name).cloned()
    }

    /// The backend storing `schema`.
    pub fn storage_for(&self, schema: &Schema) -> Result<&Arc<dyn Storage>> {
        schema
            .version_chain()
            .iter()
            .rev()
            .find_map(|version| self.shared.storages.get(version.name()))
            .or(self.shared.default_storage.as_ref())
            .ok_or_else(|| Error::no_storage_backend(schema.name()))
    }

    pub(crate) fn cache(&self) -> &Cache {
        &self.shared.cache
    }

    pub(crate) fn recorder(&self) -> &Recorder {
        &self.shared.recorder
    }

    pub(crate) fn key_len(&self) -> usize {
        self.shared.key_len
    }

    /// Runs one storage call, logging and recording it.
    pub(crate) fn exec<T>(
        &self,
        op: &'static str,
        schema: &Schema,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        tracing::debug!(schema = %schema.name(), op, "storage call");
        self.recorder().time(op, schema.name(), f)
    }

    /// Storage form of `key` as a primary key of `schema`. The key is first
    /// cast to the primary field's type, so `"1"` and `1` name the same
    /// record of an integer-keyed schema.
    pub(crate) fn storage_key(&self, schema: &Schema, key: &Value) -> Result<Value> {
        let storage = self.storage_for(schema)?;
        let primary = schema.primary_field();
        let key = match &primary.ty {
            FieldTy::Primitive(ty) => ty.coerce(key.clone())?,
            _ => key.clone(),
        };
        primary.to_storage(&key, storage.translator(), self.registry())
    }

    /// Starts recording storage calls. Recording stops when the returned
    /// listener (and every listener created before it) is dropped.
    pub fn listen(&self) -> Listener {
        Listener::new(self.clone())
    }

    /// A new, unsaved record of `schema`.
    pub fn create(&self, schema: &str) -> Result<Record> {
        Ok(Record::new(self.schema(schema)?))
    }

    pub fn save(&self, record: &Record) -> Result<()> {
        pipeline::save(self, record)
    }

    /// Loads a record by primary key. Returns the cached instance if the key
    /// is already in the identity map.
    pub fn load(&self, schema: &str, key: impl Into<Value>) -> Result<Option<Record>> {
        let schema = self.schema(schema)?;
        pipeline::load(self, &schema, &key.into())
    }

    /// Like [`Db::load`], but a missing record is an error.
    pub fn get(&self, schema: &str, key: impl Into<Value>) -> Result<Record> {
        let key = key.into();
        self.load(schema, key.clone())?.ok_or_else(|| {
            Error::no_results_found(format!("schema={schema} key={key}"))
        })
    }

    pub fn find(&self, schema: &str, query: Query) -> Result<Cursor> {
        Cursor::new(self.clone(), self.schema(schema)?, Some(query))
    }

    pub fn find_all(&self, schema: &str) -> Result<Cursor> {
        Cursor::new(self.clone(), self.schema(schema)?, None)
    }

    /// The only record matching `query`. Zero or several matches are errors.
    pub fn find_one(&self, schema: &str, query: Query) -> Result<Record> {
        let schema = self.schema(schema)?;
        cursor::find_one(self, &schema, &query)
    }

    /// Removes a record, unwinding every reference to and from it first.
    pub fn remove_one(&self, record: &Record) -> Result<()> {
        pipeline::remove_one(self, record)
    }

    /// Removes every record matching `query`. Returns how many were removed.
    pub fn remove(&self, schema: &str, query: Query) -> Result<usize> {
        let records = self.find(schema, query)?.to_vec()?;
        let count = records.len();
        for record in records {
            pipeline::remove_one(self, &record)?;
        }
        Ok(count)
    }

    /// Applies `changes` to the record with primary key `key`.
    pub fn update_one<K, V>(
        &self,
        schema: &str,
        key: impl Into<Value>,
        changes: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Record>
    where
        K: Into<String>,
        V: Into<Input>,
    {
        let record = self.get(schema, key)?;
        pipeline::update_records(self, &record.schema(), vec![record.clone()], collect(changes))?;
        Ok(record)
    }

    /// Applies `changes` to every record matching `query`. Returns how many
    /// records were updated.
    pub fn update<K, V>(
        &self,
        schema: &str,
        query: Query,
        changes: impl IntoIterator<Item = (K, V)>,
    ) -> Result<usize>
    where
        K: Into<String>,
        V: Into<Input>,
    {
        let schema = self.schema(schema)?;
        pipeline::update(self, &schema, &query, collect(changes))
    }

    /// Re-reads a record's fields from storage in place.
    pub fn reload(&self, record: &Record) -> Result<()> {
        pipeline::reload(self, record)
    }

    /// Empties the identity map and data cache. The next load of any key
    /// reads from storage.
    pub fn clear_caches(&self) {
        tracing::trace!("clearing all caches");
        self.cache().clear();
    }

    pub fn clear_schema_cache(&self, schema: &str) {
        self.cache().clear_schema(schema);
    }

    /// Evicts one record from the caches.
    pub fn clear_cached(&self, schema: &str, key: impl Into<Value>) -> Result<()> {
        let schema = self.schema(schema)?;
        let key = self.storage_key(&schema, &key.into())?;
        self.cache().evict(schema.name(), &key);
        Ok(())
    }
}

fn collect<K, V>(changes: impl IntoIterator<Item = (K, V)>) -> Vec<(String, Input)>
where
    K: Into<String>,
    V: Into<Input>,
{
    changes
        .into_iter()
        .map(|(field, value)| (field.into(), value.into()))
        .collect()
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field(
                "schemas",
                &self.registry().iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
