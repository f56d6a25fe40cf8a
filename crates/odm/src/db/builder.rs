use super::{Db, Shared};
use crate::{cache::Cache, keygen, listen::Recorder};

use indexmap::IndexMap;
use odm_core::{driver::Storage, schema::Registry, Error, Result, Schema};

use std::sync::Arc;

#[derive(Default)]
pub struct Builder {
    /// Schemas in registration order
    schemas: Vec<Arc<Schema>>,

    /// Backends bound to one schema, by schema name
    storages: IndexMap<String, Arc<dyn Storage>>,

    /// Backend for every schema not bound explicitly
    default_storage: Option<Arc<dyn Storage>>,

    key_len: Option<usize>,
}

impl Builder {
    pub fn register(&mut self, schema: impl Into<Arc<Schema>>) -> &mut Self {
        self.schemas.push(schema.into());
        self
    }

    /// Binds `storage` to the schema named `schema`. Versions of a schema
    /// without their own binding use the binding of an older version.
    pub fn storage(&mut self, schema: &str, storage: Arc<dyn Storage>) -> &mut Self {
        self.storages.insert(schema.to_string(), storage);
        self
    }

    pub fn default_storage(&mut self, storage: Arc<dyn Storage>) -> &mut Self {
        self.default_storage = Some(storage);
        self
    }

    /// Length of keys generated for optimistic schemas.
    pub fn optimistic_key_len(&mut self, len: usize) -> &mut Self {
        self.key_len = Some(len);
        self
    }

    pub fn build(&mut self) -> Result<Db> {
        let mut registry = Registry::new();
        for schema in &self.schemas {
            registry.register(schema.clone())?;
        }
        registry.verify()?;

        for name in self.storages.keys() {
            if !registry.contains(name) {
                return Err(Error::invalid_schema(
                    name,
                    "storage bound to a schema that is not registered",
                ));
            }
        }

        let key_len = self.key_len.unwrap_or(keygen::DEFAULT_KEY_LEN);
        if key_len == 0 {
            odm_core::bail!("optimistic key length must be at least 1");
        }

        let db = Db {
            shared: Arc::new(Shared {
                registry,
                storages: self.storages.clone(),
                default_storage: self.default_storage.clone(),
                cache: Cache::default(),
                recorder: Recorder::default(),
                key_len,
            }),
        };

        for schema in db.registry().iter() {
            let Ok(storage) = db.storage_for(schema) else {
                tracing::debug!(schema = %schema.name(), "no storage bound");
                continue;
            };
            for field in schema.fields().filter(|field| field.index) {
                storage.ensure_index(schema, &field.name)?;
            }
        }

        Ok(db)
    }
}
