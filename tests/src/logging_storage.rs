use odm_core::{
    driver::{Capability, Storage},
    schema::Schema,
    stmt::{Document, FindOptions, Query, Value},
    Result, Translator,
};
use odm_driver_memory::MemoryStorage;
use parking_lot::Mutex;
use std::sync::Arc;

/// One call made through a [`LoggingStorage`].
#[derive(Debug, Clone, PartialEq)]
pub enum StorageOp {
    Insert {
        schema: String,
        key: Value,
    },
    Update {
        schema: String,
        filter: Query,
        changes: Document,
    },
    Get {
        schema: String,
        key: Value,
    },
    Remove {
        schema: String,
        filter: Query,
    },
    Find {
        schema: String,
        filter: Option<Query>,
        options: FindOptions,
    },
}

impl StorageOp {
    pub fn schema(&self) -> &str {
        match self {
            Self::Insert { schema, .. }
            | Self::Update { schema, .. }
            | Self::Get { schema, .. }
            | Self::Remove { schema, .. }
            | Self::Find { schema, .. } => schema,
        }
    }
}

/// A memory store that logs every call made through it.
#[derive(Debug)]
pub struct LoggingStorage {
    inner: MemoryStorage,

    /// Shared with the test's [`crate::ExecLog`]
    ops_log: Arc<Mutex<Vec<StorageOp>>>,
}

impl LoggingStorage {
    pub fn new(inner: MemoryStorage) -> Self {
        Self {
            inner,
            ops_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn ops_log_handle(&self) -> Arc<Mutex<Vec<StorageOp>>> {
        self.ops_log.clone()
    }

    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }

    fn log(&self, op: StorageOp) {
        self.ops_log.lock().push(op);
    }
}

impl Storage for LoggingStorage {
    fn capability(&self) -> &Capability {
        self.inner.capability()
    }

    fn translator(&self) -> &dyn Translator {
        self.inner.translator()
    }

    fn ensure_index(&self, schema: &Schema, field: &str) -> Result<()> {
        self.inner.ensure_index(schema, field)
    }

    fn insert(&self, schema: &Schema, key: &Value, document: Document) -> Result<()> {
        self.log(StorageOp::Insert {
            schema: schema.name().to_string(),
            key: key.clone(),
        });
        self.inner.insert(schema, key, document)
    }

    fn update(&self, schema: &Schema, filter: &Query, changes: Document) -> Result<u64> {
        self.log(StorageOp::Update {
            schema: schema.name().to_string(),
            filter: filter.clone(),
            changes: changes.clone(),
        });
        self.inner.update(schema, filter, changes)
    }

    fn get(&self, schema: &Schema, key: &Value) -> Result<Option<Document>> {
        self.log(StorageOp::Get {
            schema: schema.name().to_string(),
            key: key.clone(),
        });
        self.inner.get(schema, key)
    }

    fn remove(&self, schema: &Schema, filter: &Query) -> Result<u64> {
        self.log(StorageOp::Remove {
            schema: schema.name().to_string(),
            filter: filter.clone(),
        });
        self.inner.remove(schema, filter)
    }

    fn find(
        &self,
        schema: &Schema,
        filter: Option<&Query>,
        options: &FindOptions,
    ) -> Result<Vec<Document>> {
        self.log(StorageOp::Find {
            schema: schema.name().to_string(),
            filter: filter.cloned(),
            options: options.clone(),
        });
        self.inner.find(schema, filter, options)
    }
}
