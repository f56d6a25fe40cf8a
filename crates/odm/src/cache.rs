use crate::Record;

use indexmap::IndexMap;
use odm_core::stmt::{Document, Value, ValueKey};
use parking_lot::Mutex;

/// The identity map and the data cache.
///
/// Both are keyed by schema name, then by the storage form of the primary
/// key, so two spellings of one key that translate identically share an
/// entry.
#[derive(Debug, Default)]
pub(crate) struct Cache {
    objects: Mutex<IndexMap<String, IndexMap<ValueKey, Record>>>,
    data: Mutex<IndexMap<String, IndexMap<ValueKey, Document>>>,
}

impl Cache {
    pub(crate) fn object(&self, schema: &str, key: &Value) -> Option<Record> {
        let hit = self
            .objects
            .lock()
            .get(schema)
            .and_then(|objects| objects.get(&ValueKey::from(key)))
            .cloned();

        tracing::trace!(schema, key = %key, hit = hit.is_some(), "object cache lookup");
        hit
    }

    pub(crate) fn set_object(&self, schema: &str, key: &Value, record: Record) {
        self.objects
            .lock()
            .entry(schema.to_string())
            .or_default()
            .insert(ValueKey::from(key), record);
    }

    /// Records cached for `schema`.
    pub(crate) fn objects(&self, schema: &str) -> Vec<Record> {
        self.objects
            .lock()
            .get(schema)
            .map(|objects| objects.values().cloned().collect())
            .unwrap_or_default()
    }

    /// The last snapshot written to or read from storage.
    pub(crate) fn data(&self, schema: &str, key: &Value) -> Option<Document> {
        self.data
            .lock()
            .get(schema)
            .and_then(|data| data.get(&ValueKey::from(key)))
            .cloned()
    }

    pub(crate) fn set_data(&self, schema: &str, key: &Value, document: Document) {
        self.data
            .lock()
            .entry(schema.to_string())
            .or_default()
            .insert(ValueKey::from(key), document);
    }

    /// Patches one field of a cached snapshot, if present.
    pub(crate) fn patch_data(&self, schema: &str, key: &Value, field: &str, value: Value) {
        if let Some(document) = self
            .data
            .lock()
            .get_mut(schema)
            .and_then(|data| data.get_mut(&ValueKey::from(key)))
        {
            document.insert(field.to_string(), value);
        }
    }

    pub(crate) fn evict(&self, schema: &str, key: &Value) {
        let key = ValueKey::from(key);
        if let Some(objects) = self.objects.lock().get_mut(schema) {
            objects.shift_remove(&key);
        }
        if let Some(data) = self.data.lock().get_mut(schema) {
            data.shift_remove(&key);
        }
    }

    pub(crate) fn clear_schema(&self, schema: &str) {
        self.objects.lock().shift_remove(schema);
        self.data.lock().shift_remove(schema);
    }

    pub(crate) fn clear(&self) {
        self.objects.lock().clear();
        self.data.lock().clear();
    }
}
