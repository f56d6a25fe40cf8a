use indexmap::IndexMap;
use odm_core::{
    driver::{Capability, Storage},
    schema::Schema,
    stmt::{Document, FindOptions, Query, Value, ValueKey},
    translate::DefaultTranslator,
    Error, Result, Translator,
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

type Collection = IndexMap<ValueKey, Document>;

/// On-disk form: JSON object keys must be strings, so each collection is a
/// list of `[key, document]` pairs.
type FileImage = IndexMap<String, Vec<(Value, Document)>>;

/// A storage backend holding documents in memory, optionally mirrored to a
/// JSON file after every write.
#[derive(Debug)]
pub struct MemoryStorage {
    collections: Mutex<IndexMap<String, Collection>>,
    path: Option<PathBuf>,
    translator: Box<dyn Translator>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(IndexMap::new()),
            path: None,
            translator: Box::new(DefaultTranslator),
        }
    }

    /// Opens a file-backed store, reading the file if it exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let collections = if path.exists() {
            let bytes = std::fs::read(&path)?;
            let image: FileImage = serde_json::from_slice(&bytes).map_err(anyhow::Error::from)?;
            image
                .into_iter()
                .map(|(name, documents)| {
                    let collection = documents
                        .into_iter()
                        .map(|(key, document)| (ValueKey::new(key), document))
                        .collect();
                    (name, collection)
                })
                .collect()
        } else {
            IndexMap::new()
        };

        tracing::debug!(path = %path.display(), "opened file store");

        Ok(Self {
            collections: Mutex::new(collections),
            path: Some(path),
            translator: Box::new(DefaultTranslator),
        })
    }

    /// Replaces the translator used to convert values to storage form.
    pub fn with_translator(mut self, translator: impl Translator) -> Self {
        self.translator = Box::new(translator);
        self
    }

    /// Every stored document of `collection`, in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .get(collection)
            .map(|collection| collection.values().cloned().collect())
            .unwrap_or_default()
    }

    fn flush(&self, collections: &IndexMap<String, Collection>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let image: FileImage = collections
            .iter()
            .map(|(name, collection)| {
                let documents = collection
                    .iter()
                    .map(|(key, document)| (key.value().clone(), document.clone()))
                    .collect();
                (name.clone(), documents)
            })
            .collect();

        let bytes = serde_json::to_vec(&image).map_err(anyhow::Error::from)?;
        std::fs::write(path, bytes)?;
        tracing::trace!(path = %path.display(), "flushed file store");
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Keys of the documents in `collection` matching `filter`.
fn matching(schema: &Schema, collection: &Collection, filter: &Query) -> Result<Vec<ValueKey>> {
    // primary key equality is a direct lookup
    if let Some(predicate) = filter.as_predicate() {
        if predicate.op.is_eq()
            && predicate.attribute == schema.primary_name()
            && !predicate.argument.is_list()
        {
            let key = ValueKey::from(&predicate.argument);
            return Ok(collection.contains_key(&key).then_some(key).into_iter().collect());
        }
    }

    let mut keys = vec![];
    for (key, document) in collection {
        if filter.matches(document)? {
            keys.push(key.clone());
        }
    }
    Ok(keys)
}

impl Storage for MemoryStorage {
    fn capability(&self) -> &Capability {
        &Capability::MEMORY
    }

    fn translator(&self) -> &dyn Translator {
        &*self.translator
    }

    fn ensure_index(&self, schema: &Schema, field: &str) -> Result<()> {
        tracing::trace!(schema = %schema.name(), field, "memory store keeps no indexes");
        Ok(())
    }

    fn insert(&self, schema: &Schema, key: &Value, document: Document) -> Result<()> {
        let mut collections = self.collections.lock();
        let collection = collections
            .entry(schema.collection().to_string())
            .or_default();

        let key_entry = ValueKey::from(key);
        if collection.contains_key(&key_entry) {
            return Err(Error::key_exists(schema.name(), key));
        }
        collection.insert(key_entry, document);

        self.flush(&collections)
    }

    fn update(&self, schema: &Schema, filter: &Query, changes: Document) -> Result<u64> {
        let mut collections = self.collections.lock();
        let Some(collection) = collections.get_mut(schema.collection()) else {
            return Ok(0);
        };

        let keys = matching(schema, collection, filter)?;
        let rekey = changes.get(schema.primary_name()).map(ValueKey::from);

        // a rekey must leave exactly one document under the new key; check
        // before touching anything
        if let Some(new_key) = &rekey {
            let moving = keys.iter().any(|key| key != new_key);
            if moving && (collection.contains_key(new_key) || keys.len() > 1) {
                return Err(Error::key_exists(schema.name(), new_key.value()));
            }
        }

        for key in &keys {
            match &rekey {
                Some(new_key) if new_key != key => {
                    let Some(mut document) = collection.shift_remove(key) else {
                        continue;
                    };
                    document.extend(changes.clone());
                    collection.insert(new_key.clone(), document);
                }
                _ => {
                    if let Some(document) = collection.get_mut(key) {
                        document.extend(changes.clone());
                    }
                }
            }
        }

        if !keys.is_empty() {
            self.flush(&collections)?;
        }
        Ok(keys.len() as u64)
    }

    fn get(&self, schema: &Schema, key: &Value) -> Result<Option<Document>> {
        Ok(self
            .collections
            .lock()
            .get(schema.collection())
            .and_then(|collection| collection.get(&ValueKey::from(key)))
            .cloned())
    }

    fn remove(&self, schema: &Schema, filter: &Query) -> Result<u64> {
        let mut collections = self.collections.lock();
        let Some(collection) = collections.get_mut(schema.collection()) else {
            return Ok(0);
        };

        let keys = matching(schema, collection, filter)?;
        for key in &keys {
            collection.shift_remove(key);
        }

        if !keys.is_empty() {
            self.flush(&collections)?;
        }
        Ok(keys.len() as u64)
    }

    fn find(
        &self,
        schema: &Schema,
        filter: Option<&Query>,
        options: &FindOptions,
    ) -> Result<Vec<Document>> {
        let collections = self.collections.lock();
        let Some(collection) = collections.get(schema.collection()) else {
            return Ok(vec![]);
        };

        let documents = match filter {
            Some(filter) => matching(schema, collection, filter)?
                .iter()
                .filter_map(|key| collection.get(key).cloned())
                .collect(),
            None => collection.values().cloned().collect(),
        };

        Ok(options.apply(documents))
    }
}
