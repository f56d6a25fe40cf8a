mod capability;
pub use capability::Capability;

use crate::{
    schema::Schema,
    stmt::{Document, FindOptions, Query, Value},
    Error, Result, Translator,
};

use std::fmt::Debug;

/// A storage backend.
///
/// Every call names the schema it operates on; backends key their data by
/// [`Schema::collection`]. Keys and documents are always in the storage form
/// produced by the backend's [`Translator`].
pub trait Storage: Debug + Send + Sync + 'static {
    /// Describes what the backend supports beyond the required contract.
    fn capability(&self) -> &Capability;

    /// Translator used to convert field values to and from storage form.
    fn translator(&self) -> &dyn Translator;

    /// Hint that `field` is queried often. Backends may ignore it.
    fn ensure_index(&self, _schema: &Schema, _field: &str) -> Result<()> {
        Ok(())
    }

    /// Inserts a new document. Fails with [`Error::key_exists`] if a document
    /// with the same key is already stored.
    fn insert(&self, schema: &Schema, key: &Value, document: Document) -> Result<()>;

    /// Merges `changes` into every document matching `filter` and returns
    /// the number of documents updated. Changing the primary field re-keys
    /// the document.
    fn update(&self, schema: &Schema, filter: &Query, changes: Document) -> Result<u64>;

    fn get(&self, schema: &Schema, key: &Value) -> Result<Option<Document>>;

    /// Removes every document matching `filter` and returns how many were
    /// removed.
    fn remove(&self, schema: &Schema, filter: &Query) -> Result<u64>;

    /// Returns matching documents, sorted and windowed by `options`. `None`
    /// matches every document.
    fn find(
        &self,
        schema: &Schema,
        filter: Option<&Query>,
        options: &FindOptions,
    ) -> Result<Vec<Document>>;

    fn count(&self, schema: &Schema, filter: Option<&Query>, options: &FindOptions) -> Result<usize> {
        Ok(self.find(schema, filter, options)?.len())
    }

    /// Returns the only document matching `filter`.
    fn find_one(&self, schema: &Schema, filter: &Query) -> Result<Document> {
        let mut documents = self.find(schema, Some(filter), &FindOptions::default())?;
        match documents.len() {
            0 => Err(Error::no_results_found(format!(
                "schema={} query={filter}",
                schema.name()
            ))),
            1 => Ok(documents.remove(0)),
            n => Err(Error::multiple_results_found(n)),
        }
    }
}
