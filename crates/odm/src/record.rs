mod input;
pub use input::Input;

use crate::{backref::ForeignList, Backrefs, Db};

use indexmap::IndexMap;
use odm_core::{
    schema::{Field, FieldTy, Registry, Schema},
    stmt::{Document, Value, ValueRef, BACKREFS_KEY, VERSION_KEY},
    Error, Result, Translator, ValidationKind,
};
use parking_lot::{Mutex, MutexGuard};
use std::{fmt, sync::Arc};

/// A handle to one record.
///
/// Handles are cheap to clone and all clones share the same state. The
/// identity map guarantees at most one live record per schema and key, so two
/// handles loaded for the same key satisfy [`Record::ptr_eq`].
#[derive(Clone)]
pub struct Record {
    state: Arc<Mutex<RecordState>>,
}

pub(crate) struct RecordState {
    pub(crate) schema: Arc<Schema>,

    /// Field values in memory form. Fields never read or assigned are absent
    /// and get their default on first access.
    pub(crate) values: IndexMap<String, Value>,

    pub(crate) backrefs: Backrefs,

    /// True once the record has been saved or hydrated from storage.
    pub(crate) loaded: bool,

    /// True once the record has been removed.
    pub(crate) detached: bool,

    /// True while the record's removal is unwinding its references.
    pub(crate) removing: bool,

    /// Storage form of the primary key at the last save or load.
    pub(crate) stored_key: Option<Value>,
}

impl RecordState {
    pub(crate) fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            values: IndexMap::new(),
            backrefs: Backrefs::new(),
            loaded: false,
            detached: false,
            removing: false,
            stored_key: None,
        }
    }

    pub(crate) fn ensure_attached(&self) -> Result<()> {
        if self.detached {
            return Err(Error::detached_record(self.schema.name()));
        }
        Ok(())
    }

    /// Value of `field`, applying its default on first access.
    pub(crate) fn value(&mut self, field: &Field) -> Value {
        if let Some(value) = self.values.get(&field.name) {
            return value.clone();
        }
        let value = field.default_value();
        self.values.insert(field.name.clone(), value.clone());
        value
    }

    pub(crate) fn primary_key(&mut self) -> Value {
        let schema = self.schema.clone();
        self.value(schema.primary_field())
    }

    /// Assigns a value without the editable check. Used by the pipeline's own
    /// writes.
    pub(crate) fn set_unchecked(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }

    /// Storage form of every field, plus the backreference map and version.
    pub(crate) fn to_document(
        &mut self,
        translator: &dyn Translator,
        registry: &Registry,
    ) -> Result<Document> {
        let schema = self.schema.clone();
        let mut document = Document::new();

        for field in schema.fields() {
            let value = self.value(field);
            let stored = field
                .to_storage(&value, translator, registry)
                .map_err(|err| err.context(odm_core::err!("field `{}`", field.name)))?;
            document.insert(field.name.clone(), stored);
        }

        document.insert(BACKREFS_KEY.to_string(), self.backrefs.to_value());
        document.insert(VERSION_KEY.to_string(), Value::I64(schema.version().into()));
        Ok(document)
    }
}

impl Record {
    pub(crate) fn new(schema: Arc<Schema>) -> Self {
        Self::from_state(RecordState::new(schema))
    }

    pub(crate) fn from_state(state: RecordState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, RecordState> {
        self.state.lock()
    }

    pub fn schema(&self) -> Arc<Schema> {
        self.state().schema.clone()
    }

    pub fn schema_name(&self) -> String {
        self.state().schema.name().to_string()
    }

    /// Reads a field.
    pub fn get(&self, field: &str) -> Result<Value> {
        let mut state = self.state();
        state.ensure_attached()?;
        let schema = state.schema.clone();
        let field = schema.expect_field(field)?;
        Ok(state.value(field))
    }

    /// Assigns a field. Fails on non-editable fields, on removed records, and
    /// when an unsaved record is assigned to a reference field.
    pub fn set(&self, field: &str, value: impl Into<Input>) -> Result<()> {
        let schema = {
            let state = self.state();
            state.ensure_attached()?;
            state.schema.clone()
        };
        let field = schema.expect_field(field)?;

        if !field.editable {
            return Err(Error::validation(
                ValidationKind::NotEditable,
                &field.name,
                Value::Null,
                "field is not editable",
            ));
        }

        // Converting a record input locks that record, so this record's lock
        // must not be held here.
        let value = value.into().into_value(field)?;
        self.state().set_unchecked(&field.name, value);
        Ok(())
    }

    /// The primary key in memory form; null if not yet assigned.
    pub fn primary_key(&self) -> Value {
        self.state().primary_key()
    }

    pub fn is_loaded(&self) -> bool {
        self.state().loaded
    }

    pub fn is_detached(&self) -> bool {
        self.state().detached
    }

    /// True if both handles refer to the same record.
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// A copy of the record's backreference map.
    pub fn backrefs(&self) -> Result<Backrefs> {
        let state = self.state();
        state.ensure_attached()?;
        Ok(state.backrefs.clone())
    }

    /// Records referencing this one, as a lazy list.
    ///
    /// `path` is `"schema__backref"` for every field of `schema` filed under
    /// `backref`, or `"schema__backref__field"` for a single field.
    pub fn backref(&self, path: &str) -> Result<ForeignList> {
        let state = self.state();
        state.ensure_attached()?;

        let (schema, keys) = match path.split("__").collect::<Vec<_>>()[..] {
            [schema, backref] => (schema, state.backrefs.keys_for_schema(backref, schema)),
            [schema, backref, field] => {
                (schema, state.backrefs.keys(backref, schema, field).to_vec())
            }
            _ => {
                return Err(Error::unsupported(format!(
                    "backreference path `{path}` must be `schema__backref` or `schema__backref__field`"
                )))
            }
        };

        Ok(ForeignList::for_schema(schema, keys))
    }

    /// Dereferences a reference field. Null and dangling references yield
    /// `None`.
    pub fn resolve(&self, db: &Db, field: &str) -> Result<Option<Record>> {
        let (value, target) = {
            let mut state = self.state();
            state.ensure_attached()?;
            let schema = state.schema.clone();
            let field = schema.expect_field(field)?;
            (state.value(field), reference_target(&schema, field)?)
        };

        match reference(&target, value) {
            Some(entry) => db.load(&entry.schema, *entry.key),
            None => Ok(None),
        }
    }

    /// The records named by a list of references (or a single reference), as
    /// a lazy list. Nothing is fetched until an element is dereferenced.
    pub fn resolve_list(&self, field: &str) -> Result<ForeignList> {
        let (value, target) = {
            let mut state = self.state();
            state.ensure_attached()?;
            let schema = state.schema.clone();
            let field = schema.expect_field(field)?;
            let item = field.list_item().unwrap_or(field);
            (state.value(field), reference_target(&schema, item)?)
        };

        let entries = match value {
            Value::List(items) => items
                .into_iter()
                .filter_map(|item| reference(&target, item))
                .collect(),
            value => reference(&target, value).into_iter().collect(),
        };

        Ok(ForeignList::new(entries))
    }

    /// The document this record would be stored as.
    pub fn to_storage(&self, db: &Db) -> Result<Document> {
        let mut state = self.state();
        state.ensure_attached()?;
        let storage = db.storage_for(&state.schema)?;
        state.to_document(storage.translator(), db.registry())
    }

    /// An unsaved copy of this record without its primary key.
    pub fn clone_record(&self) -> Result<Record> {
        let mut state = self.state();
        state.ensure_attached()?;
        let schema = state.schema.clone();

        let mut copy = RecordState::new(schema.clone());
        for field in schema.fields().filter(|field| !field.primary) {
            let value = state.value(field);
            copy.values.insert(field.name.clone(), value);
        }

        Ok(Record::from_state(copy))
    }

    pub fn save(&self, db: &Db) -> Result<()> {
        db.save(self)
    }

    pub fn remove(&self, db: &Db) -> Result<()> {
        db.remove_one(self)
    }

    pub fn reload(&self, db: &Db) -> Result<()> {
        db.reload(self)
    }
}

/// Schema a reference field points to; `None` for abstract references.
fn reference_target(schema: &Schema, field: &Field) -> Result<Option<String>> {
    match &field.ty {
        FieldTy::Foreign(foreign) => Ok(Some(foreign.target.clone())),
        FieldTy::AbstractForeign(_) => Ok(None),
        _ => Err(odm_core::err!(
            "field `{}` of `{}` does not hold a reference",
            field.name,
            schema.name()
        )),
    }
}

fn reference(target: &Option<String>, value: Value) -> Option<ValueRef> {
    match (target, value) {
        (_, Value::Null) => None,
        (None, Value::Ref(reference)) => Some(reference),
        (Some(schema), key) => Some(ValueRef::new(schema.clone(), key)),
        (None, _) => None,
    }
}

/// A record used as a query argument or key: a reference tagged with its
/// schema. Fixed-schema reference and primary fields compare by the key
/// alone, abstract reference fields by schema and key.
impl From<&Record> for Value {
    fn from(record: &Record) -> Self {
        let mut state = record.state();
        let key = state.primary_key();
        let reference = ValueRef::new(state.schema.name(), key);
        Value::Ref(reference)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // try_lock: formatting a record must not deadlock when its lock is
        // held further up the stack
        match self.state.try_lock() {
            Some(state) => f
                .debug_struct("Record")
                .field("schema", &state.schema.name())
                .field("values", &state.values)
                .field("loaded", &state.loaded)
                .field("detached", &state.detached)
                .finish(),
            None => f.write_str("Record { .. }"),
        }
    }
}
