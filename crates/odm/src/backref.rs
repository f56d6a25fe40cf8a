//! The backreference graph.
//!
//! When a reference field naming a backref is saved, the referenced record
//! gets the referencing record's primary key filed under
//! `backref → referencing schema → referencing field`. The map is persisted
//! with the referenced record under the `__backrefs` document entry.

use crate::{Db, Record};

use indexmap::IndexMap;
use odm_core::{
    schema::{Field, FieldTy},
    stmt::{Query, Value, ValueRef, BACKREFS_KEY},
    Error, Result,
};

type FieldMap = IndexMap<String, Vec<Value>>;
type SchemaMap = IndexMap<String, FieldMap>;

/// Reverse links held by a record: `backref → schema → field → [keys]`.
///
/// Keys are the in-memory primary keys of the referencing records. Empty
/// levels are pruned, so an unreferenced record has an empty map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Backrefs {
    map: IndexMap<String, SchemaMap>,
}

impl Backrefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Files `key` under `backref → schema → field`. Adding a key twice has no
    /// effect.
    pub fn add(&mut self, backref: &str, schema: &str, field: &str, key: Value) {
        let keys = self
            .map
            .entry(backref.to_string())
            .or_default()
            .entry(schema.to_string())
            .or_default()
            .entry(field.to_string())
            .or_default();

        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    /// Removes `key` from `backref → schema → field`, pruning empty levels.
    /// Returns `true` if the key was present.
    pub fn remove(&mut self, backref: &str, schema: &str, field: &str, key: &Value) -> bool {
        let Some(schemas) = self.map.get_mut(backref) else {
            return false;
        };
        let Some(fields) = schemas.get_mut(schema) else {
            return false;
        };
        let Some(keys) = fields.get_mut(field) else {
            return false;
        };

        let before = keys.len();
        keys.retain(|k| k != key);
        let removed = keys.len() != before;

        if keys.is_empty() {
            fields.shift_remove(field);
        }
        if fields.is_empty() {
            schemas.shift_remove(schema);
        }
        if schemas.is_empty() {
            self.map.shift_remove(backref);
        }

        removed
    }

    /// Keys filed under `backref → schema → field`.
    pub fn keys(&self, backref: &str, schema: &str, field: &str) -> &[Value] {
        self.map
            .get(backref)
            .and_then(|schemas| schemas.get(schema))
            .and_then(|fields| fields.get(field))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Keys filed under `backref → schema`, across all fields, without
    /// duplicates.
    pub fn keys_for_schema(&self, backref: &str, schema: &str) -> Vec<Value> {
        let mut out: Vec<Value> = vec![];
        if let Some(fields) = self.map.get(backref).and_then(|schemas| schemas.get(schema)) {
            for key in fields.values().flatten() {
                if !out.contains(key) {
                    out.push(key.clone());
                }
            }
        }
        out
    }

    pub fn backref_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.map.keys().map(String::as_str)
    }

    /// Every `(backref, schema, field, key)` entry.
    pub fn entries(&self) -> Vec<(String, String, String, Value)> {
        let mut out = vec![];
        for (backref, schemas) in &self.map {
            for (schema, fields) in schemas {
                for (field, keys) in fields {
                    for key in keys {
                        out.push((backref.clone(), schema.clone(), field.clone(), key.clone()));
                    }
                }
            }
        }
        out
    }

    /// Replaces `old` with `new` wherever `schema` entries hold it.
    pub fn replace_key(&mut self, schema: &str, old: &Value, new: &Value) {
        for schemas in self.map.values_mut() {
            if let Some(fields) = schemas.get_mut(schema) {
                for keys in fields.values_mut() {
                    for key in keys.iter_mut() {
                        if key == old {
                            *key = new.clone();
                        }
                    }
                }
            }
        }
    }

    pub fn to_value(&self) -> Value {
        Value::Map(
            self.map
                .iter()
                .map(|(backref, schemas)| {
                    let schemas = schemas
                        .iter()
                        .map(|(schema, fields)| {
                            let fields = fields
                                .iter()
                                .map(|(field, keys)| (field.clone(), Value::List(keys.clone())))
                                .collect();
                            (schema.clone(), Value::Map(fields))
                        })
                        .collect();
                    (backref.clone(), Value::Map(schemas))
                })
                .collect(),
        )
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let mut backrefs = Self::new();
        if value.is_null() {
            return Ok(backrefs);
        }

        let malformed = || Error::type_conversion(value.clone(), "Backrefs");
        let map = value.as_map().ok_or_else(malformed)?;

        for (backref, schemas) in map {
            for (schema, fields) in schemas.as_map().ok_or_else(malformed)? {
                for (field, keys) in fields.as_map().ok_or_else(malformed)? {
                    for key in keys.as_list().ok_or_else(malformed)? {
                        backrefs.add(backref, schema, field, key.clone());
                    }
                }
            }
        }

        Ok(backrefs)
    }
}

/// A lazily dereferenced list of records.
///
/// Holds only schema names and keys; nothing is fetched until an element is
/// dereferenced with [`ForeignList::get`] or [`ForeignList::to_vec`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForeignList {
    entries: Vec<ValueRef>,
}

impl ForeignList {
    pub(crate) fn new(entries: Vec<ValueRef>) -> Self {
        Self { entries }
    }

    pub(crate) fn for_schema(schema: &str, keys: Vec<Value>) -> Self {
        Self::new(keys.into_iter().map(|key| ValueRef::new(schema, key)).collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Primary keys of the listed records.
    pub fn keys(&self) -> Vec<Value> {
        self.entries.iter().map(|entry| (*entry.key).clone()).collect()
    }

    pub fn entries(&self) -> &[ValueRef] {
        &self.entries
    }

    /// Loads the record at `index`. A dangling reference yields `None`.
    pub fn get(&self, db: &Db, index: usize) -> Result<Option<Record>> {
        let Some(entry) = self.entries.get(index) else {
            return Err(Error::no_results_found(format!(
                "index {index} out of range for list of {}",
                self.entries.len()
            )));
        };
        db.load(&entry.schema, (*entry.key).clone())
    }

    /// Loads every listed record, skipping dangling references.
    pub fn to_vec(&self, db: &Db) -> Result<Vec<Record>> {
        let mut out = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if let Some(record) = db.load(&entry.schema, (*entry.key).clone())? {
                out.push(record);
            }
        }
        Ok(out)
    }
}

/// Which link to maintain on the referenced record.
pub(crate) struct Link<'a> {
    pub(crate) backref: &'a str,
    pub(crate) schema: &'a str,
    pub(crate) field: &'a str,
}

/// Files `key` on the record `target` under `link`, then persists the
/// target's backreference map. A target missing from storage is an error.
pub(crate) fn link(db: &Db, target: &ValueRef, link: &Link<'_>, key: Value) -> Result<()> {
    let found = update_target(db, target, |backrefs| {
        backrefs.add(link.backref, link.schema, link.field, key);
        true
    })?;
    if !found {
        return Err(missing(target));
    }
    Ok(())
}

/// Removes `key` from the record `target` under `link`, then persists the
/// target's backreference map. A missing target has nothing to remove.
pub(crate) fn unlink(db: &Db, target: &ValueRef, link: &Link<'_>, key: &Value) -> Result<()> {
    let found = update_target(db, target, |backrefs| {
        backrefs.remove(link.backref, link.schema, link.field, key)
    })?;
    if !found {
        tracing::debug!(
            schema = %target.schema,
            key = %target.key,
            "referenced record not found; nothing to unlink"
        );
    }
    Ok(())
}

pub(crate) fn missing(target: &ValueRef) -> Error {
    Error::no_results_found(format!(
        "referenced record schema={} key={}",
        target.schema, target.key
    ))
}

/// Applies `f` to the backreference map of `target` and persists it if `f`
/// reports a change. Returns `false` if the target does not exist.
fn update_target(
    db: &Db,
    target: &ValueRef,
    f: impl FnOnce(&mut Backrefs) -> bool,
) -> Result<bool> {
    let Some(record) = db.load(&target.schema, (*target.key).clone())? else {
        return Ok(false);
    };

    let (schema, stored_key, backrefs) = {
        let mut state = record.state();
        if state.removing || state.detached {
            return Ok(true);
        }
        if !f(&mut state.backrefs) {
            return Ok(true);
        }
        let Some(stored_key) = state.stored_key.clone() else {
            return Ok(true);
        };
        (state.schema.clone(), stored_key, state.backrefs.to_value())
    };

    let storage = db.storage_for(&schema)?;
    let filter = Query::eq(schema.primary_name(), stored_key);
    let changes = [(BACKREFS_KEY.to_string(), backrefs)].into_iter().collect();
    db.exec("update", &schema, || storage.update(&schema, &filter, changes))?;
    Ok(true)
}

/// References held by `value`, a value of the reference field `field` (or of
/// a list of references).
pub(crate) fn references(field: &Field, value: &Value) -> Vec<ValueRef> {
    match (field.list_item(), value) {
        (Some(item), Value::List(items)) => items
            .iter()
            .filter_map(|element| reference(item, element))
            .collect(),
        (Some(_), _) => vec![],
        (None, value) => reference(field, value).into_iter().collect(),
    }
}

fn reference(field: &Field, value: &Value) -> Option<ValueRef> {
    match (&field.ty, value) {
        (_, Value::Null) => None,
        (FieldTy::Foreign(foreign), key) => Some(ValueRef::new(foreign.target.clone(), key.clone())),
        (FieldTy::AbstractForeign(_), Value::Ref(reference)) => Some(reference.clone()),
        _ => None,
    }
}

/// `value` with every reference to `target` pointed at `key` instead, or
/// dropped when `key` is `None`. Dropped list elements are removed; a dropped
/// single reference becomes null.
pub(crate) fn rewrite(field: &Field, value: &Value, target: &ValueRef, key: Option<&Value>) -> Value {
    let replace = |item: &Field, element: &Value| -> Option<Value> {
        if reference(item, element).as_ref() != Some(target) {
            return Some(element.clone());
        }
        let key = key?.clone();
        Some(match item.ty {
            FieldTy::AbstractForeign(_) => Value::Ref(ValueRef::new(target.schema.clone(), key)),
            _ => key,
        })
    };

    match (field.list_item(), value) {
        (Some(item), Value::List(items)) => Value::List(
            items
                .iter()
                .filter_map(|element| replace(item, element))
                .collect(),
        ),
        (Some(_), value) => value.clone(),
        (None, value) => replace(field, value).unwrap_or(Value::Null),
    }
}
