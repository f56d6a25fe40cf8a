//! Lazy query results.

use crate::{pipeline, Db, Record};

use odm_core::{
    schema::Schema,
    stmt::{Document, FindOptions, Operator, Query, SortKey, Value},
    Error, Result,
};
use std::{sync::Arc, vec};

/// The records matching a query, fetched on demand.
///
/// Sorting and windowing return a new cursor and never touch storage. Each
/// of [`Cursor::count`], [`Cursor::get`], [`Cursor::iter`] and
/// [`Cursor::to_vec`] runs one storage query.
#[derive(Debug, Clone)]
pub struct Cursor {
    db: Db,
    schema: Arc<Schema>,

    /// Filter in storage form
    filter: Option<Query>,

    options: FindOptions,
}

impl Cursor {
    pub(crate) fn new(db: Db, schema: Arc<Schema>, query: Option<Query>) -> Result<Self> {
        let filter = query
            .map(|query| translate_query(&db, &schema, &query))
            .transpose()?;

        Ok(Self {
            db,
            schema,
            filter,
            options: FindOptions::default(),
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// Sorts by `keys` (`"field"` ascending, `"-field"` descending). Keys of
    /// an earlier sort that are not mentioned again still break ties.
    pub fn sort<I, K>(&self, keys: I) -> Cursor
    where
        I: IntoIterator<Item = K>,
        K: Into<SortKey>,
    {
        let mut sort: Vec<SortKey> = keys.into_iter().map(Into::into).collect();
        for previous in &self.options.sort {
            if !sort.iter().any(|key| key.field == previous.field) {
                sort.push(previous.clone());
            }
        }

        let mut cursor = self.clone();
        cursor.options.sort = sort;
        cursor
    }

    /// Skips the first `n` results of this cursor.
    pub fn offset(&self, n: usize) -> Cursor {
        let mut cursor = self.clone();
        cursor.options.offset += n;
        cursor.options.limit = self.options.limit.map(|limit| limit.saturating_sub(n));
        cursor
    }

    /// Keeps at most the first `n` results of this cursor.
    pub fn limit(&self, n: usize) -> Cursor {
        let mut cursor = self.clone();
        cursor.options.limit = Some(self.options.limit.map_or(n, |limit| limit.min(n)));
        cursor
    }

    pub fn count(&self) -> Result<usize> {
        let storage = self.db.storage_for(&self.schema)?;
        self.db.exec("count", &self.schema, || {
            storage.count(&self.schema, self.filter.as_ref(), &self.options)
        })
    }

    /// Primary keys of the results, in memory form, without building records.
    pub fn keys(&self) -> Result<Vec<Value>> {
        let storage = self.db.storage_for(&self.schema)?;
        let primary = self.schema.primary_field();
        self.documents(&self.options)?
            .iter()
            .map(|document| {
                let stored = document.get(&primary.name).unwrap_or(&Value::Null);
                primary.from_storage(stored, storage.translator(), self.db.registry())
            })
            .collect()
    }

    /// The result at `index`. Negative indexes count from the end and need a
    /// backend that supports them.
    pub fn get(&self, index: isize) -> Result<Record> {
        let index = match usize::try_from(index) {
            Ok(index) => index,
            Err(_) => {
                let storage = self.db.storage_for(&self.schema)?;
                if !storage.capability().negative_index {
                    return Err(Error::unsupported(format!(
                        "negative index {index} on a backend without negative indexing"
                    )));
                }
                let len = self.count()?;
                len.checked_sub(index.unsigned_abs())
                    .ok_or_else(|| out_of_range(index, len))?
            }
        };

        if self.options.limit.is_some_and(|limit| index >= limit) {
            return Err(out_of_range(index, self.options.limit.unwrap_or_default()));
        }

        let options = FindOptions {
            sort: self.options.sort.clone(),
            offset: self.options.offset + index,
            limit: Some(1),
        };
        let Some(document) = self.documents(&options)?.into_iter().next() else {
            return Err(Error::no_results_found(format!(
                "index {index} out of range for schema={}",
                self.schema.name()
            )));
        };
        pipeline::hydrate(&self.db, &self.schema, document)
    }

    pub fn first(&self) -> Result<Option<Record>> {
        self.limit(1).iter()?.next().transpose()
    }

    pub fn iter(&self) -> Result<Records> {
        Ok(Records {
            db: self.db.clone(),
            schema: self.schema.clone(),
            documents: self.documents(&self.options)?.into_iter(),
        })
    }

    pub fn to_vec(&self) -> Result<Vec<Record>> {
        self.iter()?.collect()
    }

    fn documents(&self, options: &FindOptions) -> Result<Vec<Document>> {
        let storage = self.db.storage_for(&self.schema)?;
        self.db.exec("find", &self.schema, || {
            storage.find(&self.schema, self.filter.as_ref(), options)
        })
    }
}

fn out_of_range(index: impl std::fmt::Display, len: usize) -> Error {
    Error::no_results_found(format!("index {index} out of range for {len} results"))
}

/// Records built from fetched documents. Documents for keys already in the
/// identity map yield the cached instance.
#[derive(Debug)]
pub struct Records {
    db: Db,
    schema: Arc<Schema>,
    documents: vec::IntoIter<Document>,
}

impl Iterator for Records {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let document = self.documents.next()?;
        Some(pipeline::hydrate(&self.db, &self.schema, document))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.documents.size_hint()
    }
}

/// The only record matching `query`.
pub(crate) fn find_one(db: &Db, schema: &Arc<Schema>, query: &Query) -> Result<Record> {
    let filter = translate_query(db, schema, query)?;
    let storage = db.storage_for(schema)?;
    let document = db.exec("find", schema, || storage.find_one(schema, &filter))?;
    pipeline::hydrate(db, schema, document)
}

/// Translates predicate arguments to storage form using the field each
/// predicate names. Text operators compare raw strings and are left alone,
/// as are attributes the schema does not define.
pub(crate) fn translate_query(db: &Db, schema: &Schema, query: &Query) -> Result<Query> {
    let storage = db.storage_for(schema)?;
    let translator = storage.translator();
    let registry = db.registry();

    query.try_map_predicates(&mut |predicate| {
        let Some(field) = schema.field(&predicate.attribute) else {
            return Ok(predicate.argument.clone());
        };
        match predicate.op {
            op if op.is_text() => Ok(predicate.argument.clone()),
            Operator::In | Operator::NotIn => match &predicate.argument {
                Value::List(items) => Ok(Value::List(
                    items
                        .iter()
                        .map(|item| field.argument_to_storage(item, translator, registry))
                        .collect::<Result<_>>()?,
                )),
                other => Ok(other.clone()),
            },
            _ => field.argument_to_storage(&predicate.argument, translator, registry),
        }
    })
}
