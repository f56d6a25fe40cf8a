use super::{Field, MigrateFn, SchemaBuilder};
use crate::{Error, Result};

use indexmap::IndexMap;
use std::{fmt, sync::Arc};

/// An immutable record type: ordered fields, primary key and version
/// metadata. Built once with [`Schema::builder`].
pub struct Schema {
    pub(super) name: String,
    pub(super) fields: IndexMap<String, Field>,
    pub(super) primary: String,
    pub(super) optimistic: bool,
    pub(super) version: u32,
    pub(super) version_of: Option<Arc<Schema>>,
    pub(super) migrate: Option<MigrateFn>,
    pub(super) unmigrate: Option<MigrateFn>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the storage collection holding this schema's documents.
    ///
    /// All versions of a schema share the collection of the oldest version
    /// in their chain, so a newer version can load what an older one stored.
    pub fn collection(&self) -> &str {
        match &self.version_of {
            Some(prior) => prior.collection(),
            None => &self.name,
        }
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = &Field> + '_ {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn expect_field(&self, name: &str) -> Result<&Field> {
        self.fields
            .get(name)
            .ok_or_else(|| Error::unknown_field(&self.name, name))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn primary_name(&self) -> &str {
        &self.primary
    }

    pub fn primary_field(&self) -> &Field {
        &self.fields[&self.primary]
    }

    /// Fields holding references, including lists of references.
    pub fn foreign_fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.fields.values().filter(|field| field.is_foreign())
    }

    pub fn is_optimistic(&self) -> bool {
        self.optimistic
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// The schema this one migrates from.
    pub fn version_of(&self) -> Option<&Arc<Schema>> {
        self.version_of.as_ref()
    }

    pub fn migrate_fn(&self) -> Option<&MigrateFn> {
        self.migrate.as_ref()
    }

    pub fn unmigrate_fn(&self) -> Option<&MigrateFn> {
        self.unmigrate.as_ref()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("primary", &self.primary)
            .field("optimistic", &self.optimistic)
            .field("version", &self.version)
            .field(
                "version_of",
                &self.version_of.as_ref().map(|prior| prior.name()),
            )
            .finish()
    }
}
