use super::Schema;
use crate::{Error, Result};

use indexmap::IndexMap;
use std::sync::Arc;

/// All schemas known to a database, by name.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    schemas: IndexMap<String, Arc<Schema>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a schema. Registering a second schema under the same name is an
    /// error.
    pub fn register(&mut self, schema: Arc<Schema>) -> Result<()> {
        if self.schemas.contains_key(schema.name()) {
            return Err(Error::invalid_schema(
                schema.name(),
                "a schema with this name is already registered",
            ));
        }
        self.schemas.insert(schema.name().to_string(), schema);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Arc<Schema>> {
        self.schemas
            .get(name)
            .ok_or_else(|| Error::invalid_schema(name, "schema is not registered"))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Schema>> + '_ {
        self.schemas.values()
    }

    /// Checks that every reference field targets a registered schema.
    pub fn verify(&self) -> Result<()> {
        for schema in self.schemas.values() {
            for field in schema.foreign_fields() {
                if let Some(target) = field.foreign_target() {
                    if !self.contains(target) {
                        return Err(Error::invalid_schema(
                            schema.name(),
                            format!(
                                "field `{}` references unknown schema `{target}`",
                                field.name
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Finds the registered schema storing documents at `version` in the
    /// same collection as `schema`.
    pub fn find_version(&self, schema: &Schema, version: u32) -> Option<&Arc<Schema>> {
        self.schemas
            .values()
            .find(|other| other.collection() == schema.collection() && other.version() == version)
    }
}
