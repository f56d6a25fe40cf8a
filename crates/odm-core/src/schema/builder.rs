use super::{Field, FieldTy, MigrateFn, PrimitiveTy, RecordData, Schema};
use crate::{Error, Result};

use indexmap::IndexMap;
use std::sync::Arc;

/// Name of the field used as primary key when none is marked.
const DEFAULT_PRIMARY: &str = "_id";

pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
    optimistic: bool,
    version: u32,
    version_of: Option<Arc<Schema>>,
    migrate: Option<MigrateFn>,
    unmigrate: Option<MigrateFn>,
}

impl SchemaBuilder {
    pub(super) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: vec![],
            optimistic: false,
            version: 1,
            version_of: None,
            migrate: None,
            unmigrate: None,
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Records saved without a primary key get a random one.
    pub fn optimistic(mut self, optimistic: bool) -> Self {
        self.optimistic = optimistic;
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn version_of(mut self, prior: Arc<Schema>) -> Self {
        self.version_of = Some(prior);
        self
    }

    /// Transform applied when data stored by the prior version is loaded
    /// through this one. Receives the prior data and the new data, with
    /// common fields already copied.
    pub fn migrate(
        mut self,
        f: impl Fn(&RecordData, &mut RecordData) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.migrate = Some(Arc::new(f));
        self
    }

    /// Transform applied when data stored by this version is loaded through
    /// the prior one. Receives this version's data and the prior data.
    pub fn unmigrate(
        mut self,
        f: impl Fn(&RecordData, &mut RecordData) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.unmigrate = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Result<Schema> {
        let name = self.name;
        let mut fields = IndexMap::new();

        for field in self.fields {
            if field.name.starts_with("__") {
                return Err(Error::invalid_schema(
                    &name,
                    format!("field name `{}` uses the reserved `__` prefix", field.name),
                ));
            }

            if let FieldTy::List(item, _) = &field.ty {
                if item.is_list() {
                    return Err(Error::invalid_schema(
                        &name,
                        format!("field `{}` is a list of lists", field.name),
                    ));
                }
            }

            if fields.contains_key(&field.name) {
                return Err(Error::invalid_schema(
                    &name,
                    format!("duplicate field `{}`", field.name),
                ));
            }

            fields.insert(field.name.clone(), field);
        }

        let primaries: Vec<_> = fields
            .values()
            .filter(|field| field.primary)
            .map(|field| field.name.clone())
            .collect();

        let primary = match &primaries[..] {
            [] => match fields.get_mut(DEFAULT_PRIMARY) {
                Some(field) => {
                    field.primary = true;
                    field.index = true;
                    DEFAULT_PRIMARY.to_string()
                }
                None => return Err(Error::missing_primary_key(&name)),
            },
            [primary] => primary.clone(),
            _ => return Err(Error::multiple_primary_keys(&name, primaries)),
        };

        if !matches!(fields[&primary].ty, FieldTy::Primitive(ty) if ty.is_scalar()) {
            return Err(Error::invalid_schema(
                &name,
                format!("primary field `{primary}` must be a scalar"),
            ));
        }

        if self.optimistic && !matches!(fields[&primary].ty, FieldTy::Primitive(PrimitiveTy::String)) {
            return Err(Error::invalid_schema(
                &name,
                format!("optimistic schema needs a string primary field, `{primary}` is not"),
            ));
        }

        if let Some(prior) = &self.version_of {
            if prior.version() >= self.version {
                return Err(Error::invalid_schema(
                    &name,
                    format!(
                        "version {} must be greater than version {} of `{}`",
                        self.version,
                        prior.version(),
                        prior.name()
                    ),
                ));
            }
        }

        Ok(Schema {
            name,
            fields,
            primary,
            optimistic: self.optimistic,
            version: self.version,
            version_of: self.version_of,
            migrate: self.migrate,
            unmigrate: self.unmigrate,
        })
    }
}
