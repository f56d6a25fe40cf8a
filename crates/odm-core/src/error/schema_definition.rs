use super::Error;

/// Error raised while building a schema.
///
/// These are configuration mistakes: they surface from `SchemaBuilder::build`
/// or `Db::builder().build()`, never while saving or loading records.
#[derive(Debug)]
pub(super) struct SchemaDefinitionError {
    schema: Box<str>,
    kind: SchemaDefinitionKind,
}

#[derive(Debug)]
enum SchemaDefinitionKind {
    MultiplePrimaryKeys(Vec<String>),
    MissingPrimaryKey,
    Invalid(Box<str>),
}

impl std::error::Error for SchemaDefinitionError {}

impl core::fmt::Display for SchemaDefinitionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match &self.kind {
            SchemaDefinitionKind::MultiplePrimaryKeys(fields) => write!(
                f,
                "schema `{}` declares multiple primary keys: {}",
                self.schema,
                fields.join(", ")
            ),
            SchemaDefinitionKind::MissingPrimaryKey => write!(
                f,
                "schema `{}` must either define a field named `_id` or mark exactly one field as primary",
                self.schema
            ),
            SchemaDefinitionKind::Invalid(message) => {
                write!(f, "invalid schema `{}`: {}", self.schema, message)
            }
        }
    }
}

impl Error {
    /// Creates a multiple primary keys error.
    pub fn multiple_primary_keys<I, S>(schema: impl Into<String>, fields: I) -> Error
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::from(super::ErrorKind::SchemaDefinition(SchemaDefinitionError {
            schema: schema.into().into(),
            kind: SchemaDefinitionKind::MultiplePrimaryKeys(
                fields.into_iter().map(Into::into).collect(),
            ),
        }))
    }

    /// Creates a missing primary key error.
    pub fn missing_primary_key(schema: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::SchemaDefinition(SchemaDefinitionError {
            schema: schema.into().into(),
            kind: SchemaDefinitionKind::MissingPrimaryKey,
        }))
    }

    /// Creates an invalid schema error.
    ///
    /// Covers duplicate field names, reserved names, unresolvable foreign
    /// targets and other definition mistakes.
    pub fn invalid_schema(schema: impl Into<String>, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::SchemaDefinition(SchemaDefinitionError {
            schema: schema.into().into(),
            kind: SchemaDefinitionKind::Invalid(message.into().into()),
        }))
    }

    /// Returns `true` if this error is a multiple primary keys error.
    pub fn is_multiple_primary_keys(&self) -> bool {
        self.any_kind(|kind| {
            matches!(
                kind,
                super::ErrorKind::SchemaDefinition(SchemaDefinitionError {
                    kind: SchemaDefinitionKind::MultiplePrimaryKeys(_),
                    ..
                })
            )
        })
    }

    /// Returns `true` if this error is a missing primary key error.
    pub fn is_missing_primary_key(&self) -> bool {
        self.any_kind(|kind| {
            matches!(
                kind,
                super::ErrorKind::SchemaDefinition(SchemaDefinitionError {
                    kind: SchemaDefinitionKind::MissingPrimaryKey,
                    ..
                })
            )
        })
    }

    /// Returns `true` if this error is any schema definition error.
    pub fn is_invalid_schema(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::SchemaDefinition(_)))
    }
}
