use super::Error;
use crate::stmt::Value;

/// Error when an insert targets a primary key that is already stored.
///
/// The optimistic insert loop recovers from this error by drawing a new key;
/// everywhere else it is fatal to the operation.
#[derive(Debug)]
pub(super) struct KeyExistsError {
    schema: Box<str>,
    key: Value,
}

impl std::error::Error for KeyExistsError {}

impl core::fmt::Display for KeyExistsError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "key already exists: schema={} key={}",
            self.schema, self.key
        )
    }
}

impl Error {
    /// Creates a key exists error.
    pub fn key_exists(schema: impl Into<String>, key: &Value) -> Error {
        Error::from(super::ErrorKind::KeyExists(KeyExistsError {
            schema: schema.into().into(),
            key: key.clone(),
        }))
    }

    /// Returns `true` if this error is a key exists error.
    pub fn is_key_exists(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::KeyExists(_)))
    }
}
