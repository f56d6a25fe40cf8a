use super::Error;

/// Error when a schema without a bound storage backend is used.
#[derive(Debug)]
pub(super) struct NoStorageBackendError {
    schema: Box<str>,
}

impl std::error::Error for NoStorageBackendError {}

impl core::fmt::Display for NoStorageBackendError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "no storage backend attached to schema `{}`",
            self.schema
        )
    }
}

impl Error {
    /// Creates a no storage backend error.
    pub fn no_storage_backend(schema: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::NoStorageBackend(NoStorageBackendError {
            schema: schema.into().into(),
        }))
    }

    /// Returns `true` if this error is a no storage backend error.
    pub fn is_no_storage_backend(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::NoStorageBackend(_)))
    }
}
