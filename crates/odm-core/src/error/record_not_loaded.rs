use super::Error;

/// Error when an unsaved record is assigned as a foreign reference.
#[derive(Debug)]
pub(super) struct RecordNotLoadedError {
    schema: Box<str>,
}

impl std::error::Error for RecordNotLoadedError {}

impl core::fmt::Display for RecordNotLoadedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "record of schema `{}` must be saved before it can be referenced",
            self.schema
        )
    }
}

impl Error {
    /// Creates a record not loaded error.
    pub fn record_not_loaded(schema: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::RecordNotLoaded(RecordNotLoadedError {
            schema: schema.into().into(),
        }))
    }

    /// Returns `true` if this error is a record not loaded error.
    pub fn is_record_not_loaded(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::RecordNotLoaded(_)))
    }
}
