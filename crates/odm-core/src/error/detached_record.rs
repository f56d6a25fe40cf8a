use super::Error;

/// Error when a removed record is read, written, or saved.
#[derive(Debug)]
pub(super) struct DetachedRecordError {
    schema: Box<str>,
}

impl std::error::Error for DetachedRecordError {}

impl core::fmt::Display for DetachedRecordError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "record of schema `{}` has been removed", self.schema)
    }
}

impl Error {
    /// Creates a detached record error.
    pub fn detached_record(schema: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::DetachedRecord(DetachedRecordError {
            schema: schema.into().into(),
        }))
    }

    /// Returns `true` if this error is a detached record error.
    pub fn is_detached_record(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::DetachedRecord(_)))
    }
}
