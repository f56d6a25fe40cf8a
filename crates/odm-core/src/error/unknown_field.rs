use super::Error;

/// Error when a field name does not exist on a schema.
#[derive(Debug)]
pub(super) struct UnknownFieldError {
    schema: Box<str>,
    field: Box<str>,
}

impl std::error::Error for UnknownFieldError {}

impl core::fmt::Display for UnknownFieldError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "schema `{}` has no field `{}`", self.schema, self.field)
    }
}

impl Error {
    /// Creates an unknown field error.
    pub fn unknown_field(schema: impl Into<String>, field: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnknownField(UnknownFieldError {
            schema: schema.into().into(),
            field: field.into().into(),
        }))
    }

    /// Returns `true` if this error is an unknown field error.
    pub fn is_unknown_field(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::UnknownField(_)))
    }
}
