use super::Error;
use crate::stmt::Value;

/// Error when a field value fails validation.
///
/// Always local to the failing save: nothing has been written when this is
/// returned.
#[derive(Debug)]
pub struct ValidationError {
    kind: ValidationKind,
    field: Box<str>,
    value: Value,
    message: Box<str>,
}

/// What kind of check rejected the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    /// The value has the wrong type for the field
    Type,

    /// The value has the right type but an unacceptable content
    Value,

    /// A required field holds null
    Required,

    /// A length bound was violated
    Length,

    /// The value did not match a regular expression
    Regex,

    /// The value is not a valid URL
    Url,

    /// A caller-supplied validator rejected the value
    Custom,

    /// A non-editable field was written from outside the pipeline
    NotEditable,
}

impl ValidationError {
    pub fn kind(&self) -> ValidationKind {
        self.kind
    }

    /// Name of the field that failed validation.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The rejected value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::error::Error for ValidationError {}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "validation failed on `{}`: {}",
            self.field, self.message
        )
    }
}

impl Error {
    /// Creates a validation error.
    pub fn validation(
        kind: ValidationKind,
        field: impl Into<String>,
        value: Value,
        message: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::Validation(ValidationError {
            kind,
            field: field.into().into(),
            value,
            message: message.into().into(),
        }))
    }

    /// Returns the validation failure, if this error (or one it wraps) is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        self.chain().find_map(|err| match err.kind() {
            super::ErrorKind::Validation(validation) => Some(validation),
            _ => None,
        })
    }

    /// Returns `true` if this error is a validation error.
    pub fn is_validation(&self) -> bool {
        self.as_validation().is_some()
    }

    /// Returns `true` if a required field held null.
    pub fn is_required_field(&self) -> bool {
        self.as_validation()
            .is_some_and(|err| err.kind == ValidationKind::Required)
    }

    /// Returns `true` if a non-editable field was written.
    pub fn is_not_editable(&self) -> bool {
        self.as_validation()
            .is_some_and(|err| err.kind == ValidationKind::NotEditable)
    }
}
