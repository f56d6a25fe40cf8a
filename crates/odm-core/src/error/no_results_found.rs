use super::Error;

/// Error when a lookup that must produce a record produced none.
#[derive(Debug)]
pub(super) struct NoResultsFoundError {
    context: Option<Box<str>>,
}

impl std::error::Error for NoResultsFoundError {}

impl core::fmt::Display for NoResultsFoundError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("no results found")?;
        if let Some(ref ctx) = self.context {
            write!(f, ": {}", ctx)?;
        }
        Ok(())
    }
}

impl Error {
    /// Creates a no results found error.
    ///
    /// Raised by `find_one` for zero matches and by keyed lookups that require
    /// the record to exist.
    pub fn no_results_found(context: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::NoResultsFound(NoResultsFoundError {
            context: Some(context.into().into()),
        }))
    }

    /// Returns `true` if this error is a no results found error.
    pub fn is_no_results_found(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::NoResultsFound(_)))
    }
}
