use super::Error;

/// Error when `find_one` matches more than one record.
#[derive(Debug)]
pub(super) struct MultipleResultsFoundError {
    count: usize,
}

impl std::error::Error for MultipleResultsFoundError {}

impl core::fmt::Display for MultipleResultsFoundError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "multiple results found: query for find_one must return exactly one result; returned {}",
            self.count
        )
    }
}

impl Error {
    /// Creates a multiple results found error for a query that matched `count` records.
    pub fn multiple_results_found(count: usize) -> Error {
        Error::from(super::ErrorKind::MultipleResultsFound(
            MultipleResultsFoundError { count },
        ))
    }

    /// Returns `true` if this error is a multiple results found error.
    pub fn is_multiple_results_found(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::MultipleResultsFound(_)))
    }
}
