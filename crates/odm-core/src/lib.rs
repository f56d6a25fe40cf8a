pub mod driver;
pub use driver::Storage;

mod error;
pub use error::{Error, IntoError, ValidationError, ValidationKind};

pub mod schema;
pub use schema::{Field, Registry, Schema};

pub mod stmt;

pub mod translate;
pub use translate::Translator;

/// A Result type alias that uses the ODM [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
