mod builder;
pub use builder::SchemaBuilder;

pub mod field;
pub use field::{Field, FieldDefault, FieldTy, PrimitiveTy};

mod migration;
pub use migration::MigrateFn;

mod model;
pub use model::Schema;

mod record_data;
pub use record_data::RecordData;

mod registry;
pub use registry::Registry;

mod validator;
pub use validator::Validator;
