use super::Value;

use indexmap::IndexMap;

/// A stored record: field name to storage-form value, in schema field order.
pub type Document = IndexMap<String, Value>;

/// Document entry holding the serialized backreference map.
pub const BACKREFS_KEY: &str = "__backrefs";

/// Document entry holding the schema version the document was written with.
pub const VERSION_KEY: &str = "__version";
