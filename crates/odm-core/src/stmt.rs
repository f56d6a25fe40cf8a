mod document;
pub use document::{Document, BACKREFS_KEY, VERSION_KEY};

mod eval;

mod find;
pub use find::{Direction, FindOptions, SortKey};

mod op;
pub use op::{GroupOp, Operator};

mod query;
pub use query::{Group, Predicate, Query};

mod value;
pub use value::{Value, ValueRef};

mod value_cmp;

mod value_key;
pub use value_key::ValueKey;
