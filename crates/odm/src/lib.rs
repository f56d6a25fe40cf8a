pub mod backref;
pub use backref::{Backrefs, ForeignList};

mod cache;

pub mod cursor;
pub use cursor::{Cursor, Records};

pub mod db;
pub use db::Db;

mod keygen;

pub mod listen;
pub use listen::{Listener, StorageEvent};

mod migrate;

mod pipeline;

pub mod record;
pub use record::{Input, Record};

pub use odm_core::{
    bail, err,
    driver::{Capability, Storage},
    schema::{Field, RecordData, Schema, Validator},
    stmt::{Document, Query, SortKey, Value, ValueRef},
    translate::{DefaultTranslator, JsonTranslator, StringTranslator, Translator},
    Error, Result, ValidationKind,
};
