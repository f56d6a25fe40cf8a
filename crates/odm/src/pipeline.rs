//! The record lifecycle: loading, saving, removing and bulk updates.

mod load;
pub(crate) use load::{hydrate, load, reload};

mod remove;
pub(crate) use remove::remove_one;

mod save;
pub(crate) use save::save;

mod update;
pub(crate) use update::{update, update_records};
