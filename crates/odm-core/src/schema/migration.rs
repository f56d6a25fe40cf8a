use super::{RecordData, Schema};
use crate::Result;

use std::{fmt::Write, sync::Arc};

/// A migration transform: `(source, destination)`.
pub type MigrateFn = Arc<dyn Fn(&RecordData, &mut RecordData) -> Result<()> + Send + Sync>;

impl Schema {
    /// Versions this schema descends from, oldest first, ending with `self`.
    pub fn version_chain(&self) -> Vec<&Schema> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(prior) = current.version_of() {
            chain.push(prior);
            current = prior;
        }
        chain.reverse();
        chain
    }

    /// Describes each step from the oldest version to this one: which fields
    /// the step adds and which it drops.
    pub fn explain_migration(&self) -> String {
        let chain = self.version_chain();
        let mut out = String::new();

        if chain.len() == 1 {
            let _ = writeln!(out, "{} (version {}): no migrations", self.name, self.version);
            return out;
        }

        for pair in chain.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let _ = writeln!(
                out,
                "{} (version {}) -> {} (version {})",
                from.name, from.version, to.name, to.version
            );

            let added: Vec<_> = to
                .fields()
                .filter(|field| !from.has_field(&field.name))
                .map(|field| field.name.as_str())
                .collect();
            let dropped: Vec<_> = from
                .fields()
                .filter(|field| !to.has_field(&field.name))
                .map(|field| field.name.as_str())
                .collect();

            if !added.is_empty() {
                let _ = writeln!(out, "  add: {}", added.join(", "));
            }
            if !dropped.is_empty() {
                let _ = writeln!(out, "  drop: {}", dropped.join(", "));
            }
            if to.migrate.is_some() {
                let _ = writeln!(out, "  migrate: custom");
            }
        }

        out
    }
}
