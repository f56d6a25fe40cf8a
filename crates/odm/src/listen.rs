//! Scoped recording of storage calls.

use crate::Db;

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// One storage call made while a [`Listener`] was alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub op: &'static str,
    pub schema: String,
    pub elapsed: Duration,
}

/// Call count and total time per `(schema, op)`.
pub type Report = IndexMap<(String, &'static str), (usize, Duration)>;

#[derive(Debug, Default)]
pub(crate) struct Recorder {
    state: Mutex<RecorderState>,
}

#[derive(Debug, Default)]
struct RecorderState {
    depth: usize,
    events: Vec<StorageEvent>,
}

impl Recorder {
    pub(crate) fn is_listening(&self) -> bool {
        self.state.lock().depth > 0
    }

    pub(crate) fn record(&self, op: &'static str, schema: &str, elapsed: Duration) {
        let mut state = self.state.lock();
        if state.depth > 0 {
            state.events.push(StorageEvent {
                op,
                schema: schema.to_string(),
                elapsed,
            });
        }
    }

    /// Times `f` and records it if anyone is listening.
    pub(crate) fn time<T>(&self, op: &'static str, schema: &str, f: impl FnOnce() -> T) -> T {
        if !self.is_listening() {
            return f();
        }
        let start = Instant::now();
        let ret = f();
        self.record(op, schema, start.elapsed());
        ret
    }
}

/// Records storage calls made through a [`Db`] until dropped.
///
/// Listeners nest. Only the outermost listener owns the recording: dropping it
/// logs the report at `debug` level and clears the recorded events.
pub struct Listener {
    db: Db,
    outermost: bool,
}

impl Listener {
    pub(crate) fn new(db: Db) -> Self {
        let outermost = {
            let mut state = db.recorder().state.lock();
            state.depth += 1;
            state.depth == 1
        };
        Self { db, outermost }
    }

    /// Events recorded since the outermost listener started.
    pub fn events(&self) -> Vec<StorageEvent> {
        self.db.recorder().state.lock().events.clone()
    }

    /// Events grouped by `(schema, op)`.
    pub fn report(&self) -> Report {
        let mut report = Report::new();
        for event in self.db.recorder().state.lock().events.iter() {
            let entry = report
                .entry((event.schema.clone(), event.op))
                .or_insert((0, Duration::ZERO));
            entry.0 += 1;
            entry.1 += event.elapsed;
        }
        report
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if self.outermost {
            for ((schema, op), (count, elapsed)) in self.report() {
                tracing::debug!(%schema, op, count, ?elapsed, "storage calls");
            }
        }

        let mut state = self.db.recorder().state.lock();
        state.depth = state.depth.saturating_sub(1);
        if self.outermost {
            state.events.clear();
        }
    }
}
