//! Undo log for multi-row writes.
//!
//! Each successful step of a protocol pushes the action that reverses it.
//! On failure the log is replayed newest first. A step that cannot be
//! undone is logged with the orphaned key. A `Restore` that loses its key
//! to another writer halts the replay: the older steps would rewind onto an
//! identifier this account no longer owns, so the caller rolls forward.

use std::time::Duration;

use tracing::{error, warn};

use crate::storage::{Deadline, Row, RowKey, StorageAdapter};

#[derive(Debug, Clone)]
pub(crate) enum Compensation {
    /// Remove a row this operation claimed.
    Delete(RowKey),
    /// Re-claim a row this operation removed, unless someone took it since.
    Restore(Row),
    /// Overwrite with a known-good copy.
    Put(Row),
}

/// Result of replaying an undo log.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Rollback {
    /// Every step was applied or logged.
    Complete,
    /// Replay stopped at a `Restore` of `lost`. `restored` holds the keys
    /// re-claimed before it; older steps were not run.
    Halted { lost: RowKey, restored: Vec<RowKey> },
}

#[derive(Debug, Default)]
pub(crate) struct Compensations {
    steps: Vec<Compensation>,
}

impl Compensations {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, step: Compensation) {
        self.steps.push(step);
    }

    /// Replay newest first. Each step gets its own deadline.
    pub(crate) async fn run(self, storage: &dyn StorageAdapter, timeout: Duration) -> Rollback {
        let mut restored = Vec::new();
        for step in self.steps.into_iter().rev() {
            let deadline = Deadline::after(timeout);
            match step {
                Compensation::Delete(key) => {
                    if let Err(e) = storage.delete(key.clone(), deadline).await {
                        error!(key = %key, error = %e, "Rollback failed, row left orphaned");
                    }
                }
                Compensation::Restore(row) => {
                    let key = row.key();
                    match storage.insert_if_absent(row, deadline).await {
                        Ok(true) => restored.push(key),
                        Ok(false) => {
                            warn!(key = %key, "Rollback halted, key was claimed by another writer");
                            return Rollback::Halted {
                                lost: key,
                                restored,
                            };
                        }
                        Err(e) => {
                            error!(key = %key, error = %e, "Rollback halted, row not restored");
                            return Rollback::Halted {
                                lost: key,
                                restored,
                            };
                        }
                    }
                }
                Compensation::Put(row) => {
                    let key = row.key();
                    if let Err(e) = storage.put(row, deadline).await {
                        error!(key = %key, error = %e, "Rollback failed, row not rewritten");
                    }
                }
            }
        }
        Rollback::Complete
    }
}
