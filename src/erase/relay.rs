//! Display-path relay between the pipeline and the caller.
//!
//! Internally every event carries an absolute path. The relay forwards
//! events in order, rewriting non-final paths relative to the root's parent
//! directory so `/tmp/x/a.txt` under root `/tmp/x` reads as `x/a.txt`.
//! The final event keeps the absolute root.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{Receiver, bounded};

use crate::core::errors::{EraseError, Result};
use crate::core::paths::strip_display_prefix;
use crate::erase::events::StatusEvent;

/// Rewrites event paths for display.
#[derive(Debug, Clone, Default)]
pub struct StatusRelay {
    prefix: Option<PathBuf>,
}

impl StatusRelay {
    /// Relay for a resolved root; a root without a parent (`/`) leaves paths
    /// absolute.
    pub fn for_root(root: &Path) -> Self {
        Self {
            prefix: root.parent().map(Path::to_path_buf),
        }
    }

    /// Relay that forwards paths unchanged.
    pub fn passthrough() -> Self {
        Self::default()
    }

    pub fn transform(&self, event: StatusEvent) -> StatusEvent {
        if event.is_final() {
            return event;
        }
        match &self.prefix {
            Some(prefix) => {
                let display = strip_display_prefix(event.path(), prefix);
                event.with_path(display)
            }
            None => event,
        }
    }

    /// Forward `upstream` through a rendezvous channel on its own thread.
    ///
    /// The returned receiver closes once `upstream` does. Dropping it stops
    /// the relay, which in turn disconnects `upstream` and cancels the run.
    pub fn spawn(self, upstream: Receiver<StatusEvent>) -> Result<Receiver<StatusEvent>> {
        let (tx, rx) = bounded::<StatusEvent>(0);

        thread::Builder::new()
            .name("erase-relay".to_string())
            .spawn(move || {
                for event in upstream {
                    if tx.send(self.transform(event)).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| EraseError::Runtime {
                details: format!("failed to spawn relay thread: {e}"),
            })?;

        Ok(rx)
    }
}
