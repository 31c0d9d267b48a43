//! Erase orchestration: walker, bounded worker pool, relay.
//!
//! ```text
//!   erase-walker ──task(0)──► erase-worker-0..N ──┐
//!        │                                         ├──event(0)──► erase-relay ──► caller
//!        └────────────── Discovered / errors ──────┘
//! ```
//!
//! Every channel is a rendezvous, so the walk never runs ahead of the workers
//! and nothing happens faster than the caller drains events. The pool size is
//! the cap on simultaneously open files. Final is sent by the walker thread
//! only after every worker has been joined.

#![allow(missing_docs)]

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::core::config::{Config, WalkerConfig};
use crate::core::errors::{EraseError, Result};
use crate::erase::events::{StatusEvent, labels};
use crate::erase::file::FileEraser;
use crate::erase::fs::{EraseFs, OsFs};
use crate::erase::pattern::{RngSeedSource, SeedSource};
use crate::erase::relay::StatusRelay;
use crate::erase::walker::{ResolvedRoot, TreeWalker, WalkEvent, resolve_root};

/// Reusable erase front end. Each [`Eraser::erase`] call is an independent run.
pub struct Eraser<F: EraseFs = OsFs> {
    files: Arc<FileEraser<F>>,
    walker: WalkerConfig,
    workers: usize,
}

impl Eraser<OsFs> {
    /// Real filesystem, entropy-seeded patterns.
    pub fn new(config: &Config) -> Self {
        Self::with_parts(OsFs, Arc::new(RngSeedSource::from_entropy()), config)
    }
}

impl<F: EraseFs + 'static> Eraser<F> {
    /// Build with a custom filesystem seam and seed source.
    pub fn with_parts(fs: F, seeds: Arc<dyn SeedSource>, config: &Config) -> Self {
        Self {
            files: Arc::new(FileEraser::new(
                fs,
                seeds,
                config.eraser.batch_size_bytes,
                config.eraser.sync_after_pass,
            )),
            walker: config.walker.clone(),
            workers: config.eraser.max_concurrent_files.max(1),
        }
    }

    /// Start erasing `root` and return the event stream immediately.
    ///
    /// The stream ends after the Final event, or after the single root error
    /// when `root` cannot be resolved. Dropping the receiver cancels the run:
    /// the walk stops and workers stop after their current file.
    ///
    /// Fails only if a pipeline thread cannot be spawned.
    pub fn erase(&self, root: impl AsRef<Path>) -> Result<Receiver<StatusEvent>> {
        let resolved = resolve_root(root.as_ref());
        let relay = match &resolved {
            Ok(root) => StatusRelay::for_root(&root.path),
            Err(_) => StatusRelay::passthrough(),
        };

        let (events_tx, events_rx) = bounded::<StatusEvent>(0);
        let output = relay.spawn(events_rx)?;

        let run = Run {
            files: Arc::clone(&self.files),
            walker: TreeWalker::new(self.walker.clone()),
            workers: self.workers,
            events: events_tx,
        };
        thread::Builder::new()
            .name("erase-walker".to_string())
            .spawn(move || run.execute(resolved))
            .map_err(|e| EraseError::Runtime {
                details: format!("failed to spawn walker thread: {e}"),
            })?;

        Ok(output)
    }
}

/// Erase `root` with the default configuration.
pub fn erase(root: impl AsRef<Path>) -> Result<Receiver<StatusEvent>> {
    Eraser::new(&Config::default()).erase(root)
}

// ──────────────────── one run ────────────────────

struct Run<F> {
    files: Arc<FileEraser<F>>,
    walker: TreeWalker,
    workers: usize,
    events: Sender<StatusEvent>,
}

impl<F: EraseFs + 'static> Run<F> {
    fn emit(&self, event: StatusEvent) -> ControlFlow<()> {
        if self.events.send(event).is_ok() {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(())
        }
    }

    fn execute(self, resolved: std::result::Result<ResolvedRoot, EraseError>) {
        let root = match resolved {
            Ok(root) => root,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                let _ = self.emit(StatusEvent::error(labels::ROOT, path, err));
                return;
            }
        };

        let (task_tx, task_rx) = bounded::<PathBuf>(0);
        let mut handles = Vec::with_capacity(self.workers);
        for index in 0..self.workers {
            let files = Arc::clone(&self.files);
            let tasks = task_rx.clone();
            let events = self.events.clone();
            let spawned = thread::Builder::new()
                .name(format!("erase-worker-{index}"))
                .spawn(move || worker_loop(&files, &tasks, &events));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    let err = EraseError::Runtime {
                        details: format!("failed to spawn worker {index}: {e}"),
                    };
                    if self.emit(StatusEvent::error(labels::WORKER, "", err)).is_break() {
                        break;
                    }
                }
            }
        }
        drop(task_rx);

        if handles.is_empty() {
            return;
        }

        let flow = self.walker.walk(&root, |found| match found {
            WalkEvent::File(path) => {
                self.emit(StatusEvent::discovered(path.clone()))?;
                if task_tx.send(path).is_ok() {
                    ControlFlow::Continue(())
                } else {
                    ControlFlow::Break(())
                }
            }
            WalkEvent::Error(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                self.emit(StatusEvent::error(labels::TRAVERSE, path, err))
            }
        });
        drop(task_tx);

        let mut panicked = 0usize;
        for handle in handles {
            if handle.join().is_err() {
                panicked += 1;
            }
        }
        if panicked > 0 {
            let err = EraseError::Runtime {
                details: format!("{panicked} worker(s) panicked"),
            };
            let _ = self.emit(StatusEvent::error(labels::WORKER_PANIC, "", err));
        }

        if flow.is_continue() {
            let _ = self.emit(StatusEvent::finished(root.path));
        }
    }
}

/// Pull paths until the queue closes or the caller goes away.
fn worker_loop<F: EraseFs>(
    files: &FileEraser<F>,
    tasks: &Receiver<PathBuf>,
    events: &Sender<StatusEvent>,
) {
    for path in tasks {
        let mut connected = true;
        files.erase_file(&path, &mut |event| {
            if connected && events.send(event).is_err() {
                connected = false;
            }
        });
        if !connected {
            return;
        }
    }
}
