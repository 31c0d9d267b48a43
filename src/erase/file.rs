//! Single-file eraser: open, overwrite with every pass, truncate, release.
//!
//! Failure policy is best effort. A failed open ends the file immediately;
//! a failed size read skips the passes but still releases the handle; every
//! other failure is reported and the remaining steps still run, so a flaky
//! pass never leaves a file open or untruncated.

use std::path::Path;
use std::sync::Arc;

use crate::core::errors::EraseError;
use crate::erase::events::{StatusEvent, labels};
use crate::erase::fs::{EraseFs, EraseTarget};
use crate::erase::pattern::{ByteGenerator, STANDARD_PASSES, SeedSource};
use crate::erase::writer::write_pattern;

/// Erases files one at a time; shared by every worker of a run.
pub struct FileEraser<F> {
    fs: F,
    seeds: Arc<dyn SeedSource>,
    batch_size: usize,
    sync_after_pass: bool,
}

impl<F: EraseFs> FileEraser<F> {
    /// Build an eraser over `fs`, drawing random-pass seeds from `seeds`.
    pub fn new(
        fs: F,
        seeds: Arc<dyn SeedSource>,
        batch_size: usize,
        sync_after_pass: bool,
    ) -> Self {
        Self {
            fs,
            seeds,
            batch_size,
            sync_after_pass,
        }
    }

    /// Erase `path` in place, reporting every step through `emit`.
    ///
    /// Emits [`StatusEvent::done`] last when the passes ran; otherwise only
    /// error events are emitted for this file.
    pub fn erase_file(&self, path: &Path, emit: &mut dyn FnMut(StatusEvent)) {
        let target = match self.fs.open_for_overwrite(path) {
            Ok(target) => target,
            Err(source) => {
                emit(StatusEvent::error(
                    labels::OPEN,
                    path,
                    EraseError::Open {
                        path: path.to_path_buf(),
                        source,
                    },
                ));
                return;
            }
        };

        let overwritten = match target.size() {
            Ok(size) => {
                self.overwrite(&target, path, size, emit);
                true
            }
            Err(source) => {
                emit(StatusEvent::error(
                    labels::STAT,
                    path,
                    EraseError::Stat {
                        path: path.to_path_buf(),
                        source,
                    },
                ));
                false
            }
        };

        if let Err(source) = target.close() {
            emit(StatusEvent::error(
                labels::CLOSE,
                path,
                EraseError::Close {
                    path: path.to_path_buf(),
                    source,
                },
            ));
        }

        if overwritten {
            emit(StatusEvent::done(path));
        }
    }

    fn overwrite(
        &self,
        target: &F::Target,
        path: &Path,
        size: u64,
        emit: &mut dyn FnMut(StatusEvent),
    ) {
        for (index, kind) in STANDARD_PASSES.iter().enumerate() {
            let pass = index + 1;
            let mut generator = ByteGenerator::for_pass(*kind, self.seeds.as_ref());

            if let Err(source) = write_pattern(target, size, &mut generator, self.batch_size) {
                emit(StatusEvent::error(
                    labels::WRITE,
                    path,
                    EraseError::Write {
                        path: path.to_path_buf(),
                        pass,
                        source,
                    },
                ));
            }

            if self.sync_after_pass
                && let Err(source) = target.sync()
            {
                emit(StatusEvent::error(
                    labels::SYNC,
                    path,
                    EraseError::Sync {
                        path: path.to_path_buf(),
                        pass,
                        source,
                    },
                ));
            }
        }

        if let Err(source) = target.truncate() {
            emit(StatusEvent::error(
                labels::TRUNCATE,
                path,
                EraseError::Truncate {
                    path: path.to_path_buf(),
                    source,
                },
            ));
        }
    }
}
