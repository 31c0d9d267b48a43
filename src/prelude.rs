//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use tree_eraser::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{EraseError, Result};

// Pipeline
pub use crate::erase::events::{StatusEvent, StatusKind, StatusRecord, labels};
pub use crate::erase::fs::{EraseFs, EraseTarget, OsFs, WriteAt};
pub use crate::erase::pattern::{PassKind, RngSeedSource, STANDARD_PASSES, SeedSource};
pub use crate::erase::pipeline::{Eraser, erase};

// Logging
pub use crate::logger::activity::{ActivityEvent, ActivityLoggerHandle, spawn_logger};
