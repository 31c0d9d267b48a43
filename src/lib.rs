#![forbid(unsafe_code)]

//! tree_eraser: overwrite-in-place erasure of every regular file under a
//! directory tree.
//!
//! Files are not unlinked. Each one is overwritten by a seven-pass sequence of
//! pseudo-random and constant patterns, truncated to zero length, and reported
//! on an ordered stream of [`erase::events::StatusEvent`]s.
//!
//! # Library usage
//!
//! ```rust,no_run
//! use tree_eraser::prelude::*;
//!
//! let config = Config::load(None)?;
//! let eraser = Eraser::new(&config);
//! for event in eraser.erase("/tmp/scratch")? {
//!     if event.kind() == StatusKind::Error {
//!         eprintln!("{event}");
//!     }
//! }
//! # Ok::<(), EraseError>(())
//! ```

pub mod prelude;

pub mod core;
pub mod erase;
pub mod logger;
