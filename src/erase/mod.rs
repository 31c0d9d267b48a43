//! The erase pipeline.
//!
//! A walker thread discovers regular files beneath a root and hands them to a
//! fixed pool of workers. Each worker overwrites its file with the
//! [`pattern::STANDARD_PASSES`], truncates it and reports through the shared
//! event channel. A relay thread rewrites paths for display before events
//! reach the caller.
//!
//! ```rust,no_run
//! use tree_eraser::erase::pipeline::erase;
//!
//! let events = erase("/tmp/scratch")?;
//! for event in events {
//!     println!("{event}");
//! }
//! # Ok::<(), tree_eraser::core::errors::EraseError>(())
//! ```

pub mod events;
pub mod file;
pub mod fs;
pub mod pattern;
pub mod pipeline;
pub mod relay;
pub mod walker;
pub mod writer;
