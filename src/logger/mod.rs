//! Activity logging: JSONL append-only records written from a background thread.

pub mod activity;
pub mod jsonl;
