//! Background activity logger.
//!
//! A dedicated `erase-logger` thread owns the [`JsonlWriter`]. Everyone else
//! sends [`ActivityEvent`]s through a bounded crossbeam channel with
//! `try_send`, so a slow disk can never stall the event stream that is
//! driving the erase.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::core::config::LoggingConfig;
use crate::core::errors::{EraseError, Result};
use crate::erase::events::{StatusKind, StatusRecord};
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

const CHANNEL_CAPACITY: usize = 1024;

/// What gets written to the activity log.
#[derive(Debug, Clone)]
pub enum ActivityEvent {
    RunStarted {
        root: String,
        config_hash: String,
    },
    /// A status event as the caller saw it.
    Status(StatusRecord),
    RunFinished {
        root: String,
        erased: u64,
        errors: u64,
        duration_ms: u64,
        completed: bool,
    },
    /// Flush and stop the logger thread.
    Shutdown,
}

// ──────────────────── handle ────────────────────

/// Cloneable, non-blocking sender side of the logger.
#[derive(Clone)]
pub struct ActivityLoggerHandle {
    tx: Sender<ActivityEvent>,
    dropped_events: Arc<AtomicU64>,
}

impl ActivityLoggerHandle {
    /// Queue an event; when the channel is full it is counted and dropped.
    pub fn send(&self, event: ActivityEvent) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(event) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Ask the logger thread to flush and exit. Blocks until queued.
    pub fn shutdown(&self) {
        let _ = self.tx.send(ActivityEvent::Shutdown);
    }
}

// ──────────────────── configuration ────────────────────

pub struct ActivityLoggerConfig {
    pub jsonl: JsonlConfig,
    pub channel_capacity: usize,
}

impl From<&LoggingConfig> for ActivityLoggerConfig {
    fn from(cfg: &LoggingConfig) -> Self {
        Self {
            jsonl: JsonlConfig::from(cfg),
            channel_capacity: CHANNEL_CAPACITY,
        }
    }
}

// ──────────────────── spawn ────────────────────

/// Start the logger thread.
pub fn spawn_logger(
    config: ActivityLoggerConfig,
) -> Result<(ActivityLoggerHandle, thread::JoinHandle<()>)> {
    let (tx, rx) = bounded::<ActivityEvent>(config.channel_capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    let dropped_clone = Arc::clone(&dropped);

    let handle = ActivityLoggerHandle {
        tx,
        dropped_events: dropped,
    };

    let join = thread::Builder::new()
        .name("erase-logger".to_string())
        .spawn(move || logger_thread_main(&rx, config.jsonl, &dropped_clone))
        .map_err(|e| EraseError::Runtime {
            details: format!("failed to spawn logger thread: {e}"),
        })?;

    Ok((handle, join))
}

fn logger_thread_main(rx: &Receiver<ActivityEvent>, jsonl: JsonlConfig, dropped: &AtomicU64) {
    let mut jsonl = JsonlWriter::open(jsonl);

    while let Ok(event) = rx.recv() {
        let d = dropped.swap(0, Ordering::Relaxed);
        if d > 0 {
            let warn = LogEntry::new(EventType::Error, Severity::Warning)
                .with_details(format!("{d} log events dropped due to back-pressure"));
            jsonl.write_entry(&warn);
        }

        if matches!(event, ActivityEvent::Shutdown) {
            break;
        }
        jsonl.write_entry(&event_to_log_entry(&event));
    }

    jsonl.fsync();
}

// ──────────────────── event conversion ────────────────────

fn event_to_log_entry(event: &ActivityEvent) -> LogEntry {
    match event {
        ActivityEvent::RunStarted { root, config_hash } => {
            LogEntry::new(EventType::RunStarted, Severity::Info)
                .with_path(root.clone())
                .with_details(format!("config_hash={config_hash}"))
        }
        ActivityEvent::Status(record) => {
            let (event, severity) = match record.kind {
                StatusKind::Discovered => (EventType::FileDiscovered, Severity::Info),
                StatusKind::Done => (EventType::FileErased, Severity::Info),
                StatusKind::Error => (EventType::Error, Severity::Warning),
                StatusKind::Final => (EventType::RunCompleted, Severity::Info),
            };
            let mut entry = LogEntry::new(event, severity).with_path(record.path.clone());
            entry.error_code = record.error_code.map(str::to_string);
            entry.error_message.clone_from(&record.error);
            if record.kind == StatusKind::Error {
                entry.details = Some(record.message.to_string());
            }
            entry
        }
        ActivityEvent::RunFinished {
            root,
            erased,
            errors,
            duration_ms,
            completed,
        } => {
            let severity = if *errors > 0 || !completed {
                Severity::Warning
            } else {
                Severity::Info
            };
            LogEntry::new(EventType::RunCompleted, severity)
                .with_path(root.clone())
                .with_details(format!(
                    "erased={erased} errors={errors} duration_ms={duration_ms} completed={completed}"
                ))
        }
        ActivityEvent::Shutdown => LogEntry::new(EventType::RunCompleted, Severity::Info),
    }
}
