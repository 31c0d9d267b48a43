//! Status events streamed to the caller during an erase run.

#![allow(missing_docs)]

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::errors::EraseError;

/// Stage labels carried in [`StatusEvent::message`].
pub mod labels {
    pub const ROOT: &str = "Error while resolving path";
    pub const TRAVERSE: &str = "Error while traversing";
    pub const WORKER: &str = "Error while starting worker";
    pub const WORKER_PANIC: &str = "Error in worker";
    pub const DISCOVERED: &str = "Discovered file";
    pub const OPEN: &str = "Error while opening file";
    pub const STAT: &str = "Error while reading file stats";
    pub const WRITE: &str = "Error while writing to file";
    pub const SYNC: &str = "Error while syncing file";
    pub const TRUNCATE: &str = "Error while truncating file";
    pub const CLOSE: &str = "Error while closing file";
    pub const DONE: &str = "Erased file";
    pub const FINAL: &str = "Erased requested path";
}

/// What an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Error,
    Discovered,
    Done,
    /// Last event of a run; its path is always the absolute root.
    Final,
}

/// One observable occurrence in the pipeline. Immutable once built.
#[derive(Debug)]
pub struct StatusEvent {
    message: &'static str,
    kind: StatusKind,
    path: PathBuf,
    error: Option<EraseError>,
}

impl StatusEvent {
    pub fn discovered(path: impl Into<PathBuf>) -> Self {
        Self {
            message: labels::DISCOVERED,
            kind: StatusKind::Discovered,
            path: path.into(),
            error: None,
        }
    }

    pub fn done(path: impl Into<PathBuf>) -> Self {
        Self {
            message: labels::DONE,
            kind: StatusKind::Done,
            path: path.into(),
            error: None,
        }
    }

    pub fn finished(root: impl Into<PathBuf>) -> Self {
        Self {
            message: labels::FINAL,
            kind: StatusKind::Final,
            path: root.into(),
            error: None,
        }
    }

    pub fn error(message: &'static str, path: impl Into<PathBuf>, error: EraseError) -> Self {
        Self {
            message,
            kind: StatusKind::Error,
            path: path.into(),
            error: Some(error),
        }
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    pub fn kind(&self) -> StatusKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn error_ref(&self) -> Option<&EraseError> {
        self.error.as_ref()
    }

    pub fn is_final(&self) -> bool {
        self.kind == StatusKind::Final
    }

    /// Same event with a different path; only the relay rewrites paths.
    pub(crate) fn with_path(self, path: PathBuf) -> Self {
        Self { path, ..self }
    }

    /// Flat, serializable view for logs and machine output.
    pub fn to_record(&self) -> StatusRecord {
        StatusRecord {
            message: self.message,
            kind: self.kind,
            path: self.path.to_string_lossy().into_owned(),
            error_code: self.error.as_ref().map(EraseError::code),
            error: self.error.as_ref().map(ToString::to_string),
        }
    }
}

impl StatusEvent {
    /// `"<message>: "` left-aligned to a 17-column field.
    pub fn padded_label(&self) -> String {
        format!("{:<17}", format!("{}: ", self.message))
    }

    /// Everything after the label: the quoted path, or the error and path.
    pub fn detail(&self) -> String {
        match (&self.error, self.path.as_os_str().is_empty()) {
            (Some(err), true) => err.to_string(),
            (Some(err), false) => format!("{err}: {}", self.path.display()),
            (None, _) => format!("'{}'", self.path.display()),
        }
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.padded_label(), self.detail())
    }
}

/// Serializable snapshot of a [`StatusEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub message: &'static str,
    pub kind: StatusKind,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_non_error_events_with_quoted_path() {
        let rendered = StatusEvent::done("x/a.txt").to_string();
        assert_eq!(rendered, "Erased file:     'x/a.txt'");
    }

    #[test]
    fn long_labels_are_not_truncated() {
        let rendered = StatusEvent::discovered("x/a.txt").to_string();
        assert_eq!(rendered, "Discovered file: 'x/a.txt'");
    }

    #[test]
    fn renders_errors_with_cause_then_path() {
        let err = EraseError::Truncate {
            path: PathBuf::from("/tmp/x/a.txt"),
            source: std::io::Error::other("disk gone"),
        };
        let event = StatusEvent::error(labels::TRUNCATE, "x/a.txt", err);
        let rendered = event.to_string();
        assert!(rendered.starts_with("Error while truncating file: [ERS-3005]"));
        assert!(rendered.ends_with("disk gone: x/a.txt"));
    }

    #[test]
    fn renders_errors_without_path_once() {
        let err = EraseError::Runtime {
            details: "no threads".to_string(),
        };
        let rendered = StatusEvent::error(labels::WORKER, "", err).to_string();
        assert_eq!(
            rendered,
            "Error while starting worker: [ERS-4900] runtime failure: no threads"
        );
    }

    #[test]
    fn record_serializes_kind_and_error_code() {
        let err = EraseError::Open {
            path: PathBuf::from("/tmp/a"),
            source: std::io::Error::other("nope"),
        };
        let record = StatusEvent::error(labels::OPEN, "/tmp/a", err).to_record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["error_code"], "ERS-3001");
        assert_eq!(json["path"], "/tmp/a");

        let json = serde_json::to_value(StatusEvent::finished("/tmp/x").to_record()).unwrap();
        assert_eq!(json["kind"], "final");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn with_path_keeps_everything_else() {
        let event = StatusEvent::discovered("/tmp/x/a").with_path(PathBuf::from("x/a"));
        assert_eq!(event.kind(), StatusKind::Discovered);
        assert_eq!(event.message(), labels::DISCOVERED);
        assert_eq!(event.path(), Path::new("x/a"));
    }
}
