//! ERS-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, EraseError>;

/// Top-level error type for the eraser.
///
/// Per-file variants carry the affected path and the underlying I/O error so a
/// status event can surface both without losing the original cause.
#[derive(Debug, Error)]
pub enum EraseError {
    #[error("[ERS-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[ERS-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[ERS-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[ERS-1101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[ERS-2001] cannot resolve root {path}: {source}")]
    RootResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[ERS-2002] traversal failure at {path}: {source}")]
    Traversal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[ERS-2003] {path} is on a different filesystem than the root")]
    CrossDevice { path: PathBuf },

    #[error("[ERS-3001] cannot open {path} for writing: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[ERS-3002] cannot read size of {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[ERS-3003] pass {pass} write failure at {path}: {source}")]
    Write {
        path: PathBuf,
        pass: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("[ERS-3004] pass {pass} sync failure at {path}: {source}")]
    Sync {
        path: PathBuf,
        pass: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("[ERS-3005] cannot truncate {path}: {source}")]
    Truncate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[ERS-3006] cannot close {path}: {source}")]
    Close {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[ERS-3900] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[ERS-4900] runtime failure: {details}")]
    Runtime { details: String },
}

impl EraseError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "ERS-1001",
            Self::MissingConfig { .. } => "ERS-1002",
            Self::ConfigParse { .. } => "ERS-1003",
            Self::Serialization { .. } => "ERS-1101",
            Self::RootResolution { .. } => "ERS-2001",
            Self::Traversal { .. } => "ERS-2002",
            Self::CrossDevice { .. } => "ERS-2003",
            Self::Open { .. } => "ERS-3001",
            Self::Stat { .. } => "ERS-3002",
            Self::Write { .. } => "ERS-3003",
            Self::Sync { .. } => "ERS-3004",
            Self::Truncate { .. } => "ERS-3005",
            Self::Close { .. } => "ERS-3006",
            Self::Io { .. } => "ERS-3900",
            Self::Runtime { .. } => "ERS-4900",
        }
    }

    /// Path the error refers to, when it has one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::MissingConfig { path }
            | Self::RootResolution { path, .. }
            | Self::Traversal { path, .. }
            | Self::CrossDevice { path }
            | Self::Open { path, .. }
            | Self::Stat { path, .. }
            | Self::Write { path, .. }
            | Self::Sync { path, .. }
            | Self::Truncate { path, .. }
            | Self::Close { path, .. }
            | Self::Io { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for EraseError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for EraseError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
