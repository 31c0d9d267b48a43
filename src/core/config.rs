//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{EraseError, Result};

/// Default worker-pool size: the bound on concurrently open files.
pub const DEFAULT_MAX_CONCURRENT_FILES: usize = 50;

/// Default batch length in bytes (5 MB).
pub const DEFAULT_BATCH_SIZE_BYTES: usize = 5_000_000;

/// Largest accepted batch length (1 GiB). Each worker holds one batch buffer.
pub const MAX_BATCH_SIZE_BYTES: usize = 1 << 30;

/// Full eraser configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub eraser: EraserConfig,
    pub walker: WalkerConfig,
    pub logging: LoggingConfig,
    /// Where this configuration was loaded from (not serialized).
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

/// Worker pool and overwrite knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EraserConfig {
    /// Number of workers, and therefore the cap on open file descriptors.
    pub max_concurrent_files: usize,
    /// Bytes materialized per positioned write.
    pub batch_size_bytes: usize,
    /// Flush file data to storage after every pass.
    pub sync_after_pass: bool,
}

/// Traversal behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct WalkerConfig {
    /// Skip directories that live on a different device than the root.
    pub one_file_system: bool,
}

/// JSONL activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub jsonl_enabled: bool,
    pub jsonl_path: PathBuf,
    pub jsonl_max_size_bytes: u64,
    pub jsonl_max_rotated_files: u32,
}

impl Default for EraserConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: DEFAULT_MAX_CONCURRENT_FILES,
            batch_size_bytes: DEFAULT_BATCH_SIZE_BYTES,
            sync_after_pass: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            jsonl_enabled: false,
            jsonl_path: home_dir()
                .join(".local")
                .join("share")
                .join("erase")
                .join("activity.jsonl"),
            jsonl_max_size_bytes: 10 * 1024 * 1024,
            jsonl_max_rotated_files: 3,
        }
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[ERASE-CONFIG] WARNING: HOME not set, falling back to /tmp");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        home_dir().join(".config").join("erase").join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| EraseError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let mut parsed: Self = toml::from_str(&raw)?;
            parsed.config_file = Some(path_buf);
            parsed
        } else if is_explicit_path {
            return Err(EraseError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for the activity log.
    ///
    /// FNV-1a over the canonical JSON so the value is stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("ERASE_MAX_CONCURRENT_FILES") {
            self.eraser.max_concurrent_files = parse_env("ERASE_MAX_CONCURRENT_FILES", &raw)?;
        }
        if let Some(raw) = lookup("ERASE_BATCH_SIZE_BYTES") {
            self.eraser.batch_size_bytes = parse_env("ERASE_BATCH_SIZE_BYTES", &raw)?;
        }
        if let Some(raw) = lookup("ERASE_SYNC_AFTER_PASS") {
            self.eraser.sync_after_pass = parse_env("ERASE_SYNC_AFTER_PASS", &raw)?;
        }
        if let Some(raw) = lookup("ERASE_ONE_FILE_SYSTEM") {
            self.walker.one_file_system = parse_env("ERASE_ONE_FILE_SYSTEM", &raw)?;
        }
        if let Some(raw) = lookup("ERASE_JSONL_ENABLED") {
            self.logging.jsonl_enabled = parse_env("ERASE_JSONL_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("ERASE_JSONL_PATH") {
            self.logging.jsonl_path = PathBuf::from(raw);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.eraser.max_concurrent_files == 0 {
            return Err(EraseError::InvalidConfig {
                details: "eraser.max_concurrent_files must be > 0".to_string(),
            });
        }
        if self.eraser.batch_size_bytes == 0 {
            return Err(EraseError::InvalidConfig {
                details: "eraser.batch_size_bytes must be > 0".to_string(),
            });
        }
        if self.eraser.batch_size_bytes > MAX_BATCH_SIZE_BYTES {
            return Err(EraseError::InvalidConfig {
                details: format!(
                    "eraser.batch_size_bytes must be <= {MAX_BATCH_SIZE_BYTES}, got {}",
                    self.eraser.batch_size_bytes
                ),
            });
        }
        if self.logging.jsonl_enabled && self.logging.jsonl_max_size_bytes == 0 {
            return Err(EraseError::InvalidConfig {
                details: "logging.jsonl_max_size_bytes must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| EraseError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

#[cfg(test)]
mod tests {
    use super::{Config, EraseError, MAX_BATCH_SIZE_BYTES};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.eraser.max_concurrent_files, 50);
        assert_eq!(cfg.eraser.batch_size_bytes, 5_000_000);
        assert!(cfg.eraser.sync_after_pass);
        assert!(!cfg.walker.one_file_system);
    }

    #[test]
    fn zero_workers_rejected() {
        let mut cfg = Config::default();
        cfg.eraser.max_concurrent_files = 0;
        let err = cfg.validate().expect_err("expected invalid worker count");
        match err {
            EraseError::InvalidConfig { details } => {
                assert!(details.contains("max_concurrent_files"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_batch_rejected() {
        let mut cfg = Config::default();
        cfg.eraser.batch_size_bytes = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn oversized_batch_rejected() {
        let mut cfg = Config::default();
        cfg.eraser.batch_size_bytes = MAX_BATCH_SIZE_BYTES;
        assert!(cfg.validate().is_ok());

        let env = vars(&[("ERASE_BATCH_SIZE_BYTES", "100000000000")]);
        cfg.apply_env_overrides_from(|name| env.get(name).cloned())
            .expect("overrides apply");
        let err = cfg.validate().expect_err("expected oversized batch");
        assert_eq!(err.code(), "ERS-1001");
        assert!(err.to_string().contains("batch_size_bytes"));
    }

    #[test]
    fn env_overrides_apply() {
        let env = vars(&[
            ("ERASE_MAX_CONCURRENT_FILES", "4"),
            ("ERASE_BATCH_SIZE_BYTES", "1024"),
            ("ERASE_SYNC_AFTER_PASS", "false"),
            ("ERASE_ONE_FILE_SYSTEM", "true"),
            ("ERASE_JSONL_PATH", "/tmp/erase-test.jsonl"),
        ]);
        let mut cfg = Config::default();
        cfg.apply_env_overrides_from(|name| env.get(name).cloned())
            .expect("overrides apply");

        assert_eq!(cfg.eraser.max_concurrent_files, 4);
        assert_eq!(cfg.eraser.batch_size_bytes, 1024);
        assert!(!cfg.eraser.sync_after_pass);
        assert!(cfg.walker.one_file_system);
        assert_eq!(cfg.logging.jsonl_path, PathBuf::from("/tmp/erase-test.jsonl"));
    }

    #[test]
    fn env_invalid_number_rejected() {
        let env = vars(&[("ERASE_MAX_CONCURRENT_FILES", "many")]);
        let mut cfg = Config::default();
        let err = cfg
            .apply_env_overrides_from(|name| env.get(name).cloned())
            .expect_err("expected parse failure");
        assert_eq!(err.code(), "ERS-1003");
        assert!(err.to_string().contains("ERASE_MAX_CONCURRENT_FILES"));
    }

    #[test]
    fn load_returns_error_for_explicit_missing_path() {
        let result = Config::load(Some(Path::new("/nonexistent/erase/config.toml")));
        assert!(matches!(result, Err(EraseError::MissingConfig { .. })));
    }

    #[test]
    fn load_reads_partial_toml_and_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[eraser]\nmax_concurrent_files = 3\n").unwrap();

        let cfg = Config::load(Some(&path)).expect("config loads");
        assert_eq!(cfg.eraser.max_concurrent_files, 3);
        assert_eq!(cfg.eraser.batch_size_bytes, 5_000_000);
        assert_eq!(cfg.config_file.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[eraser\nmax_concurrent_files = ").unwrap();

        let err = Config::load(Some(&path)).expect_err("malformed toml");
        assert_eq!(err.code(), "ERS-1003");
    }

    #[test]
    fn stable_hash_deterministic_and_sensitive() {
        let cfg = Config::default();
        let h1 = cfg.stable_hash().expect("hash");
        let h2 = cfg.stable_hash().expect("hash");
        assert_eq!(h1, h2);

        let mut changed = cfg;
        changed.eraser.max_concurrent_files = 7;
        assert_ne!(h1, changed.stable_hash().expect("hash"));
    }
}
