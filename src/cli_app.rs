//! CLI definition: argument parsing, the confirmation prompt and event rendering.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use colored::{Colorize, control};
use thiserror::Error;

use tree_eraser::core::config::Config;
use tree_eraser::core::errors::EraseError;
use tree_eraser::erase::events::{StatusEvent, StatusKind};
use tree_eraser::erase::pipeline::Eraser;
use tree_eraser::logger::activity::{
    ActivityEvent, ActivityLoggerConfig, ActivityLoggerHandle, spawn_logger,
};

/// Overwrite and truncate every regular file under a directory tree.
#[derive(Debug, Parser)]
#[command(
    name = "erase",
    author,
    version,
    about = "Securely erase every file under a directory tree",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Directory (or single file) whose contents will be destroyed.
    #[arg(value_name = "PATH")]
    path: PathBuf,
    /// Override config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad input: missing, unparsable or invalid config.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Terminal read or write failed.
    #[error("failed to access terminal: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
        }
    }
}

impl From<EraseError> for CliError {
    fn from(err: EraseError) -> Self {
        match err {
            EraseError::InvalidConfig { .. }
            | EraseError::MissingConfig { .. }
            | EraseError::ConfigParse { .. } => Self::User(err.to_string()),
            other => Self::Runtime(other.to_string()),
        }
    }
}

/// Tallies from one run, as seen by the caller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: u64,
    pub erased: u64,
    pub errors: u64,
    pub completed: bool,
}

pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout().lock();

    if !confirm(&mut input, &mut out, &cli.path)? {
        writeln!(out, "Exiting...")?;
        return Ok(());
    }

    let summary = execute(&config, &cli.path, &mut out)?;
    if summary.completed {
        Ok(())
    } else {
        Err(CliError::Runtime(format!(
            "erase of '{}' did not complete",
            cli.path.display()
        )))
    }
}

/// Ask for confirmation until the answer is `yes` or `no`. End of input
/// counts as `no`.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W, root: &Path) -> io::Result<bool> {
    write!(
        out,
        "You are about to permanently erase all files from: '{}'\nAre you sure? This is IRREVERSIBLE (yes/no): ",
        root.display()
    )?;
    out.flush()?;

    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Ok(false);
        }
        match line.trim() {
            "yes" => return Ok(true),
            "no" => return Ok(false),
            _ => {
                write!(out, "Write 'yes' or 'no': ")?;
                out.flush()?;
            }
        }
    }
}

/// Run the erase and print every event until the stream closes.
pub fn execute<W: Write>(config: &Config, root: &Path, out: &mut W) -> Result<RunSummary, CliError> {
    let logger = start_logger(config);
    if let Some((handle, _)) = &logger {
        handle.send(ActivityEvent::RunStarted {
            root: root.display().to_string(),
            config_hash: config.stable_hash().unwrap_or_default(),
        });
    }

    let started = Instant::now();
    let events = Eraser::new(config).erase(root)?;

    let mut summary = RunSummary::default();
    for event in events {
        match event.kind() {
            StatusKind::Discovered => summary.discovered += 1,
            StatusKind::Done => summary.erased += 1,
            StatusKind::Error => summary.errors += 1,
            StatusKind::Final => summary.completed = true,
        }
        writeln!(out, "{}", render(&event))?;
        if let Some((handle, _)) = &logger {
            handle.send(ActivityEvent::Status(event.to_record()));
        }
    }

    if let Some((handle, join)) = logger {
        handle.send(ActivityEvent::RunFinished {
            root: root.display().to_string(),
            erased: summary.erased,
            errors: summary.errors,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            completed: summary.completed,
        });
        handle.shutdown();
        if join.join().is_err() {
            eprintln!("[ERASE-LOG] logger thread panicked");
        }
    }

    Ok(summary)
}

fn start_logger(config: &Config) -> Option<(ActivityLoggerHandle, std::thread::JoinHandle<()>)> {
    if !config.logging.jsonl_enabled {
        return None;
    }
    match spawn_logger(ActivityLoggerConfig::from(&config.logging)) {
        Ok(pair) => Some(pair),
        Err(e) => {
            eprintln!("[ERASE-LOG] activity log disabled: {e}");
            None
        }
    }
}

/// One output line: colored label, then the path or error detail.
pub fn render(event: &StatusEvent) -> String {
    let label = event.padded_label();
    let label = match event.kind() {
        StatusKind::Error => label.red().to_string(),
        StatusKind::Done => label.green().to_string(),
        StatusKind::Final => label.bold().to_string(),
        StatusKind::Discovered => label,
    };
    format!("{label}{}", event.detail())
}
