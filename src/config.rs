//! Runtime settings resolved from flags, environment and platform defaults.

use crate::task::adapters::wezterm::DEFAULT_WEZTERM_PROGRAM;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use std::time::Duration;

/// Directory name used under the platform data directory.
pub const APP_DIR_NAME: &str = "tasklink";

/// Relative directory used when no platform data directory is known.
pub const FALLBACK_DIR: &str = ".tasklink";

/// Seconds a multiplexer command may run before it is killed.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct GlobalArgs {
    /// Path to the `SQLite` database.
    #[arg(long = "db", env = "TASKLINK_DB", global = true, value_name = "PATH")]
    pub db_path: Option<Utf8PathBuf>,

    /// Directory holding task notes.
    #[arg(long, env = "TASKLINK_NOTES_DIR", global = true, value_name = "PATH")]
    pub notes_dir: Option<Utf8PathBuf>,

    /// `WezTerm` executable.
    #[arg(long, env = "TASKLINK_WEZTERM", global = true, value_name = "PROGRAM")]
    pub wezterm: Option<String>,

    /// Timeout for each multiplexer command, in seconds.
    #[arg(long, env = "TASKLINK_TIMEOUT_SECS", global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Path to the `SQLite` database.
    pub db_path: Utf8PathBuf,
    /// Directory holding task notes.
    pub notes_dir: Utf8PathBuf,
    /// `WezTerm` executable.
    pub wezterm_program: String,
    /// Timeout for each multiplexer command.
    pub command_timeout: Duration,
}

impl Settings {
    /// Fills unset arguments from defaults rooted at `data_dir`.
    #[must_use]
    pub fn resolve_with(args: GlobalArgs, data_dir: &Utf8Path) -> Self {
        Self {
            db_path: args.db_path.unwrap_or_else(|| data_dir.join("state.db")),
            notes_dir: args.notes_dir.unwrap_or_else(|| data_dir.join("notes")),
            wezterm_program: args
                .wezterm
                .filter(|program| !program.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_WEZTERM_PROGRAM.to_owned()),
            command_timeout: Duration::from_secs(
                args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }

    /// Fills unset arguments from the platform defaults.
    #[must_use]
    pub fn resolve(args: GlobalArgs) -> Self {
        Self::resolve_with(args, &default_data_dir())
    }
}

/// Returns the platform data directory for this tool, or [`FALLBACK_DIR`]
/// when none is known or it is not valid UTF-8.
#[must_use]
pub fn default_data_dir() -> Utf8PathBuf {
    dirs::data_dir()
        .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok())
        .map_or_else(|| Utf8PathBuf::from(FALLBACK_DIR), |dir| dir.join(APP_DIR_NAME))
}
