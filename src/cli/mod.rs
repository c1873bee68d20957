//! Command-line surface of the `tasklink` binary.
//!
//! Argument parsing lives here; [`App`] executes parsed commands against any
//! store and pane client so the whole surface can be driven in tests with
//! the in-memory adapters.

mod app;
mod output;

pub use app::{App, CliError};

use crate::config::GlobalArgs;
use crate::task::ports::AliasGrouping;
use crate::task::services::TaskSelector;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Top-level parser.
#[derive(Debug, Parser)]
#[command(
    name = "tasklink",
    version,
    about = "Track tasks across branches, pull requests and terminal panes"
)]
pub struct Cli {
    /// Settings shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level command groups.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Task identity, session and note commands.
    #[command(subcommand)]
    Task(TaskCommand),
}

/// Task subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum TaskCommand {
    /// Get or create the task of a branch that has no pull request yet.
    EnsurePrepr {
        /// Repository in `owner/repo` form.
        #[arg(long)]
        repo: String,
        /// Branch name.
        #[arg(long)]
        branch: String,
    },
    /// Bind a pull request to the task of its branch.
    LinkPr {
        /// Repository in `owner/repo` form.
        #[arg(long)]
        repo: String,
        /// Branch the pull request was opened from.
        #[arg(long)]
        branch: String,
        /// Pull request number.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        pr: u64,
    },
    /// List aliases, or alias counts per group.
    List {
        /// Group alias counts by this column.
        #[arg(long, value_enum)]
        group_by: Option<AliasGroupArg>,
        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },
    /// List sessions, or session counts per status.
    Sessions {
        /// Group session counts by this column.
        #[arg(long, value_enum)]
        group_by: Option<SessionGroupArg>,
        /// Reconcile against live panes before listing.
        #[arg(long)]
        reconcile: bool,
        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },
    /// Focus the task's pane, spawning one when needed.
    OpenSession {
        /// Task to open.
        #[command(flatten)]
        selector: SelectorArgs,
        /// Working directory for a spawned pane.
        #[arg(long, default_value = ".")]
        cwd: String,
        /// Workspace override.
        #[arg(long)]
        workspace: Option<String>,
        /// Label recorded for the program running in the pane.
        #[arg(long, default_value = "codex")]
        command: String,
    },
    /// Kill the task's pane and mark its session closed.
    CloseSession {
        /// Task to close.
        #[command(flatten)]
        selector: SelectorArgs,
    },
    /// Check the task's pane and correct its recorded status.
    VerifySession {
        /// Task to verify.
        #[command(flatten)]
        selector: SelectorArgs,
    },
    /// Print every task with its aliases and session.
    Dashboard {
        /// Emit JSON; pass `--json false` for a one-line summary.
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        json: bool,
    },
    /// Create the task's note when missing.
    EnsureNote {
        /// Task whose note to create.
        #[command(flatten)]
        selector: SelectorArgs,
    },
    /// Open the task's note in `$EDITOR`.
    OpenNote {
        /// Task whose note to open.
        #[command(flatten)]
        selector: SelectorArgs,
        /// Print the editor command instead of running it.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Task selection shared by session and note commands.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct SelectorArgs {
    /// Repository in `owner/repo` form.
    #[arg(long)]
    pub repo: String,
    /// Branch name; with `--pr` the pull request is linked to it.
    #[arg(long)]
    pub branch: Option<String>,
    /// Pull request number; alone it must already be linked.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub pr: Option<u64>,
}

impl SelectorArgs {
    /// Converts the arguments into a service selector.
    #[must_use]
    pub fn to_selector(&self) -> TaskSelector {
        let mut selector = TaskSelector::new(self.repo.clone());
        if let Some(branch) = &self.branch {
            selector = selector.with_branch(branch.clone());
        }
        if let Some(pr) = self.pr {
            selector = selector.with_pull_request(pr);
        }
        selector
    }
}

/// Alias grouping accepted by `task list --group-by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AliasGroupArg {
    /// Group by repository.
    Repo,
    /// Group by alias kind.
    #[value(name = "alias_type")]
    AliasType,
}

impl From<AliasGroupArg> for AliasGrouping {
    fn from(value: AliasGroupArg) -> Self {
        match value {
            AliasGroupArg::Repo => Self::Repository,
            AliasGroupArg::AliasType => Self::AliasKind,
        }
    }
}

/// Session grouping accepted by `task sessions --group-by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SessionGroupArg {
    /// Group by status.
    Status,
}
