//! `WezTerm` adapter for the pane-client port.

mod client;
mod listing;
mod runner;

pub use client::{DEFAULT_WEZTERM_PROGRAM, WezTermPaneClient};
pub use listing::parse_pane_listing;
pub use runner::{CommandRunner, ProcessRunner, command_failed};
