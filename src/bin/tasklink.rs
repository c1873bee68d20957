//! Command-line entry point for `tasklink`.
//!
//! Usage:
//!
//! ```text
//! tasklink task ensure-prepr --repo owner/repo --branch feature/name
//! tasklink task link-pr --repo owner/repo --branch feature/name --pr 123
//! tasklink task open-session --repo owner/repo --branch feature/name
//! tasklink task dashboard
//! ```
//!
//! Every command races against Ctrl-C; an interrupted command drops its
//! in-flight store transaction and multiplexer child process.

use clap::Parser;
use eyre::WrapErr;
use mockable::DefaultClock;
use std::io::Write;
use std::sync::Arc;
use tasklink::cli::{App, Cli, Command};
use tasklink::config::Settings;
use tasklink::logging::{DEFAULT_LOG_FILTER, init_logging};
use tasklink::notes::TaskNotes;
use tasklink::task::adapters::{sqlite::SqliteTaskStore, wezterm::WezTermPaneClient};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_logging(DEFAULT_LOG_FILTER)?;

    let settings = Settings::resolve(cli.global);
    let store = SqliteTaskStore::open(&settings.db_path)
        .wrap_err_with(|| format!("open task store at {}", settings.db_path))?;
    let panes = WezTermPaneClient::new(settings.wezterm_program, settings.command_timeout);
    let app = App::new(
        Arc::new(store),
        Arc::new(panes),
        Arc::new(DefaultClock),
        TaskNotes::new(settings.notes_dir),
    )
    .with_editor(std::env::var("EDITOR").ok());

    let Command::Task(command) = cli.command;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    tokio::select! {
        result = app.run(command, &mut out) => result?,
        signal = tokio::signal::ctrl_c() => {
            signal.wrap_err("listen for interrupt")?;
            eyre::bail!("interrupted");
        }
    }
    out.flush()?;
    Ok(())
}
