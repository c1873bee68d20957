//! Text and JSON renderings of command results.

use super::CliError;
use crate::task::{
    domain::{Session, TaskAlias},
    ports::GroupCount,
};
use serde::Serialize;
use std::io::Write;

/// Writes `value` as one line of compact JSON.
pub(super) fn write_json(out: &mut impl Write, value: &impl Serialize) -> Result<(), CliError> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Writes grouped counts as a tab-separated table or JSON.
pub(super) fn write_groups(
    out: &mut impl Write,
    groups: &[GroupCount],
    json: bool,
    empty_message: &str,
) -> Result<(), CliError> {
    if groups.is_empty() {
        writeln!(out, "{empty_message}")?;
        return Ok(());
    }
    if json {
        return write_json(out, &groups);
    }
    writeln!(out, "group_key\tcount")?;
    for group in groups {
        writeln!(out, "{}\t{}", group.key, group.count)?;
    }
    Ok(())
}

/// Writes alias rows as a tab-separated table or JSON.
pub(super) fn write_aliases(
    out: &mut impl Write,
    aliases: &[TaskAlias],
    json: bool,
) -> Result<(), CliError> {
    if aliases.is_empty() {
        writeln!(out, "no tasks")?;
        return Ok(());
    }
    if json {
        return write_json(out, &aliases);
    }
    writeln!(out, "task_id\talias_type\talias_value\trepo\tbranch\tpr")?;
    for alias in aliases {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            alias.task_id(),
            alias.kind(),
            alias.value(),
            alias.repository(),
            alias.branch().map(|branch| branch.as_str()).unwrap_or_default(),
            alias.pr_number().map_or(0, |number| number.value()),
        )?;
    }
    Ok(())
}

/// Writes sessions as a tab-separated table or JSON.
pub(super) fn write_sessions(
    out: &mut impl Write,
    sessions: &[Session],
    json: bool,
) -> Result<(), CliError> {
    if sessions.is_empty() {
        writeln!(out, "no sessions")?;
        return Ok(());
    }
    if json {
        return write_json(out, &sessions);
    }
    writeln!(out, "task_id\tstatus\tworkspace\tpane_id\tcwd\tcommand\texternal_session")?;
    for session in sessions {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            session.task_id(),
            session.status(),
            session.workspace(),
            pane_column(session),
            session.launch().cwd(),
            session.launch().command(),
            session.external_session_label().unwrap_or_default(),
        )?;
    }
    Ok(())
}

/// Renders the pane binding the way it is stored: `0` when unbound.
pub(super) fn pane_column(session: &Session) -> i64 {
    session.pane_id().map_or(0, |pane| pane.value())
}
