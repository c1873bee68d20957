//! Editor command resolution for opening task notes.

use camino::Utf8Path;
use std::fmt;

/// Program used when `$EDITOR` is unset or blank.
pub const DEFAULT_EDITOR_PROGRAM: &str = "open";

/// A program and its arguments, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommand {
    program: String,
    args: Vec<String>,
}

impl EditorCommand {
    /// Returns the program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the arguments, ending with the note path.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for EditorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_escape(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_escape(arg))?;
        }
        Ok(())
    }
}

/// Builds the command that opens `note` in the user's editor.
///
/// `editor` is split on whitespace; the first word is the program and the
/// rest are leading arguments. Without an editor the note is opened with
/// `open -e`.
#[must_use]
pub fn resolve_editor_command(editor: Option<&str>, note: &Utf8Path) -> EditorCommand {
    let mut words = editor.unwrap_or_default().split_whitespace().map(str::to_owned);
    match words.next() {
        Some(program) => {
            let mut args: Vec<String> = words.collect();
            args.push(note.to_string());
            EditorCommand { program, args }
        }
        None => EditorCommand {
            program: DEFAULT_EDITOR_PROGRAM.to_owned(),
            args: vec!["-e".to_owned(), note.to_string()],
        },
    }
}

/// Escape a string for safe use in a POSIX shell command line.
#[must_use]
pub fn shell_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}

#[cfg(test)]
mod tests {
    use super::{resolve_editor_command, shell_escape};
    use camino::Utf8Path;
    use rstest::rstest;

    const NOTE: &str = "/notes/task_1_1.md";

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("   "))]
    fn missing_editor_falls_back_to_open(#[case] editor: Option<&str>) {
        let command = resolve_editor_command(editor, Utf8Path::new(NOTE));
        assert_eq!(command.program(), "open");
        assert_eq!(command.args(), ["-e", NOTE]);
    }

    #[rstest]
    fn editor_words_become_leading_arguments() {
        let command = resolve_editor_command(Some("  code --wait  "), Utf8Path::new(NOTE));
        assert_eq!(command.program(), "code");
        assert_eq!(command.args(), ["--wait", NOTE]);
    }

    #[rstest]
    fn display_quotes_each_word() {
        let command = resolve_editor_command(Some("vim"), Utf8Path::new("/my notes/it's.md"));
        assert_eq!(command.to_string(), "'vim' '/my notes/it'\\''s.md'");
    }

    #[rstest]
    #[case("", "''")]
    #[case("a b", "'a b'")]
    #[case("it's", "'it'\\''s'")]
    #[case("éß漢", "'éß漢'")]
    fn shell_escape_quotes_values(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(shell_escape(raw), expected);
    }
}
