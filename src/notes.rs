//! Markdown state notes kept alongside each task.
//!
//! A note is `<notes-dir>/<task-id>.md`. It is written from a template the
//! first time it is requested and never touched again, so user edits survive.

use crate::task::domain::TaskId;
use cap_std::ambient_authority;
use cap_std::fs_utf8::{Dir, OpenOptions};
use camino::{Utf8Path, Utf8PathBuf};
use minijinja::{Environment, context};
use std::io::{self, Write};
use thiserror::Error;

const NOTE_TEMPLATE: &str = "\
# Task State

Task: {{ task_id }}

## Current Objective

## Status

## Next Actions

## Blockers

## Session Context
";

/// Errors raised while preparing a task note.
#[derive(Debug, Error)]
pub enum NoteError {
    /// The notes directory or note file could not be accessed.
    #[error("note file {path}: {source}")]
    Io {
        /// Path being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The note template failed to render.
    #[error("render note template: {0}")]
    Template(#[from] minijinja::Error),
}

/// A note that exists on disk after [`TaskNotes::ensure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredNote {
    /// Location of the note.
    pub path: Utf8PathBuf,
    /// Whether this call wrote the note.
    pub created: bool,
}

/// Note store rooted at one directory.
#[derive(Debug, Clone)]
pub struct TaskNotes {
    root: Utf8PathBuf,
}

impl TaskNotes {
    /// Creates a note store rooted at `root`. Nothing is touched on disk
    /// until a note is ensured.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the notes directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns where the note of `task_id` lives.
    #[must_use]
    pub fn path_for(&self, task_id: &TaskId) -> Utf8PathBuf {
        self.root.join(file_name(task_id))
    }

    /// Creates the note of `task_id` from the template unless it exists.
    ///
    /// # Errors
    ///
    /// Returns [`NoteError::Io`] when the directory cannot be created or the
    /// file cannot be written, and [`NoteError::Template`] when rendering
    /// fails.
    pub fn ensure(&self, task_id: &TaskId) -> Result<EnsuredNote, NoteError> {
        let path = self.path_for(task_id);
        let io_error = |source| NoteError::Io {
            path: path.clone(),
            source,
        };

        Dir::create_ambient_dir_all(&self.root, ambient_authority()).map_err(io_error)?;
        let dir = Dir::open_ambient_dir(&self.root, ambient_authority()).map_err(io_error)?;

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        let mut file = match dir.open_with(file_name(task_id), &options) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!(%path, "task note already exists");
                return Ok(EnsuredNote {
                    path,
                    created: false,
                });
            }
            Err(err) => return Err(io_error(err)),
        };

        let body = render_note(task_id)?;
        file.write_all(body.as_bytes()).map_err(io_error)?;
        tracing::info!(%path, task_id = %task_id, "created task note");
        Ok(EnsuredNote {
            path,
            created: true,
        })
    }
}

fn file_name(task_id: &TaskId) -> String {
    format!("{}.md", task_id.as_str())
}

fn render_note(task_id: &TaskId) -> Result<String, minijinja::Error> {
    let environment = Environment::new();
    environment.render_str(NOTE_TEMPLATE, context! { task_id => task_id.as_str() })
}

#[cfg(test)]
mod tests {
    use super::TaskNotes;
    use crate::task::domain::TaskId;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn notes_dir() -> TempDir {
        tempfile::tempdir().expect("temporary directory")
    }

    fn nested_root(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join("nested").join("notes"))
            .expect("temporary path should be UTF-8")
    }

    #[rstest]
    fn ensure_creates_note_with_sections(notes_dir: TempDir) {
        let notes = TaskNotes::new(nested_root(&notes_dir));
        let task_id = TaskId::new("task_1_1").expect("task id");

        let note = notes.ensure(&task_id).expect("note should be created");

        assert!(note.created);
        assert!(note.path.ends_with("task_1_1.md"));
        let body = std::fs::read_to_string(&note.path).expect("note should be readable");
        for heading in [
            "# Task State",
            "## Current Objective",
            "## Status",
            "## Next Actions",
            "## Blockers",
            "## Session Context",
        ] {
            assert!(body.contains(heading), "missing {heading}");
        }
        assert!(body.contains("Task: task_1_1"));
    }

    #[rstest]
    fn ensure_leaves_existing_note_untouched(notes_dir: TempDir) {
        let notes = TaskNotes::new(nested_root(&notes_dir));
        let task_id = TaskId::new("task_2_1").expect("task id");
        let first = notes.ensure(&task_id).expect("first ensure");
        std::fs::write(&first.path, "my edits").expect("overwrite note");

        let second = notes.ensure(&task_id).expect("second ensure");

        assert!(!second.created);
        assert_eq!(second.path, first.path);
        let body = std::fs::read_to_string(&second.path).expect("note should be readable");
        assert_eq!(body, "my edits");
    }
}
