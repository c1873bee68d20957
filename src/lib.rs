//! Tasklink: durable task identity for branches, pull requests and terminal
//! sessions.
//!
//! A task is first known by the branch it lives on and later by its pull
//! request number. Tasklink binds both aliases to one durable task record and
//! keeps an optional terminal session for each task in step with the panes
//! that actually exist.
//!
//! # Architecture
//!
//! The task core follows hexagonal architecture principles:
//!
//! - **Domain**: Pure values with no infrastructure dependencies
//! - **Ports**: Store and pane-client traits
//! - **Adapters**: In-memory, `SQLite` and `WezTerm` implementations
//!
//! # Modules
//!
//! - [`task`]: Identity resolution, durable storage and session reconciliation
//! - [`notes`]: Markdown state notes per task
//! - [`editor`]: Editor command resolution
//! - [`config`]: Runtime settings
//! - [`logging`]: Tracing subscriber setup
//! - [`cli`]: Command-line surface

pub mod cli;
pub mod config;
pub mod editor;
pub mod logging;
pub mod notes;
pub mod task;
