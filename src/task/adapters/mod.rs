//! Adapter implementations of the task ports.
//!
//! - [`memory`]: in-memory store, scripted pane client and adjustable clock
//! - [`sqlite`]: durable `SQLite` store
//! - [`wezterm`]: pane client driving the `wezterm` CLI

pub mod memory;
pub mod sqlite;
pub mod wezterm;
