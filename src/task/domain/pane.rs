//! Terminal panes as reported by the multiplexer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

/// Multiplexer pane identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaneId(i64);

impl PaneId {
    /// Wraps a raw pane identifier reported by the multiplexer.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Interprets a stored pane column, where zero or below means unbound.
    #[must_use]
    pub const fn bound(raw: i64) -> Option<Self> {
        if raw > 0 { Some(Self(raw)) } else { None }
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live pane and the workspace it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pane {
    id: PaneId,
    workspace: String,
}

impl Pane {
    /// Creates a pane entry. An absent workspace is the empty string.
    #[must_use]
    pub fn new(id: PaneId, workspace: impl Into<String>) -> Self {
        Self {
            id,
            workspace: workspace.into(),
        }
    }

    /// Returns the pane identifier.
    #[must_use]
    pub const fn id(&self) -> PaneId {
        self.id
    }

    /// Returns the workspace name, or `""` when unknown.
    #[must_use]
    pub fn workspace(&self) -> &str {
        &self.workspace
    }
}

/// Point-in-time snapshot of the panes that currently exist.
///
/// Duplicate reports of one pane collapse into a single entry, preferring the
/// report that names a workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivePanes {
    panes: BTreeMap<PaneId, Pane>,
}

impl LivePanes {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from possibly duplicated pane reports.
    #[must_use]
    pub fn from_panes(panes: impl IntoIterator<Item = Pane>) -> Self {
        let mut snapshot = Self::new();
        for pane in panes {
            snapshot.insert(pane);
        }
        snapshot
    }

    /// Adds a pane report, keeping the existing entry unless it lacks a
    /// workspace and the new one has one.
    pub fn insert(&mut self, pane: Pane) {
        match self.panes.entry(pane.id()) {
            Entry::Vacant(slot) => {
                slot.insert(pane);
            }
            Entry::Occupied(mut slot) => {
                if slot.get().workspace().is_empty() && !pane.workspace().is_empty() {
                    slot.insert(pane);
                }
            }
        }
    }

    /// Drops a pane from the snapshot, returning it if it was present.
    pub fn remove(&mut self, id: PaneId) -> Option<Pane> {
        self.panes.remove(&id)
    }

    /// Returns whether the pane is live.
    #[must_use]
    pub fn contains(&self, id: PaneId) -> bool {
        self.panes.contains_key(&id)
    }

    /// Returns the live pane with the given identifier.
    #[must_use]
    pub fn get(&self, id: PaneId) -> Option<&Pane> {
        self.panes.get(&id)
    }

    /// Returns the number of live panes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.panes.len()
    }

    /// Returns whether no panes are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }
}
