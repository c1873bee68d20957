//! In-memory adapters for tests and ephemeral runs.

mod clock;
mod pane;
mod store;

pub use clock::FixedClock;
pub use pane::{InMemoryPaneClient, PaneCall, PaneOperation};
pub use store::InMemoryTaskStore;
