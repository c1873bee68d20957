//! Task identity and session tracking.
//!
//! Tasks are addressed through aliases: a pre-PR alias derived from a
//! repository branch and a pull request alias derived from a pull request
//! number. Linking a pull request to its branch makes both aliases name the
//! same task. Each task may own one session recording the terminal pane it
//! runs in; sessions are reconciled against the panes the multiplexer
//! reports. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
