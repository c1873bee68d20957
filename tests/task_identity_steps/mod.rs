//! Step definitions for task identity scenarios.

pub mod world;

mod given;
mod then;
mod when;
