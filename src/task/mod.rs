//! Task dependency and state-transition engine.
//!
//! Tasks form a dependency graph through edges written at creation time and
//! move through `waiting`, `running`, and `done` by appending state events.
//! The module follows hexagonal architecture:
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
