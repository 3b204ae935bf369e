//! Ready-to-do: task dependency tracking and lifecycle gating.
//!
//! This crate records tasks, the tasks they depend on, and an append-only log
//! of lifecycle states. A task may only start running once every task it
//! depends on is done, and its accumulated running time is reconstructed from
//! the log on demand.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`task`]: Dependency resolution, readiness, transitions, running time
//! - [`config`]: Store configuration and connection pooling
//! - [`logging`]: Tracing subscriber installation
//! - [`worker`]: Argument handling for the `pg_worker` test-cluster helper

pub mod config;
pub mod logging;
pub mod task;
pub mod worker;
