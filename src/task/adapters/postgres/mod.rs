//! `PostgreSQL` adapters for task persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresTaskRepository, TaskPgPool, apply_schema};

/// SQL creating the task, dependency edge, and state event tables.
pub const TASK_SCHEMA_SQL: &str =
    include_str!("../../../../migrations/2026-10-19-000000_create_task_tables/up.sql");
