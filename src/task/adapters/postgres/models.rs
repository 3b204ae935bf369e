//! Diesel row models for task persistence.

use super::schema::{dependency_edges, state_events, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task name.
    pub name: String,
    /// Owning user identifier.
    pub owner_id: String,
    /// Free-text description.
    pub description: String,
    /// Optional related URL.
    pub related_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task name.
    pub name: String,
    /// Owning user identifier.
    pub owner_id: String,
    /// Free-text description.
    pub description: String,
    /// Optional related URL.
    pub related_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for dependency edges.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = dependency_edges)]
pub struct NewDependencyEdgeRow {
    /// Edge identifier.
    pub id: uuid::Uuid,
    /// Dependent task.
    pub task_id: uuid::Uuid,
    /// Task depended upon.
    pub parent_id: uuid::Uuid,
}

/// Row model for state events, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = state_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StateEventRow {
    /// Event identifier.
    pub id: uuid::Uuid,
    /// Task the event belongs to.
    pub task_id: uuid::Uuid,
    /// State entered.
    pub state: String,
    /// Per-task position in the log.
    pub sequence: i64,
    /// When the state was entered.
    pub created_at: DateTime<Utc>,
}
