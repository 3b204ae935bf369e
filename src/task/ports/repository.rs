//! Repository port for tasks, their dependency edges, and state events.

use crate::task::domain::{
    EventSequence, NewTaskRecord, OwnerId, StateEvent, Task, TaskId, TaskState,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Outcome of a conditional state append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The latest state matched and the new event was written.
    Appended(StateEvent),
    /// The latest state no longer matched the expectation; nothing was
    /// written.
    Stale {
        /// State actually found at commit time.
        current: TaskState,
    },
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a task together with its dependency edges and initial state
    /// event, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists and [`TaskRepositoryError::UnknownParent`] when an edge names a
    /// task that does not exist.
    async fn create(&self, record: &NewTaskRecord) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns every task owned by `owner`, newest first.
    async fn find_by_owner(&self, owner: &OwnerId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the tasks `id` depends on.
    async fn find_parents(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the tasks depending on `id`.
    async fn find_children(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the most recent state event of a task.
    ///
    /// Returns `None` when the task has no recorded state.
    async fn latest_state(&self, id: TaskId) -> TaskRepositoryResult<Option<StateEvent>>;

    /// Returns the full state history of a task in sequence order.
    async fn state_history(&self, id: TaskId) -> TaskRepositoryResult<Vec<StateEvent>>;

    /// Appends a `next` state event if the task's latest state is still
    /// `expected`.
    ///
    /// The comparison and the write happen as one serialisable step per
    /// task, so concurrent callers that observed the same state cannot both
    /// append.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn append_state_if_current(
        &self,
        id: TaskId,
        expected: TaskState,
        next: TaskState,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<AppendOutcome>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// A dependency edge references a task that does not exist.
    #[error("unknown parent task: {0}")]
    UnknownParent(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A state event already occupies this position in the task's log.
    #[error("state event {sequence} already recorded for task {task_id}")]
    SequenceConflict {
        /// Task whose log was written.
        task_id: TaskId,
        /// Position that was already taken.
        sequence: EventSequence,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
