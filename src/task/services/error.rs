//! Service-level error type shared by the task services.

use crate::task::{
    domain::{TaskDomainError, TaskId},
    ports::TaskRepositoryError,
};
use thiserror::Error;

/// Errors returned by task services.
///
/// A transition refused by its guard is not an error; it is reported as a
/// rejected [`TransitionOutcome`](super::TransitionOutcome).
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// The task does not exist or has no recorded state.
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

/// Result type for task service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;
