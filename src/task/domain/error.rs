//! Error types for task domain validation and parsing.

use super::{EventSequence, TaskId};
use thiserror::Error;

/// Errors returned while constructing or interpreting domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// The owner identifier is empty after trimming.
    #[error("owner identifier must not be empty")]
    EmptyOwnerId,

    /// A state history goes backwards in time along its sequence.
    #[error("state history of task {task_id} is out of order at sequence {sequence}")]
    UnorderedHistory {
        /// Task whose history was replayed.
        task_id: TaskId,
        /// First event whose timestamp precedes its predecessor's.
        sequence: EventSequence,
    },
}

/// Error returned while parsing task states from persistence or requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task state: {0}")]
pub struct ParseTaskStateError(pub String);
