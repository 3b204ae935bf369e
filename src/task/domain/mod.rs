//! Domain model for task dependencies and lifecycle state.
//!
//! Tasks are immutable records; their lifecycle is an append-only log of
//! [`StateEvent`]s and their dependencies are [`DependencyEdge`]s written once
//! at creation time. Infrastructure concerns stay outside this module.

mod error;
mod event;
mod ids;
mod running_time;
mod state;
mod task;

pub use error::{ParseTaskStateError, TaskDomainError};
pub use event::{DependencyEdge, NewTaskRecord, StateEvent};
pub use ids::{EdgeId, EventSequence, OwnerId, StateEventId, TaskId, TaskName};
pub use running_time::total_running_seconds;
pub use state::TaskState;
pub use task::{PersistedTaskData, Task};
