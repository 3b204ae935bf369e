//! Cumulative running time per task.

use super::{TaskLifecycleError, TaskLifecycleResult};
use crate::task::{
    domain::{TaskId, total_running_seconds},
    ports::TaskRepository,
};
use mockable::Clock;
use std::sync::Arc;

/// Replays a task's state history into the seconds it spent `running`.
///
/// A task that is `running` right now has its open interval counted up to
/// the clock's current time, so repeated calls can grow.
pub struct RunningTimeAggregator<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> RunningTimeAggregator<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates an aggregator reading from `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Returns the total whole seconds the task has spent `running`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task does not exist,
    /// [`TaskLifecycleError::Domain`] when its history is out of order, and
    /// [`TaskLifecycleError::Repository`] when a read fails.
    pub async fn total_running_seconds(&self, task_id: TaskId) -> TaskLifecycleResult<i64> {
        if self.repository.find_by_id(task_id).await?.is_none() {
            return Err(TaskLifecycleError::NotFound(task_id));
        }
        let history = self.repository.state_history(task_id).await?;
        Ok(total_running_seconds(task_id, &history, self.clock.utc())?)
    }
}

impl<R, C> Clone for RunningTimeAggregator<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.repository), Arc::clone(&self.clock))
    }
}
