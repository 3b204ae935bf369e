//! Readiness of waiting tasks.

use super::{DependencyResolver, TaskLifecycleError, TaskLifecycleResult};
use crate::task::{
    domain::{TaskId, TaskState},
    ports::TaskRepository,
};
use std::sync::Arc;

/// Decides whether a `waiting` task may start running.
///
/// A task is ready when it is `waiting` and each direct parent is `done`.
/// Ancestors further up are not inspected.
pub struct ReadinessEvaluator<R>
where
    R: TaskRepository,
{
    repository: Arc<R>,
    resolver: DependencyResolver<R>,
}

impl<R> ReadinessEvaluator<R>
where
    R: TaskRepository,
{
    /// Creates an evaluator reading from `repository`.
    #[must_use]
    pub fn new(repository: Arc<R>) -> Self {
        let resolver = DependencyResolver::new(Arc::clone(&repository));
        Self {
            repository,
            resolver,
        }
    }

    /// Returns the state of the task's most recent state event.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task has no recorded
    /// state and [`TaskLifecycleError::Repository`] when the read fails.
    pub async fn current_state(&self, task_id: TaskId) -> TaskLifecycleResult<TaskState> {
        self.repository
            .latest_state(task_id)
            .await?
            .map(|event| event.state())
            .ok_or(TaskLifecycleError::NotFound(task_id))
    }

    /// Returns whether the task is `waiting` with every parent `done`.
    ///
    /// Tasks without parents are ready whenever they are `waiting`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task has no recorded
    /// state and [`TaskLifecycleError::Repository`] when a read fails.
    pub async fn is_ready(&self, task_id: TaskId) -> TaskLifecycleResult<bool> {
        let current = self.current_state(task_id).await?;
        self.is_ready_in(task_id, current).await
    }

    /// Evaluates readiness for a task whose current state is already known.
    pub(crate) async fn is_ready_in(
        &self,
        task_id: TaskId,
        current: TaskState,
    ) -> TaskLifecycleResult<bool> {
        if current != TaskState::Waiting {
            return Ok(false);
        }

        for parent in self.resolver.parents_of(task_id).await? {
            let parent_state = self
                .repository
                .latest_state(parent.id())
                .await?
                .map(|event| event.state());
            if parent_state != Some(TaskState::Done) {
                tracing::debug!(%task_id, parent_id = %parent.id(), "task blocked by parent");
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<R> Clone for ReadinessEvaluator<R>
where
    R: TaskRepository,
{
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.repository))
    }
}
