//! Direct parent and child lookup over the dependency edges.

use super::TaskLifecycleResult;
use crate::task::{
    domain::{Task, TaskId},
    ports::TaskRepository,
};
use std::sync::Arc;

/// Resolves the tasks directly linked to a task by dependency edges.
///
/// Lookups are plain reads and may be repeated or run concurrently.
pub struct DependencyResolver<R>
where
    R: TaskRepository,
{
    repository: Arc<R>,
}

impl<R> DependencyResolver<R>
where
    R: TaskRepository,
{
    /// Creates a resolver reading from `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Returns the tasks `task_id` depends on, empty when it has none.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskLifecycleError::Repository`] when the read fails.
    pub async fn parents_of(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.repository.find_parents(task_id).await?)
    }

    /// Returns the tasks depending on `task_id`, empty when it has none.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskLifecycleError::Repository`] when the read fails.
    pub async fn children_of(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.repository.find_children(task_id).await?)
    }
}

impl<R> Clone for DependencyResolver<R>
where
    R: TaskRepository,
{
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.repository))
    }
}
