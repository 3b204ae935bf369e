//! Task lifecycle facade used by the request-handling layer.

use super::{
    DependencyResolver, ReadinessEvaluator, RunningTimeAggregator, StateMachine,
    TaskLifecycleError, TaskLifecycleResult, TransitionOutcome,
};
use crate::task::{
    domain::{NewTaskRecord, OwnerId, StateEvent, Task, TaskId, TaskName, TaskState},
    ports::TaskRepository,
};
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    owner: String,
    name: String,
    description: String,
    related_url: Option<String>,
    parent_ids: Vec<TaskId>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            description: String::new(),
            related_url: None,
            parent_ids: Vec::new(),
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the related URL.
    #[must_use]
    pub fn with_related_url(mut self, related_url: impl Into<String>) -> Self {
        self.related_url = Some(related_url.into());
        self
    }

    /// Sets the tasks the new task depends on.
    #[must_use]
    pub fn with_parents(mut self, parent_ids: impl IntoIterator<Item = TaskId>) -> Self {
        self.parent_ids = parent_ids.into_iter().collect();
        self
    }
}

/// A task annotated with its lifecycle position, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    /// The task itself.
    pub task: Task,
    /// Current lifecycle state.
    pub state: TaskState,
    /// Whether the task may start running now.
    pub ready: bool,
}

/// Task lifecycle orchestration service.
///
/// Composes the dependency resolver, readiness evaluator, state machine, and
/// running-time aggregator over one repository and clock.
#[derive(Clone)]
pub struct TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    resolver: DependencyResolver<R>,
    readiness: ReadinessEvaluator<R>,
    state_machine: StateMachine<R, C>,
    running_time: RunningTimeAggregator<R, C>,
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            resolver: DependencyResolver::new(Arc::clone(&repository)),
            readiness: ReadinessEvaluator::new(Arc::clone(&repository)),
            state_machine: StateMachine::new(Arc::clone(&repository), Arc::clone(&clock)),
            running_time: RunningTimeAggregator::new(Arc::clone(&repository), Arc::clone(&clock)),
            repository,
            clock,
        }
    }

    /// Creates a task in the `waiting` state with one dependency edge per
    /// distinct parent, all in one atomic write.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] when the owner or name is blank
    /// and [`TaskLifecycleError::Repository`] when a parent does not exist or
    /// the write fails.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        let owner = OwnerId::new(request.owner)?;
        let name = TaskName::new(request.name)?;
        let task = Task::new(
            owner,
            name,
            request.description,
            request.related_url,
            &*self.clock,
        );
        let record = NewTaskRecord::new(task, request.parent_ids);
        self.repository.create(&record).await?;

        tracing::info!(
            task_id = %record.task().id(),
            owner = %record.task().owner(),
            parents = record.edges().len(),
            "task created"
        );
        Ok(record.into_task())
    }

    /// Retrieves a task by identifier.
    ///
    /// Returns `Ok(None)` when the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn get_task(&self, task_id: TaskId) -> TaskLifecycleResult<Option<Task>> {
        Ok(self.repository.find_by_id(task_id).await?)
    }

    /// Lists the tasks owned by `owner`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn tasks_for_owner(&self, owner: &OwnerId) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.repository.find_by_owner(owner).await?)
    }

    /// Lists the tasks `task_id` depends on, with state and readiness.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task does not exist
    /// and [`TaskLifecycleError::Repository`] when a read fails.
    pub async fn parents(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<TaskView>> {
        self.require_task(task_id).await?;
        let parents = self.resolver.parents_of(task_id).await?;
        self.annotate(parents).await
    }

    /// Lists the tasks depending on `task_id`, with state and readiness.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task does not exist
    /// and [`TaskLifecycleError::Repository`] when a read fails.
    pub async fn children(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<TaskView>> {
        self.require_task(task_id).await?;
        let children = self.resolver.children_of(task_id).await?;
        self.annotate(children).await
    }

    /// Requests that the task move to `target`.
    ///
    /// # Errors
    ///
    /// See [`StateMachine::transition`].
    pub async fn transition(
        &self,
        task_id: TaskId,
        target: TaskState,
    ) -> TaskLifecycleResult<TransitionOutcome> {
        self.state_machine.transition(task_id, target).await
    }

    /// Returns the task's current lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task does not exist
    /// and [`TaskLifecycleError::Repository`] when the read fails.
    pub async fn current_state(&self, task_id: TaskId) -> TaskLifecycleResult<TaskState> {
        self.readiness.current_state(task_id).await
    }

    /// Returns whether the task may start running now.
    ///
    /// # Errors
    ///
    /// See [`ReadinessEvaluator::is_ready`].
    pub async fn is_ready(&self, task_id: TaskId) -> TaskLifecycleResult<bool> {
        self.readiness.is_ready(task_id).await
    }

    /// Returns the total whole seconds the task has spent `running`.
    ///
    /// # Errors
    ///
    /// See [`RunningTimeAggregator::total_running_seconds`].
    pub async fn total_running_seconds(&self, task_id: TaskId) -> TaskLifecycleResult<i64> {
        self.running_time.total_running_seconds(task_id).await
    }

    /// Returns the task's state events in sequence order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task does not exist
    /// and [`TaskLifecycleError::Repository`] when the read fails.
    pub async fn state_history(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<StateEvent>> {
        self.require_task(task_id).await?;
        Ok(self.repository.state_history(task_id).await?)
    }

    async fn require_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))
    }

    async fn annotate(&self, tasks: Vec<Task>) -> TaskLifecycleResult<Vec<TaskView>> {
        let mut views = Vec::with_capacity(tasks.len());
        for task in tasks {
            let state = self.readiness.current_state(task.id()).await?;
            let ready = self.readiness.is_ready_in(task.id(), state).await?;
            views.push(TaskView { task, state, ready });
        }
        Ok(views)
    }
}
