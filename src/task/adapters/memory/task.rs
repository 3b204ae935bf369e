//! In-memory repository for task dependency and lifecycle tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::task::{
    domain::{DependencyEdge, NewTaskRecord, OwnerId, StateEvent, Task, TaskId, TaskState},
    ports::{AppendOutcome, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// A single lock guards tasks, edges, and events, so a conditional append
/// observes and extends a task's log without interleaving.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    edges: Vec<DependencyEdge>,
    events: HashMap<TaskId, Vec<StateEvent>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a crafted event, bypassing transition checks.
    ///
    /// Lets unit tests build histories with fixed timestamps. The event must
    /// take the next position in the task's log.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// and [`TaskRepositoryError::SequenceConflict`] when the event's
    /// sequence is not the next one.
    #[cfg(test)]
    pub(crate) fn insert_event(&self, event: StateEvent) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let task_id = event.task_id();
        let Some(latest) = latest_event(&state, task_id) else {
            return Err(TaskRepositoryError::NotFound(task_id));
        };
        if event.sequence() != latest.sequence().next() {
            return Err(TaskRepositoryError::SequenceConflict {
                task_id,
                sequence: event.sequence(),
            });
        }
        state.events.entry(task_id).or_default().push(event);
        Ok(())
    }
}

fn poisoned<T>(err: PoisonError<T>) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Resolves task IDs to tasks, oldest first, skipping unknown IDs.
fn collect_tasks(state: &InMemoryTaskState, ids: impl Iterator<Item = TaskId>) -> Vec<Task> {
    let mut tasks: Vec<Task> = ids.filter_map(|id| state.tasks.get(&id).cloned()).collect();
    tasks.sort_by_key(|task| (task.created_at(), task.id()));
    tasks
}

fn latest_event(state: &InMemoryTaskState, id: TaskId) -> Option<StateEvent> {
    state
        .events
        .get(&id)
        .and_then(|events| events.iter().max_by_key(|event| event.sequence()))
        .copied()
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, record: &NewTaskRecord) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let task = record.task();
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        if let Some(missing) = record
            .edges()
            .iter()
            .map(DependencyEdge::parent_id)
            .find(|parent_id| !state.tasks.contains_key(parent_id))
        {
            return Err(TaskRepositoryError::UnknownParent(missing));
        }

        state.tasks.insert(task.id(), task.clone());
        state.edges.extend_from_slice(record.edges());
        state
            .events
            .insert(task.id(), vec![*record.initial_state()]);
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner: &OwnerId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| task.is_owned_by(owner))
            .cloned()
            .collect();
        tasks.sort_by_key(|task| std::cmp::Reverse((task.created_at(), task.id())));
        Ok(tasks)
    }

    async fn find_parents(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        let parent_ids = state
            .edges
            .iter()
            .filter(|edge| edge.task_id() == id)
            .map(DependencyEdge::parent_id);
        Ok(collect_tasks(&state, parent_ids))
    }

    async fn find_children(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        let child_ids = state
            .edges
            .iter()
            .filter(|edge| edge.parent_id() == id)
            .map(DependencyEdge::task_id);
        Ok(collect_tasks(&state, child_ids))
    }

    async fn latest_state(&self, id: TaskId) -> TaskRepositoryResult<Option<StateEvent>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(latest_event(&state, id))
    }

    async fn state_history(&self, id: TaskId) -> TaskRepositoryResult<Vec<StateEvent>> {
        let state = self.state.read().map_err(poisoned)?;
        let mut history = state.events.get(&id).cloned().unwrap_or_default();
        history.sort_by_key(StateEvent::sequence);
        Ok(history)
    }

    async fn append_state_if_current(
        &self,
        id: TaskId,
        expected: TaskState,
        next: TaskState,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<AppendOutcome> {
        let mut state = self.state.write().map_err(poisoned)?;
        if !state.tasks.contains_key(&id) {
            return Err(TaskRepositoryError::NotFound(id));
        }
        let Some(latest) = latest_event(&state, id) else {
            return Err(TaskRepositoryError::NotFound(id));
        };
        if latest.state() != expected {
            return Ok(AppendOutcome::Stale {
                current: latest.state(),
            });
        }

        let event = StateEvent::new(id, next, latest.sequence().next(), at);
        state.events.entry(id).or_default().push(event);
        Ok(AppendOutcome::Appended(event))
    }
}
