//! Dependency edges and state events recorded alongside tasks.

use super::{EdgeId, EventSequence, StateEventId, Task, TaskId, TaskState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Directed "`task_id` depends on `parent_id`" relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    id: EdgeId,
    task_id: TaskId,
    parent_id: TaskId,
}

impl DependencyEdge {
    /// Creates a new edge with a fresh identifier.
    #[must_use]
    pub fn new(task_id: TaskId, parent_id: TaskId) -> Self {
        Self::from_parts(EdgeId::new(), task_id, parent_id)
    }

    /// Reconstructs an edge from persisted parts.
    #[must_use]
    pub const fn from_parts(id: EdgeId, task_id: TaskId, parent_id: TaskId) -> Self {
        Self {
            id,
            task_id,
            parent_id,
        }
    }

    /// Returns the edge identifier.
    #[must_use]
    pub const fn id(&self) -> EdgeId {
        self.id
    }

    /// Returns the dependent task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the task depended upon.
    #[must_use]
    pub const fn parent_id(&self) -> TaskId {
        self.parent_id
    }
}

/// One immutable record of a task entering a lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEvent {
    id: StateEventId,
    task_id: TaskId,
    state: TaskState,
    sequence: EventSequence,
    created_at: DateTime<Utc>,
}

impl StateEvent {
    /// Creates a new event with a fresh identifier.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        state: TaskState,
        sequence: EventSequence,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::from_parts(StateEventId::new(), task_id, state, sequence, created_at)
    }

    /// Creates the `waiting` event every task starts with.
    #[must_use]
    pub fn initial(task_id: TaskId, created_at: DateTime<Utc>) -> Self {
        Self::new(task_id, TaskState::Waiting, EventSequence::FIRST, created_at)
    }

    /// Reconstructs an event from persisted parts.
    #[must_use]
    pub const fn from_parts(
        id: StateEventId,
        task_id: TaskId,
        state: TaskState,
        sequence: EventSequence,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_id,
            state,
            sequence,
            created_at,
        }
    }

    /// Returns the event identifier.
    #[must_use]
    pub const fn id(&self) -> StateEventId {
        self.id
    }

    /// Returns the task this event belongs to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the state entered.
    #[must_use]
    pub const fn state(&self) -> TaskState {
        self.state
    }

    /// Returns the position of this event in the task's log.
    #[must_use]
    pub const fn sequence(&self) -> EventSequence {
        self.sequence
    }

    /// Returns when the state was entered.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Everything written atomically when a task is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskRecord {
    task: Task,
    edges: Vec<DependencyEdge>,
    initial_state: StateEvent,
}

impl NewTaskRecord {
    /// Bundles a task with one edge per distinct parent and its initial
    /// `waiting` event.
    ///
    /// Repeated parent identifiers collapse into a single edge; order of
    /// first appearance is kept.
    #[must_use]
    pub fn new(task: Task, parent_ids: impl IntoIterator<Item = TaskId>) -> Self {
        let mut edges: Vec<DependencyEdge> = Vec::new();
        for parent_id in parent_ids {
            if edges.iter().all(|edge| edge.parent_id() != parent_id) {
                edges.push(DependencyEdge::new(task.id(), parent_id));
            }
        }
        let initial_state = StateEvent::initial(task.id(), task.created_at());
        Self {
            task,
            edges,
            initial_state,
        }
    }

    /// Returns the task to insert.
    #[must_use]
    pub const fn task(&self) -> &Task {
        &self.task
    }

    /// Returns the dependency edges to insert.
    #[must_use]
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Returns the initial `waiting` event.
    #[must_use]
    pub const fn initial_state(&self) -> &StateEvent {
        &self.initial_state
    }

    /// Consumes the record, returning the created task.
    #[must_use]
    pub fn into_task(self) -> Task {
        self.task
    }
}
