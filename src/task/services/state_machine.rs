//! Guarded lifecycle transitions.

use super::{ReadinessEvaluator, TaskLifecycleResult};
use crate::task::{
    domain::{TaskId, TaskState},
    ports::{AppendOutcome, TaskRepository},
};
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;

/// Result of a transition request that could be processed.
///
/// `accepted == false` means the request was refused by policy; `state` then
/// holds the task's state as observed while deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    /// Task state after the request.
    pub state: TaskState,
    /// Whether a new state event was appended.
    pub accepted: bool,
}

impl TransitionOutcome {
    /// Outcome of an appended transition into `state`.
    #[must_use]
    pub const fn accepted(state: TaskState) -> Self {
        Self {
            state,
            accepted: true,
        }
    }

    /// Outcome of a refused transition; the task remains in `state`.
    #[must_use]
    pub const fn rejected(state: TaskState) -> Self {
        Self {
            state,
            accepted: false,
        }
    }
}

/// Validates and performs task state transitions.
///
/// | From      | To        | Guard                 |
/// |-----------|-----------|-----------------------|
/// | `waiting` | `running` | the task is ready     |
/// | `running` | `waiting` | none                  |
/// | `waiting` | `done`    | none                  |
/// | `running` | `done`    | none                  |
///
/// Any other pair, including requesting the current state again, is
/// rejected.
pub struct StateMachine<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    readiness: ReadinessEvaluator<R>,
    clock: Arc<C>,
}

impl<R, C> StateMachine<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a state machine writing through `repository`.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        let readiness = ReadinessEvaluator::new(Arc::clone(&repository));
        Self {
            repository,
            readiness,
            clock,
        }
    }

    /// Requests that the task move to `target`.
    ///
    /// The guard is evaluated against the current state, then the new event
    /// is appended only if that state is still current. A concurrent
    /// transition that won the race turns this request into a rejection.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskLifecycleError::NotFound`] when the task does not
    /// exist and [`super::TaskLifecycleError::Repository`] when storage
    /// fails. Guard failures are never errors.
    pub async fn transition(
        &self,
        task_id: TaskId,
        target: TaskState,
    ) -> TaskLifecycleResult<TransitionOutcome> {
        let current = self.readiness.current_state(task_id).await?;
        if !self.guard_allows(task_id, current, target).await? {
            tracing::debug!(%task_id, from = %current, to = %target, "transition rejected");
            return Ok(TransitionOutcome::rejected(current));
        }

        let appended = self
            .repository
            .append_state_if_current(task_id, current, target, self.clock.utc())
            .await?;
        match appended {
            AppendOutcome::Appended(event) => {
                tracing::info!(
                    %task_id,
                    from = %current,
                    to = %target,
                    sequence = %event.sequence(),
                    "task transitioned"
                );
                Ok(TransitionOutcome::accepted(event.state()))
            }
            AppendOutcome::Stale { current: observed } => {
                tracing::warn!(
                    %task_id,
                    expected = %current,
                    found = %observed,
                    to = %target,
                    "transition lost to a concurrent update"
                );
                Ok(TransitionOutcome::rejected(observed))
            }
        }
    }

    async fn guard_allows(
        &self,
        task_id: TaskId,
        current: TaskState,
        target: TaskState,
    ) -> TaskLifecycleResult<bool> {
        if !current.can_transition_to(target) {
            return Ok(false);
        }
        if target == TaskState::Running {
            return self.readiness.is_ready_in(task_id, current).await;
        }
        Ok(true)
    }
}

impl<R, C> Clone for StateMachine<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.repository), Arc::clone(&self.clock))
    }
}
