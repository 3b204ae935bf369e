//! Replay of a state event log into cumulative running time.

use super::{StateEvent, TaskDomainError, TaskId, TaskState};
use chrono::{DateTime, Utc};

/// Sums the whole seconds a task spent `running` according to `history`.
///
/// `history` must be ordered by event sequence. A `running` event opens an
/// interval; a later `running` event without an intervening close moves the
/// start forward. Any other event closes the open interval. An interval still
/// open at the end of the log is counted up to `now`.
///
/// Each interval is truncated to whole seconds before summing.
///
/// # Errors
///
/// Returns [`TaskDomainError::UnorderedHistory`] when an event's timestamp
/// precedes the timestamp of the event before it.
pub fn total_running_seconds(
    task_id: TaskId,
    history: &[StateEvent],
    now: DateTime<Utc>,
) -> Result<i64, TaskDomainError> {
    let mut total: i64 = 0;
    let mut open_since: Option<DateTime<Utc>> = None;
    let mut previous: Option<DateTime<Utc>> = None;

    for event in history {
        let at = event.created_at();
        if previous.is_some_and(|prior| at < prior) {
            return Err(TaskDomainError::UnorderedHistory {
                task_id,
                sequence: event.sequence(),
            });
        }
        previous = Some(at);

        match (event.state(), open_since) {
            (TaskState::Running, _) => open_since = Some(at),
            (_, Some(start)) => {
                total = total.saturating_add((at - start).num_seconds());
                open_since = None;
            }
            (_, None) => {}
        }
    }

    if let Some(start) = open_since {
        // A clock running behind the last event contributes nothing.
        total = total.saturating_add((now - start).num_seconds().max(0));
    }

    Ok(total)
}
