//! Task aggregate and its creation parameters.

use super::{OwnerId, TaskId, TaskName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A unit of trackable work owned by a user.
///
/// Tasks are immutable once created; lifecycle progress lives in the state
/// event log, not on the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: TaskName,
    owner: OwnerId,
    description: String,
    related_url: Option<String>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted task name.
    pub name: TaskName,
    /// Persisted owner identifier.
    pub owner: OwnerId,
    /// Persisted free-text description.
    pub description: String,
    /// Persisted related URL, if any.
    pub related_url: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task with a fresh identifier.
    ///
    /// A blank `related_url` is stored as absent.
    #[must_use]
    pub fn new(
        owner: OwnerId,
        name: TaskName,
        description: impl Into<String>,
        related_url: Option<String>,
        clock: &impl Clock,
    ) -> Self {
        let related_url = related_url
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty());
        Self {
            id: TaskId::new(),
            name,
            owner,
            description: description.into(),
            related_url,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            owner: data.owner,
            description: data.description,
            related_url: data.related_url,
            created_at: data.created_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Returns the free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the related URL, if any.
    #[must_use]
    pub fn related_url(&self) -> Option<&str> {
        self.related_url.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns whether `owner` owns this task.
    #[must_use]
    pub fn is_owned_by(&self, owner: &OwnerId) -> bool {
        self.owner == *owner
    }
}
