//! `PostgreSQL` repository implementation for task storage.

use super::{
    TASK_SCHEMA_SQL,
    models::{NewDependencyEdgeRow, NewTaskRow, StateEventRow, TaskRow},
    schema::{dependency_edges, state_events, tasks},
};
use crate::task::{
    domain::{
        EventSequence, NewTaskRecord, OwnerId, PersistedTaskData, StateEvent, StateEventId, Task,
        TaskId, TaskName, TaskState,
    },
    ports::{AppendOutcome, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
///
/// Conditional appends lock the task row with `SELECT ... FOR UPDATE`
/// before reading the latest event, so transitions on one task serialise
/// across connections and processes.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

/// Creates the task tables if they do not exist yet.
///
/// # Errors
///
/// Returns [`TaskRepositoryError::Persistence`] when the DDL fails.
pub fn apply_schema(connection: &mut PgConnection) -> TaskRepositoryResult<()> {
    connection
        .batch_execute(TASK_SCHEMA_SQL)
        .map_err(TaskRepositoryError::persistence)
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn create(&self, record: &NewTaskRecord) -> TaskRepositoryResult<()> {
        let task_id = record.task().id();
        let task_row = to_new_task_row(record.task());
        let edge_rows: Vec<NewDependencyEdgeRow> = record
            .edges()
            .iter()
            .map(|edge| NewDependencyEdgeRow {
                id: edge.id().into_inner(),
                task_id: edge.task_id().into_inner(),
                parent_id: edge.parent_id().into_inner(),
            })
            .collect();
        let event_row = to_event_row(record.initial_state())?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let parent_ids: Vec<Uuid> = edge_rows.iter().map(|row| row.parent_id).collect();
                if let Some(missing) = find_missing_task(tx, &parent_ids)? {
                    return Err(TaskRepositoryError::UnknownParent(TaskId::from_uuid(missing)));
                }

                diesel::insert_into(tasks::table)
                    .values(&task_row)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            TaskRepositoryError::DuplicateTask(task_id)
                        }
                        _ => TaskRepositoryError::persistence(err),
                    })?;
                if !edge_rows.is_empty() {
                    diesel::insert_into(dependency_edges::table)
                        .values(&edge_rows)
                        .execute(tx)?;
                }
                diesel::insert_into(state_events::table)
                    .values(&event_row)
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_by_owner(&self, owner: &OwnerId) -> TaskRepositoryResult<Vec<Task>> {
        let owner_id = owner.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::owner_id.eq(owner_id))
                .order((tasks::created_at.desc(), tasks::id.desc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn find_parents(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .inner_join(dependency_edges::table.on(dependency_edges::parent_id.eq(tasks::id)))
                .filter(dependency_edges::task_id.eq(id.into_inner()))
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn find_children(&self, id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .inner_join(dependency_edges::table.on(dependency_edges::task_id.eq(tasks::id)))
                .filter(dependency_edges::parent_id.eq(id.into_inner()))
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn latest_state(&self, id: TaskId) -> TaskRepositoryResult<Option<StateEvent>> {
        self.run_blocking(move |connection| {
            find_latest_event(connection, id.into_inner())?
                .map(row_to_event)
                .transpose()
        })
        .await
    }

    async fn state_history(&self, id: TaskId) -> TaskRepositoryResult<Vec<StateEvent>> {
        self.run_blocking(move |connection| {
            let rows = state_events::table
                .filter(state_events::task_id.eq(id.into_inner()))
                .order(state_events::sequence.asc())
                .select(StateEventRow::as_select())
                .load::<StateEventRow>(connection)?;
            rows.into_iter().map(row_to_event).collect()
        })
        .await
    }

    async fn append_state_if_current(
        &self,
        id: TaskId,
        expected: TaskState,
        next: TaskState,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<AppendOutcome> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let locked: Vec<Uuid> = tasks::table
                    .filter(tasks::id.eq(id.into_inner()))
                    .select(tasks::id)
                    .for_update()
                    .load::<Uuid>(tx)?;
                if locked.is_empty() {
                    return Err(TaskRepositoryError::NotFound(id));
                }

                let latest = find_latest_event(tx, id.into_inner())?
                    .map(row_to_event)
                    .transpose()?
                    .ok_or(TaskRepositoryError::NotFound(id))?;
                if latest.state() != expected {
                    return Ok(AppendOutcome::Stale {
                        current: latest.state(),
                    });
                }

                let event = StateEvent::new(id, next, latest.sequence().next(), at);
                diesel::insert_into(state_events::table)
                    .values(&to_event_row(&event)?)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            TaskRepositoryError::SequenceConflict {
                                task_id: id,
                                sequence: event.sequence(),
                            }
                        }
                        _ => TaskRepositoryError::persistence(err),
                    })?;
                Ok(AppendOutcome::Appended(event))
            })
        })
        .await
    }
}

fn to_new_task_row(task: &Task) -> NewTaskRow {
    NewTaskRow {
        id: task.id().into_inner(),
        name: task.name().as_str().to_owned(),
        owner_id: task.owner().as_str().to_owned(),
        description: task.description().to_owned(),
        related_url: task.related_url().map(str::to_owned),
        created_at: task.created_at(),
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        name,
        owner_id,
        description,
        related_url,
        created_at,
    } = row;

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        name: TaskName::new(name).map_err(TaskRepositoryError::persistence)?,
        owner: OwnerId::new(owner_id).map_err(TaskRepositoryError::persistence)?,
        description,
        related_url,
        created_at,
    };
    Ok(Task::from_persisted(data))
}

fn to_event_row(event: &StateEvent) -> TaskRepositoryResult<StateEventRow> {
    let sequence =
        i64::try_from(event.sequence().value()).map_err(TaskRepositoryError::persistence)?;
    Ok(StateEventRow {
        id: event.id().into_inner(),
        task_id: event.task_id().into_inner(),
        state: event.state().as_str().to_owned(),
        sequence,
        created_at: event.created_at(),
    })
}

fn row_to_event(row: StateEventRow) -> TaskRepositoryResult<StateEvent> {
    let state = TaskState::try_from(row.state.as_str()).map_err(TaskRepositoryError::persistence)?;
    let sequence = u64::try_from(row.sequence).map_err(TaskRepositoryError::persistence)?;
    Ok(StateEvent::from_parts(
        StateEventId::from_uuid(row.id),
        TaskId::from_uuid(row.task_id),
        state,
        EventSequence::new(sequence),
        row.created_at,
    ))
}

fn find_latest_event(
    connection: &mut PgConnection,
    task_id: Uuid,
) -> TaskRepositoryResult<Option<StateEventRow>> {
    state_events::table
        .filter(state_events::task_id.eq(task_id))
        .order(state_events::sequence.desc())
        .select(StateEventRow::as_select())
        .first::<StateEventRow>(connection)
        .optional()
        .map_err(TaskRepositoryError::persistence)
}

/// Returns the first of `ids` with no matching task row.
fn find_missing_task(
    connection: &mut PgConnection,
    ids: &[Uuid],
) -> TaskRepositoryResult<Option<Uuid>> {
    if ids.is_empty() {
        return Ok(None);
    }
    let existing: Vec<Uuid> = tasks::table
        .filter(tasks::id.eq_any(ids))
        .select(tasks::id)
        .load::<Uuid>(connection)?;
    Ok(ids.iter().find(|id| !existing.contains(id)).copied())
}
