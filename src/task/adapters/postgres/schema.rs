//! Diesel schema for task dependency and lifecycle persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Task name.
        name -> Text,
        /// Owning user identifier.
        owner_id -> Text,
        /// Free-text description.
        description -> Text,
        /// Optional related URL.
        related_url -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// "`task_id` depends on `parent_id`" edges.
    dependency_edges (id) {
        /// Edge identifier.
        id -> Uuid,
        /// Dependent task.
        task_id -> Uuid,
        /// Task depended upon.
        parent_id -> Uuid,
    }
}

diesel::table! {
    /// Append-only task state log.
    state_events (id) {
        /// Event identifier.
        id -> Uuid,
        /// Task the event belongs to.
        task_id -> Uuid,
        /// State entered.
        #[max_length = 16]
        state -> Varchar,
        /// Per-task position in the log.
        sequence -> Int8,
        /// When the state was entered.
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(tasks, dependency_edges, state_events);
