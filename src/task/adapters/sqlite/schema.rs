//! Diesel schema for task, alias and session persistence.

diesel::table! {
    /// Durable task records.
    tasks (task_id) {
        /// Task identifier.
        task_id -> Text,
        /// Creation timestamp (RFC 3339).
        created_at -> Text,
        /// Last update timestamp (RFC 3339).
        updated_at -> Text,
    }
}

diesel::table! {
    /// Aliases resolving to tasks.
    task_aliases (alias_value) {
        /// Globally unique alias string.
        alias_value -> Text,
        /// Owning task.
        task_id -> Text,
        /// `prepr` or `pr`.
        alias_type -> Text,
        /// Normalised repository.
        repo -> Nullable<Text>,
        /// Branch, when known.
        branch -> Nullable<Text>,
        /// Pull request number for `pr` aliases.
        pr_number -> Nullable<BigInt>,
        /// Creation timestamp (RFC 3339).
        created_at -> Text,
        /// Last update timestamp (RFC 3339).
        updated_at -> Text,
    }
}

diesel::table! {
    /// At most one terminal session per task.
    sessions (task_id) {
        /// Owning task.
        task_id -> Text,
        /// Multiplexer workspace.
        workspace -> Text,
        /// Bound pane, `0` when unbound.
        pane_id -> BigInt,
        /// Working directory.
        cwd -> Text,
        /// Command label.
        command -> Text,
        /// `open`, `closed` or `unknown`.
        status -> Text,
        /// Label of the program session inside the pane.
        external_session_label -> Text,
        /// Last time the pane was observed live (RFC 3339).
        last_seen_at -> Text,
        /// Creation timestamp (RFC 3339).
        created_at -> Text,
        /// Last update timestamp (RFC 3339).
        updated_at -> Text,
    }
}

diesel::joinable!(task_aliases -> tasks (task_id));
diesel::joinable!(sessions -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, task_aliases, sessions);
