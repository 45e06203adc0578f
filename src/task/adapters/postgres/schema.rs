//! Diesel schema for task persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Storage-assigned task identifier.
        id -> Uuid,
        /// Task title as supplied by the client.
        title -> Text,
        /// Activation date stored as midnight UTC.
        active_at -> Timestamptz,
        /// Task lifecycle status.
        #[max_length = 16]
        status -> Varchar,
    }
}
