pub mod repository;
pub mod sqlite;
pub mod store;

pub use repository::*;
pub use sqlite::*;
pub use store::Store;

/// Failures below the domain layer: SQLite, JSON (de)serialization of
/// stored documents, and schema setup.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored document is not valid JSON for {key}: {source}")]
    Corrupted {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize document for {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown {field} value: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Schema migration {version} failed: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Database lock poisoned")]
    LockPoisoned,
}
