//! Core domain logic for DayFlow.
//! This crate is the single source of truth for task, note and ritual
//! invariants; the FFI and CLI crates only translate calls into it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod provider;
pub mod repo;
pub mod service;

pub use config::{ConfigError, DayflowConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::date::{DateError, DateKey, MonthKey};
pub use model::note::{DailyNotes, NoteError, NOTE_MAX_CHARS};
pub use model::settings::{AlertTime, AppSettings, SettingsError};
pub use model::task::{Task, TaskId};
pub use provider::text_generator_from_config;
pub use repo::kv_repo::{
    KeyValueStore, MemoryKvStore, OwnedSqliteKvStore, SqliteKvStore, StoreError, StoreResult,
};
pub use repo::persistence::PersistenceAdapter;
pub use service::briefing::{GenerationError, RoutineKind, TextGenerator};
pub use service::eviction::EvictionOutcome;
pub use service::routine::{RoutineTrigger, TriggerOutcome};
pub use service::task_store::{DayflowStore, SaveStatus, StoreEviction};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
