//! Persistence adapter for the three DayFlow records.
//!
//! # Responsibility
//! - Serialize tasks, settings and daily notes to JSON under fixed keys.
//! - Decode with fallback: absent or malformed records become defaults.
//!
//! # Invariants
//! - No error escapes this layer. Saves report `bool`, loads always return
//!   a value.
//! - The adapter keeps no copy of the records it writes.

use crate::model::note::DailyNotes;
use crate::model::settings::AppSettings;
use crate::model::task::Task;
use crate::repo::kv_repo::KeyValueStore;
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const TASKS_KEY: &str = "dayflow_tasks";
pub const SETTINGS_KEY: &str = "dayflow_settings";
pub const NOTES_KEY: &str = "dayflow_daily_notes";

/// Write-through mirror over a key-value store.
pub struct PersistenceAdapter<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> PersistenceAdapter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn save_tasks(&mut self, tasks: &[Task]) -> bool {
        self.save(TASKS_KEY, tasks)
    }

    pub fn save_settings(&mut self, settings: &AppSettings) -> bool {
        self.save(SETTINGS_KEY, settings)
    }

    pub fn save_notes(&mut self, notes: &DailyNotes) -> bool {
        self.save(NOTES_KEY, notes)
    }

    /// Loads the task list, repairing records that break the confirmation
    /// invariant.
    pub fn load_tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.load_or_default(TASKS_KEY);
        let repaired = tasks
            .iter_mut()
            .map(Task::repair_confirmation)
            .filter(|changed| *changed)
            .count();
        if repaired > 0 {
            warn!("event=record_repair module=persistence status=ok key={TASKS_KEY} repaired={repaired}");
        }
        tasks
    }

    pub fn load_settings(&self) -> AppSettings {
        self.load_or_default(SETTINGS_KEY)
    }

    pub fn load_notes(&self) -> DailyNotes {
        self.load_or_default(NOTES_KEY)
    }

    fn save<T: Serialize + ?Sized>(&mut self, key: &str, record: &T) -> bool {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(err) => {
                error!(
                    "event=record_save module=persistence status=error key={key} error_code=serialize_failed error={err}"
                );
                return false;
            }
        };

        match self.store.set(key, &json) {
            Ok(()) => true,
            Err(err) => {
                error!(
                    "event=record_save module=persistence status=error key={key} error_code={} bytes={}",
                    err.code(),
                    json.len()
                );
                false
            }
        }
    }

    fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(err) => {
                warn!(
                    "event=record_load module=persistence status=fallback key={key} error_code={} error={err}",
                    err.code()
                );
                return T::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(
                "event=record_load module=persistence status=fallback key={key} error_code=malformed_record line={} column={}",
                err.line(),
                err.column()
            );
            T::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{PersistenceAdapter, NOTES_KEY, SETTINGS_KEY, TASKS_KEY};
    use crate::model::date::DateKey;
    use crate::model::settings::AppSettings;
    use crate::model::task::Task;
    use crate::repo::kv_repo::{KeyValueStore, MemoryKvStore};

    #[test]
    fn absent_records_load_as_defaults() {
        let adapter = PersistenceAdapter::new(MemoryKvStore::new());
        assert!(adapter.load_tasks().is_empty());
        assert!(adapter.load_notes().is_empty());
        assert_eq!(adapter.load_settings(), AppSettings::default());
    }

    #[test]
    fn malformed_records_load_as_defaults() {
        let mut kv = MemoryKvStore::new();
        kv.set(TASKS_KEY, "{not json").unwrap();
        kv.set(SETTINGS_KEY, "[1,2,3]").unwrap();
        kv.set(NOTES_KEY, r#"{"yesterday":"bad key"}"#).unwrap();
        let adapter = PersistenceAdapter::new(kv);
        assert!(adapter.load_tasks().is_empty());
        assert_eq!(adapter.load_settings(), AppSettings::default());
        assert!(adapter.load_notes().is_empty());
    }

    #[test]
    fn quota_failure_reports_false() {
        let mut adapter = PersistenceAdapter::new(MemoryKvStore::with_quota(16));
        let task = Task::new(DateKey::parse("2024-06-01").unwrap(), false, "Buy milk").unwrap();
        assert!(!adapter.save_tasks(&[task]));
        assert!(adapter.save_tasks(&[]));
    }

    #[test]
    fn load_repairs_unconfirmed_same_day_records() {
        let mut kv = MemoryKvStore::new();
        kv.set(
            TASKS_KEY,
            r#"[{"id":"x1","text":"Walk","completed":false,"memo":"","date":"2024-06-01","isFuturePlan":false,"isConfirmed":false}]"#,
        )
        .unwrap();
        let adapter = PersistenceAdapter::new(kv);
        let tasks = adapter.load_tasks();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].is_confirmed);
    }
}
