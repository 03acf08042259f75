//! Task store: the single owner of tasks, settings and daily notes.
//!
//! # Responsibility
//! - Expose the mutation surface (add/toggle/delete/memo/confirm, notes,
//!   settings, eviction) over in-memory state.
//! - Write the affected record through the persistence adapter after every
//!   accepted mutation.
//!
//! # Invariants
//! - A failed write never rolls back the in-memory mutation.
//! - Records whose last write failed stay marked unsaved until a later write
//!   of that record succeeds.
//! - New tasks are inserted at the head (most recent first).
//! - `confirm_day` only touches future plans of the given date.

use crate::model::date::DateKey;
use crate::model::note::{validate_note, DailyNotes, NoteError};
use crate::model::settings::AppSettings;
use crate::model::task::{Task, TaskId};
use crate::repo::kv_repo::KeyValueStore;
use crate::repo::persistence::PersistenceAdapter;
use crate::service::eviction::{evict_oldest_month, EvictionOutcome};
use log::{debug, info, warn};

/// Persistence outcome of one mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// State changed and the write succeeded.
    Saved,
    /// State changed in memory but the write failed (quota or store error).
    Failed,
    /// Nothing changed, so nothing was written.
    Unchanged,
}

impl SaveStatus {
    pub fn is_failed(self) -> bool {
        self == Self::Failed
    }
}

/// Eviction result together with the outcome of re-persisting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEviction {
    pub outcome: EvictionOutcome,
    pub save: SaveStatus,
}

#[derive(Debug, Default, Clone, Copy)]
struct UnsavedRecords {
    tasks: bool,
    settings: bool,
    notes: bool,
}

impl UnsavedRecords {
    fn any(self) -> bool {
        self.tasks || self.settings || self.notes
    }
}

/// Explicit application state plus its write-through persistence.
pub struct DayflowStore<S: KeyValueStore> {
    tasks: Vec<Task>,
    settings: AppSettings,
    notes: DailyNotes,
    persistence: PersistenceAdapter<S>,
    unsaved: UnsavedRecords,
}

impl<S: KeyValueStore> DayflowStore<S> {
    /// Loads all three records from `store`, substituting defaults for
    /// absent or malformed data.
    pub fn open(store: S) -> Self {
        let persistence = PersistenceAdapter::new(store);
        let tasks = persistence.load_tasks();
        let settings = persistence.load_settings();
        let notes = persistence.load_notes();
        info!(
            "event=store_open module=task_store status=ok tasks={} notes={}",
            tasks.len(),
            notes.len()
        );
        Self {
            tasks,
            settings,
            notes,
            persistence,
            unsaved: UnsavedRecords::default(),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn notes(&self) -> &DailyNotes {
        &self.notes
    }

    pub fn note_for(&self, date: &DateKey) -> Option<&str> {
        self.notes.get(date).map(String::as_str)
    }

    /// Returns `true` while any record failed its last write.
    pub fn needs_eviction(&self) -> bool {
        self.unsaved.any()
    }

    pub fn into_store(self) -> S {
        self.persistence.into_store()
    }

    /// Adds a task at the head of the collection.
    ///
    /// Returns `None` without writing when `text` is blank.
    pub fn add_task(
        &mut self,
        date: DateKey,
        is_future_plan: bool,
        text: &str,
    ) -> Option<(TaskId, SaveStatus)> {
        let Some(task) = Task::new(date, is_future_plan, text) else {
            debug!("event=task_add module=task_store status=rejected reason=empty_text");
            return None;
        };
        let id = task.id.clone();
        debug!(
            "event=task_add module=task_store status=ok task_id={id} date={} future_plan={is_future_plan}",
            task.date
        );
        self.tasks.insert(0, task);
        Some((id, self.persist_tasks()))
    }

    pub fn toggle_task(&mut self, id: &str) -> SaveStatus {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return SaveStatus::Unchanged;
        };
        task.completed = !task.completed;
        self.persist_tasks()
    }

    pub fn delete_task(&mut self, id: &str) -> SaveStatus {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        if self.tasks.len() == before {
            return SaveStatus::Unchanged;
        }
        self.persist_tasks()
    }

    /// Replaces a task memo; no length limit applies here.
    pub fn update_memo(&mut self, id: &str, memo: impl Into<String>) -> SaveStatus {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return SaveStatus::Unchanged;
        };
        task.memo = memo.into();
        self.persist_tasks()
    }

    /// Confirms every future plan scheduled on `date` at once.
    pub fn confirm_day(&mut self, date: &DateKey) -> SaveStatus {
        let mut confirmed = 0usize;
        for task in self
            .tasks
            .iter_mut()
            .filter(|task| task.date == *date && task.is_future_plan)
        {
            if !task.is_confirmed {
                task.is_confirmed = true;
                confirmed += 1;
            }
        }
        debug!("event=confirm_day module=task_store status=ok date={date} confirmed={confirmed}");
        if confirmed == 0 {
            return SaveStatus::Unchanged;
        }
        self.persist_tasks()
    }

    /// Stores or overwrites the note for `date`.
    ///
    /// # Errors
    /// - `NoteError::TooLong` when `text` exceeds the note limit; state is
    ///   left untouched in that case.
    pub fn save_daily_note(&mut self, date: DateKey, text: &str) -> Result<SaveStatus, NoteError> {
        validate_note(text)?;
        if self.notes.get(&date).map(String::as_str) == Some(text) {
            return Ok(SaveStatus::Unchanged);
        }
        self.notes.insert(date, text.to_string());
        Ok(self.persist_notes())
    }

    pub fn update_settings(&mut self, settings: AppSettings) -> SaveStatus {
        if self.settings == settings {
            return SaveStatus::Unchanged;
        }
        self.settings = settings;
        let ok = self.persistence.save_settings(&self.settings);
        self.unsaved.settings = !ok;
        status_of(ok)
    }

    /// Purges the oldest month and re-persists tasks and notes.
    pub fn evict_oldest_month(&mut self) -> StoreEviction {
        let outcome = evict_oldest_month(&mut self.tasks, &mut self.notes);
        if let EvictionOutcome::Evicted {
            month,
            tasks_removed,
            notes_removed,
        } = &outcome
        {
            info!(
                "event=eviction module=task_store status=ok month={month} tasks_removed={tasks_removed} notes_removed={notes_removed}"
            );
        } else {
            warn!("event=eviction module=task_store status=empty");
            return StoreEviction {
                outcome: EvictionOutcome::NothingToDelete,
                save: SaveStatus::Unchanged,
            };
        }
        let save = self.retry_unsaved_with(true);
        StoreEviction { outcome, save }
    }

    /// Writes again every record whose last write failed.
    pub fn retry_unsaved(&mut self) -> SaveStatus {
        self.retry_unsaved_with(false)
    }

    fn retry_unsaved_with(&mut self, force_collections: bool) -> SaveStatus {
        let pending = self.unsaved;
        if !force_collections && !pending.any() {
            return SaveStatus::Unchanged;
        }
        let mut ok = true;
        if force_collections || pending.tasks {
            ok &= self.persist_tasks() == SaveStatus::Saved;
        }
        if force_collections || pending.notes {
            ok &= self.persist_notes() == SaveStatus::Saved;
        }
        if pending.settings {
            let saved = self.persistence.save_settings(&self.settings);
            self.unsaved.settings = !saved;
            ok &= saved;
        }
        status_of(ok)
    }

    fn persist_tasks(&mut self) -> SaveStatus {
        let ok = self.persistence.save_tasks(&self.tasks);
        self.unsaved.tasks = !ok;
        status_of(ok)
    }

    fn persist_notes(&mut self) -> SaveStatus {
        let ok = self.persistence.save_notes(&self.notes);
        self.unsaved.notes = !ok;
        status_of(ok)
    }
}

fn status_of(ok: bool) -> SaveStatus {
    if ok {
        SaveStatus::Saved
    } else {
        SaveStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::{DayflowStore, SaveStatus};
    use crate::model::date::DateKey;
    use crate::repo::kv_repo::MemoryKvStore;

    fn day(value: &str) -> DateKey {
        DateKey::parse(value).unwrap()
    }

    #[test]
    fn add_inserts_at_head() {
        let mut store = DayflowStore::open(MemoryKvStore::new());
        store.add_task(day("2024-06-01"), false, "first").unwrap();
        store.add_task(day("2024-06-01"), false, "second").unwrap();
        assert_eq!(store.tasks()[0].text, "second");
        assert_eq!(store.tasks()[1].text, "first");
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let mut store = DayflowStore::open(MemoryKvStore::new());
        assert_eq!(store.toggle_task("missing"), SaveStatus::Unchanged);
        assert_eq!(store.delete_task("missing"), SaveStatus::Unchanged);
        assert_eq!(store.update_memo("missing", "x"), SaveStatus::Unchanged);
    }

    #[test]
    fn failed_write_keeps_mutation_and_flags_eviction() {
        let mut store = DayflowStore::open(MemoryKvStore::with_quota(40));
        let (id, status) = store
            .add_task(day("2024-06-01"), false, "a task that will not fit")
            .unwrap();
        assert_eq!(status, SaveStatus::Failed);
        assert!(store.task(&id).is_some());
        assert!(store.needs_eviction());
    }

    #[test]
    fn note_overwrite_with_same_text_is_unchanged() {
        let mut store = DayflowStore::open(MemoryKvStore::new());
        let date = day("2024-06-01");
        assert_eq!(
            store.save_daily_note(date.clone(), "calm day").unwrap(),
            SaveStatus::Saved
        );
        assert_eq!(
            store.save_daily_note(date.clone(), "calm day").unwrap(),
            SaveStatus::Unchanged
        );
        assert_eq!(store.note_for(&date), Some("calm day"));
    }
}
