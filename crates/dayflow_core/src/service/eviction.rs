//! Oldest-month eviction used after a storage quota failure.
//!
//! # Invariants
//! - The target month is the `YYYY-MM` prefix of the smallest date string
//!   across all task dates and note keys.
//! - Every task and note in the target month is removed; nothing else is.
//! - Empty inputs yield `NothingToDelete`, never an error.

use crate::model::date::{DateKey, MonthKey};
use crate::model::note::DailyNotes;
use crate::model::task::Task;

/// Result of one eviction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvictionOutcome {
    Evicted {
        month: MonthKey,
        tasks_removed: usize,
        notes_removed: usize,
    },
    NothingToDelete,
}

impl EvictionOutcome {
    /// Removed month label, if any.
    pub fn month(&self) -> Option<&MonthKey> {
        match self {
            Self::Evicted { month, .. } => Some(month),
            Self::NothingToDelete => None,
        }
    }
}

/// Returns the oldest month present in tasks or notes.
pub fn oldest_month(tasks: &[Task], notes: &DailyNotes) -> Option<MonthKey> {
    let oldest_task = tasks.iter().map(|task| &task.date).min();
    let oldest_note = notes.keys().next();
    let oldest: Option<&DateKey> = match (oldest_task, oldest_note) {
        (Some(task), Some(note)) => Some(task.min(note)),
        (task, note) => task.or(note),
    };
    oldest.map(DateKey::month)
}

/// Purges every task and note belonging to the oldest month.
///
/// This is a best-effort reclaim: it does not check that enough space is
/// freed for the next write.
pub fn evict_oldest_month(tasks: &mut Vec<Task>, notes: &mut DailyNotes) -> EvictionOutcome {
    let Some(month) = oldest_month(tasks, notes) else {
        return EvictionOutcome::NothingToDelete;
    };

    let tasks_before = tasks.len();
    tasks.retain(|task| !month.contains(&task.date));
    let notes_before = notes.len();
    notes.retain(|date, _| !month.contains(date));

    EvictionOutcome::Evicted {
        tasks_removed: tasks_before - tasks.len(),
        notes_removed: notes_before - notes.len(),
        month,
    }
}
