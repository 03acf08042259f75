//! Task domain model.
//!
//! # Responsibility
//! - Define the persisted task record shared by today/future/history views.
//! - Own creation-time defaults and the confirmation invariant.
//!
//! # Invariants
//! - `id` and `date` never change after creation.
//! - `is_future_plan == false` implies `is_confirmed == true`.
//! - `text` is non-empty after trimming at creation.

use crate::model::date::DateKey;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque task identifier.
///
/// New ids are UUID v4 strings; persisted ids from older records are kept
/// verbatim.
pub type TaskId = String;

/// One user task for a calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    #[serde(default)]
    pub memo: String,
    pub date: DateKey,
    /// Created through the future-planning flow.
    pub is_future_plan: bool,
    /// Counts toward the day's visible list.
    pub is_confirmed: bool,
}

impl Task {
    /// Creates a task with a fresh id.
    ///
    /// Returns `None` when `text` is empty after trimming. The text itself is
    /// stored as entered.
    pub fn new(date: DateKey, is_future_plan: bool, text: impl Into<String>) -> Option<Self> {
        Self::with_id(Uuid::new_v4().to_string(), date, is_future_plan, text)
    }

    /// Creates a task with a caller-provided id (import and test paths).
    pub fn with_id(
        id: impl Into<TaskId>,
        date: DateKey,
        is_future_plan: bool,
        text: impl Into<String>,
    ) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self {
            id: id.into(),
            text,
            completed: false,
            memo: String::new(),
            date,
            is_future_plan,
            is_confirmed: !is_future_plan,
        })
    }

    /// Returns whether this is a future plan still waiting for morning
    /// confirmation on `date`.
    pub fn awaits_confirmation_on(&self, date: &DateKey) -> bool {
        self.date == *date && self.is_future_plan && !self.is_confirmed
    }

    /// Restores the confirmation invariant on a record read from storage.
    ///
    /// Returns `true` when the record had to be changed.
    pub fn repair_confirmation(&mut self) -> bool {
        if !self.is_future_plan && !self.is_confirmed {
            self.is_confirmed = true;
            return true;
        }
        false
    }
}
