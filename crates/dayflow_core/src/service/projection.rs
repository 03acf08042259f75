//! Read-only view projections over the task store.
//!
//! # Responsibility
//! - Derive today, future-by-date and month history views.
//! - Compute completion ratios for days and months.
//!
//! # Invariants
//! - Projections never mutate state and keep collection order (most recent
//!   first) inside each list.
//! - Progress is `0` when there are no tasks.
//! - History rows are sorted by date string descending.

use crate::model::date::{DateKey, MonthKey};
use crate::model::note::DailyNotes;
use crate::model::task::Task;

/// Completion counters with derived percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn of<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks.into_iter().fold(Self::default(), |acc, task| Self {
            completed: acc.completed + usize::from(task.completed),
            total: acc.total + 1,
        })
    }

    /// `completed / total * 100`, or `0.0` when `total` is zero.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }

    pub fn rounded_percent(&self) -> u32 {
        self.percent().round() as u32
    }

    fn add(self, other: Self) -> Self {
        Self {
            completed: self.completed + other.completed,
            total: self.total + other.total,
        }
    }
}

/// Confirmed tasks of the current day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodayView<'a> {
    pub date: DateKey,
    pub tasks: Vec<&'a Task>,
    pub progress: Progress,
}

/// Tasks planned for a selected day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FutureView<'a> {
    pub selected: DateKey,
    /// Earliest date offered for new plans (tomorrow).
    pub min_selectable_date: DateKey,
    pub tasks: Vec<&'a Task>,
}

/// One day row of the month history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryDay<'a> {
    pub date: DateKey,
    pub progress: Progress,
    pub tasks: Vec<&'a Task>,
    pub note: Option<&'a str>,
}

/// Month history with aggregate counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryView<'a> {
    pub month: MonthKey,
    pub days: Vec<HistoryDay<'a>>,
    pub summary: Progress,
}

impl HistoryView<'_> {
    pub fn day(&self, date: &DateKey) -> Option<&HistoryDay<'_>> {
        self.days.iter().find(|day| day.date == *date)
    }
}

/// All tasks dated `date`, confirmed or not.
pub fn tasks_on<'a>(tasks: &'a [Task], date: &DateKey) -> Vec<&'a Task> {
    tasks.iter().filter(|task| task.date == *date).collect()
}

/// Future plans for `date` still waiting for the morning confirmation.
pub fn unconfirmed_plans<'a>(tasks: &'a [Task], date: &DateKey) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| task.awaits_confirmation_on(date))
        .collect()
}

pub fn today_view<'a>(tasks: &'a [Task], today: &DateKey) -> TodayView<'a> {
    let visible: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.date == *today && task.is_confirmed)
        .collect();
    TodayView {
        date: today.clone(),
        progress: Progress::of(visible.iter().copied()),
        tasks: visible,
    }
}

pub fn future_view<'a>(tasks: &'a [Task], selected: &DateKey, today: &DateKey) -> FutureView<'a> {
    FutureView {
        selected: selected.clone(),
        min_selectable_date: today.succ(),
        tasks: tasks_on(tasks, selected),
    }
}

/// Builds the history rows for `month`.
///
/// A day is listed when it is on or before `today`, or when it has tasks or
/// a note.
pub fn history_view<'a>(
    tasks: &'a [Task],
    notes: &'a DailyNotes,
    month: &MonthKey,
    today: &DateKey,
) -> HistoryView<'a> {
    let days: Vec<HistoryDay<'a>> = month
        .days()
        .into_iter()
        .rev()
        .filter_map(|date| {
            let day_tasks = tasks_on(tasks, &date);
            let note = notes.get(&date).map(String::as_str);
            let listed = date.as_str() <= today.as_str() || !day_tasks.is_empty() || note.is_some();
            listed.then(|| HistoryDay {
                progress: Progress::of(day_tasks.iter().copied()),
                tasks: day_tasks,
                note,
                date,
            })
        })
        .collect();

    let summary = days
        .iter()
        .fold(Progress::default(), |acc, day| acc.add(day.progress));

    HistoryView {
        month: month.clone(),
        days,
        summary,
    }
}
