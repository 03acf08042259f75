use dayflow_core::service::projection::{future_view, history_view, today_view};
use dayflow_core::{DateKey, DayflowStore, MemoryKvStore, MonthKey, SaveStatus};

fn day(value: &str) -> DateKey {
    DateKey::parse(value).unwrap()
}

#[test]
fn same_day_task_is_confirmed_and_drives_progress() {
    let mut store = DayflowStore::open(MemoryKvStore::new());
    let today = day("2024-06-01");

    let (id, status) = store.add_task(today.clone(), false, "Buy milk").unwrap();
    assert_eq!(status, SaveStatus::Saved);

    let view = today_view(store.tasks(), &today);
    assert_eq!(view.tasks.len(), 1);
    assert_eq!(view.tasks[0].text, "Buy milk");
    assert!(view.tasks[0].is_confirmed);
    assert_eq!(view.progress.rounded_percent(), 0);

    assert_eq!(store.toggle_task(&id), SaveStatus::Saved);
    let view = today_view(store.tasks(), &today);
    assert_eq!(view.progress.rounded_percent(), 100);
    assert!(store.task(&id).unwrap().is_confirmed);
}

#[test]
fn future_plan_appears_today_only_after_confirmation() {
    let mut store = DayflowStore::open(MemoryKvStore::new());
    let dentist_day = day("2024-06-05");

    store.add_task(dentist_day.clone(), true, "Dentist").unwrap();
    assert!(today_view(store.tasks(), &dentist_day).tasks.is_empty());

    let planned = future_view(store.tasks(), &dentist_day, &day("2024-06-01"));
    assert_eq!(planned.tasks.len(), 1);
    assert_eq!(planned.min_selectable_date, day("2024-06-02"));

    assert_eq!(store.confirm_day(&dentist_day), SaveStatus::Saved);
    let view = today_view(store.tasks(), &dentist_day);
    assert_eq!(view.tasks.len(), 1);
    assert_eq!(view.tasks[0].text, "Dentist");
}

#[test]
fn confirm_day_touches_only_that_dates_future_plans() {
    let mut store = DayflowStore::open(MemoryKvStore::new());
    let target = day("2024-06-05");
    store.add_task(target.clone(), true, "plan a").unwrap();
    store.add_task(target.clone(), true, "plan b").unwrap();
    store.add_task(day("2024-06-06"), true, "other day").unwrap();
    store.add_task(target.clone(), false, "same day").unwrap();

    let before: Vec<_> = store.tasks().to_vec();
    store.confirm_day(&target);

    for (old, new) in before.iter().zip(store.tasks()) {
        if old.date == target && old.is_future_plan {
            assert!(new.is_confirmed, "{} should be confirmed", new.text);
        } else {
            assert_eq!(old, new);
        }
    }
    assert_eq!(store.confirm_day(&target), SaveStatus::Unchanged);
}

#[test]
fn history_counts_tasks_per_exact_date() {
    let mut store = DayflowStore::open(MemoryKvStore::new());
    let (done, _) = store.add_task(day("2024-06-03"), false, "run").unwrap();
    store.add_task(day("2024-06-03"), false, "read").unwrap();
    store.add_task(day("2024-06-10"), true, "call").unwrap();
    store.add_task(day("2024-07-01"), false, "next month").unwrap();
    store.toggle_task(&done);
    store
        .save_daily_note(day("2024-06-04"), "quiet day")
        .unwrap();

    let month = MonthKey::parse("2024-06").unwrap();
    let history = history_view(store.tasks(), store.notes(), &month, &day("2024-06-05"));

    let third = history.day(&day("2024-06-03")).unwrap();
    assert_eq!((third.progress.completed, third.progress.total), (1, 2));
    assert_eq!(history.day(&day("2024-06-04")).unwrap().note, Some("quiet day"));
    assert_eq!(history.day(&day("2024-06-10")).unwrap().progress.total, 1);
    assert!(history.day(&day("2024-06-20")).is_none());
    assert!(history.days.iter().all(|row| row.progress.completed <= row.progress.total));
    assert!(history.days.windows(2).all(|pair| pair[0].date > pair[1].date));
    assert_eq!((history.summary.completed, history.summary.total), (1, 3));
}

#[test]
fn blank_text_adds_nothing() {
    let mut store = DayflowStore::open(MemoryKvStore::new());
    assert!(store.add_task(day("2024-06-01"), false, "   ").is_none());
    assert!(store.tasks().is_empty());
}
