use dayflow_core::repo::persistence::{NOTES_KEY, TASKS_KEY};
use dayflow_core::{
    DateKey, DayflowStore, EvictionOutcome, KeyValueStore, MemoryKvStore, MonthKey, SaveStatus,
    Task,
};

fn day(value: &str) -> DateKey {
    DateKey::parse(value).unwrap()
}

fn seeded_store() -> MemoryKvStore {
    let tasks = vec![
        Task::with_id("july-1", day("2024-07-02"), false, "July errand").unwrap(),
        Task::with_id("june-1", day("2024-06-28"), false, "A long June task text to free some room").unwrap(),
        Task::with_id("june-2", day("2024-06-03"), false, "Another long June task text to free room").unwrap(),
    ];
    let mut kv = MemoryKvStore::new();
    kv.set(TASKS_KEY, &serde_json::to_string(&tasks).unwrap())
        .unwrap();
    kv.set(
        NOTES_KEY,
        r#"{"2024-06-15":"june note","2024-07-01":"july note"}"#,
    )
    .unwrap();
    let used = kv.used_bytes();
    kv.set_quota(Some(used));
    kv
}

#[test]
fn quota_failure_then_eviction_drops_oldest_month() {
    let mut store = DayflowStore::open(seeded_store());

    let (_, status) = store.add_task(day("2024-07-03"), false, "Overflow").unwrap();
    assert_eq!(status, SaveStatus::Failed);
    assert!(store.needs_eviction());
    assert_eq!(store.tasks().len(), 4, "failed write keeps the new task");

    let eviction = store.evict_oldest_month();
    assert_eq!(eviction.outcome.month(), MonthKey::parse("2024-06").ok().as_ref());
    assert_eq!(eviction.outcome.month().unwrap().as_str(), "2024-06");
    assert!(matches!(
        eviction.outcome,
        EvictionOutcome::Evicted {
            tasks_removed: 2,
            notes_removed: 1,
            ..
        }
    ));
    assert_eq!(eviction.save, SaveStatus::Saved);
    assert!(!store.needs_eviction());

    assert!(store.tasks().iter().all(|task| task.date.as_str().starts_with("2024-07")));
    assert_eq!(store.tasks().len(), 2);
    assert_eq!(store.note_for(&day("2024-07-01")), Some("july note"));

    let reopened = DayflowStore::open(store.into_store());
    assert_eq!(reopened.tasks().len(), 2);
    assert_eq!(reopened.notes().len(), 1);
}

#[test]
fn eviction_on_empty_state_keeps_reporting_nothing_to_delete() {
    let mut store = DayflowStore::open(MemoryKvStore::new());
    store.add_task(day("2024-05-01"), false, "only").unwrap();

    assert!(matches!(
        store.evict_oldest_month().outcome,
        EvictionOutcome::Evicted { .. }
    ));
    for _ in 0..3 {
        let eviction = store.evict_oldest_month();
        assert_eq!(eviction.outcome, EvictionOutcome::NothingToDelete);
        assert_eq!(eviction.save, SaveStatus::Unchanged);
    }
}
