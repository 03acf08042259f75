//! Storage exhaustion through the Flutter-facing API. Lives in its own test
//! binary because configuration is read once per process.

use dayflow_core::{open_db, DayflowStore, SqliteKvStore};
use dayflow_ffi::api::{storage_evict_oldest_month, storage_retry_unsaved, task_add, today_view};

#[test]
fn task_from_failed_write_survives_until_eviction_persists_it() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("dayflow.sqlite3");
    std::env::set_var("DAYFLOW_DB_PATH", &db_path);
    std::env::set_var("DAYFLOW_STORAGE_QUOTA_BYTES", "400");

    let oldest = task_add("task-00".to_string(), Some("2031-01-10".to_string()), false);
    assert!(oldest.ok, "{}", oldest.message);
    assert!(!oldest.needs_eviction);

    let failed = (1..20)
        .map(|i| task_add(format!("task-{i:02}"), Some("2031-02-10".to_string()), false))
        .find(|response| !response.ok)
        .expect("quota should reject a write");
    assert_eq!(failed.save_status, "failed");
    assert!(failed.needs_eviction);
    let failed_id = failed.task_id.clone().expect("add should return task_id");

    let view = today_view(Some("2031-02-10".to_string()));
    assert!(view.ok, "{}", view.message);
    assert!(view.tasks.iter().any(|task| task.id == failed_id));

    let still_full = storage_retry_unsaved();
    assert_eq!(still_full.save_status, "failed");
    assert!(still_full.needs_eviction);

    let eviction = storage_evict_oldest_month();
    assert!(eviction.ok, "{}", eviction.message);
    assert_eq!(eviction.evicted_month.as_deref(), Some("2031-01"));
    assert_eq!(eviction.tasks_removed, 1);

    let settled = storage_retry_unsaved();
    assert_eq!(settled.save_status, "unchanged");
    assert!(!settled.needs_eviction);

    let conn = open_db(&db_path).unwrap();
    let on_disk = DayflowStore::open(SqliteKvStore::new(&conn));
    assert!(on_disk.task(&failed_id).is_some());
    assert!(on_disk
        .tasks()
        .iter()
        .all(|task| task.date.as_str().starts_with("2031-02")));
}
