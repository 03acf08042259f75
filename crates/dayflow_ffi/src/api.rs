//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Translate core types into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - One store per process: the database is opened and loaded on first use,
//!   then every call works on that in-memory state and writes through.
//! - Mutations whose write failed stay in memory until eviction or a retry
//!   persists them.
//! - Ritual state lives in process memory and survives between calls.
//! - Lock order is store, then ritual state.

use dayflow_core::db::open_db;
use dayflow_core::service::eviction::EvictionOutcome;
use dayflow_core::service::export::{month_grid, render_month_png};
use dayflow_core::service::notification::{
    daily_reminders, routine_for_notification, send_test_notification, sync_reminders,
    test_notification_id, NotificationBridge,
};
use dayflow_core::service::projection::{self, Progress};
use dayflow_core::service::routine::{EveningState, MorningState};
use dayflow_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    text_generator_from_config, AlertTime, AppSettings, DateKey, DayflowConfig, DayflowStore,
    MonthKey, OwnedSqliteKvStore, RoutineKind, RoutineTrigger, SaveStatus, Task, TriggerOutcome,
};
use log::{info, warn};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

type Store = DayflowStore<OwnedSqliteKvStore>;

static CONFIG: OnceLock<Result<DayflowConfig, String>> = OnceLock::new();
static STORE: Mutex<Option<Store>> = Mutex::new(None);
static ROUTINE: OnceLock<Mutex<RoutineTrigger>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Flat task projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub memo: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub is_future_plan: bool,
    pub is_confirmed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressItem {
    pub completed: u32,
    pub total: u32,
    /// Rounded completion percentage, 0 when there are no tasks.
    pub percent: u32,
}

/// Generic action response envelope for mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Id of the created task (add only).
    pub task_id: Option<String>,
    /// `saved|failed|unchanged`.
    pub save_status: String,
    /// `true` while some mutation is held in memory only and the UI should
    /// offer eviction.
    pub needs_eviction: bool,
    pub message: String,
}

impl ActionResponse {
    fn from_status(status: SaveStatus, task_id: Option<String>, needs_eviction: bool) -> Self {
        let message = match status {
            SaveStatus::Saved => "Saved.",
            SaveStatus::Failed => "Storage is full. Free up space by deleting the oldest month.",
            SaveStatus::Unchanged => "Nothing to change.",
        };
        Self {
            ok: status != SaveStatus::Failed,
            task_id,
            save_status: save_status_label(status).to_string(),
            needs_eviction,
            message: message.to_string(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            save_status: save_status_label(SaveStatus::Unchanged).to_string(),
            needs_eviction: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodayResponse {
    pub ok: bool,
    pub date: String,
    pub tasks: Vec<TaskItem>,
    pub progress: ProgressItem,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FutureResponse {
    pub ok: bool,
    pub selected: String,
    /// Earliest date the planner may offer (tomorrow).
    pub min_selectable_date: String,
    pub tasks: Vec<TaskItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryDayItem {
    pub date: String,
    pub progress: ProgressItem,
    pub tasks: Vec<TaskItem>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryResponse {
    pub ok: bool,
    pub month: String,
    /// Newest day first.
    pub days: Vec<HistoryDayItem>,
    pub summary: ProgressItem,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsItem {
    /// `HH:MM`.
    pub morning_alert_time: String,
    /// `HH:MM`.
    pub evening_alert_time: String,
    pub notifications_enabled: bool,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsResponse {
    pub ok: bool,
    pub settings: Option<SettingsItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionResponse {
    pub ok: bool,
    /// `YYYY-MM` of the removed month; `None` when nothing was stored.
    pub evicted_month: Option<String>,
    pub tasks_removed: u32,
    pub notes_removed: u32,
    pub message: String,
}

/// Snapshot of one ritual after a routine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineResponse {
    pub ok: bool,
    /// `morning|evening`.
    pub kind: String,
    /// `idle|pending|shown`.
    pub state: String,
    /// Message to display when `state == "shown"`.
    pub briefing: Option<String>,
    /// Another briefing request was still outstanding.
    pub busy: bool,
    pub message: String,
}

/// Reminder commands for the Flutter shell after a settings sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSyncResponse {
    pub ok: bool,
    /// `scheduled|disabled|unsupported|permission_denied|failed`.
    pub status: String,
    /// Cancel every pending platform notification before scheduling.
    pub cancel_existing: bool,
    /// Reminders to schedule; empty unless `status == "scheduled"`.
    pub reminders: Vec<ReminderItem>,
    pub message: String,
}

/// Daily reminder the native shell should schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderItem {
    pub id: i32,
    pub kind: String,
    pub hour: u8,
    pub minute: u8,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    pub png_bytes: Vec<u8>,
    pub message: String,
}

/// Adds a task for `date` (today when `None`).
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Blank text is rejected without writing.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(text: String, date: Option<String>, is_future_plan: bool) -> ActionResponse {
    let date = match parse_day(date) {
        Ok(date) => date,
        Err(err) => return ActionResponse::failure(err),
    };
    match with_store_pending(|store| store.add_task(date, is_future_plan, &text)) {
        Ok((Some((id, status)), pending)) => ActionResponse::from_status(status, Some(id), pending),
        Ok((None, _)) => ActionResponse::failure("Task text cannot be empty."),
        Err(err) => ActionResponse::failure(format!("task_add failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(task_id: String) -> ActionResponse {
    status_response("task_toggle", |store| store.toggle_task(&task_id))
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(task_id: String) -> ActionResponse {
    status_response("task_delete", |store| store.delete_task(&task_id))
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_update_memo(task_id: String, memo: String) -> ActionResponse {
    status_response("task_update_memo", |store| store.update_memo(&task_id, memo))
}

/// Confirms every future plan dated `date`.
#[flutter_rust_bridge::frb(sync)]
pub fn confirm_day(date: String) -> ActionResponse {
    let date = match parse_day(Some(date)) {
        Ok(date) => date,
        Err(err) => return ActionResponse::failure(err),
    };
    status_response("confirm_day", |store| store.confirm_day(&date))
}

/// Confirmed tasks of `today` (system date when `None`).
#[flutter_rust_bridge::frb(sync)]
pub fn today_view(today: Option<String>) -> TodayResponse {
    let result = parse_day(today).and_then(|today| {
        with_store(|store| {
            let view = projection::today_view(store.tasks(), &today);
            TodayResponse {
                ok: true,
                date: today.to_string(),
                tasks: to_task_items(&view.tasks),
                progress: to_progress_item(view.progress),
                message: String::new(),
            }
        })
    });
    result.unwrap_or_else(|err| TodayResponse {
        ok: false,
        date: String::new(),
        tasks: Vec::new(),
        progress: to_progress_item(Progress::default()),
        message: format!("today_view failed: {err}"),
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn future_view(selected: String, today: Option<String>) -> FutureResponse {
    let result = parse_day(Some(selected)).and_then(|selected| {
        let today = parse_day(today)?;
        with_store(|store| {
            let view = projection::future_view(store.tasks(), &selected, &today);
            FutureResponse {
                ok: true,
                selected: view.selected.to_string(),
                min_selectable_date: view.min_selectable_date.to_string(),
                tasks: to_task_items(&view.tasks),
                message: String::new(),
            }
        })
    });
    result.unwrap_or_else(|err| FutureResponse {
        ok: false,
        selected: String::new(),
        min_selectable_date: String::new(),
        tasks: Vec::new(),
        message: format!("future_view failed: {err}"),
    })
}

/// History rows of `month` (`YYYY-MM`).
#[flutter_rust_bridge::frb(sync)]
pub fn history_view(month: String, today: Option<String>) -> HistoryResponse {
    let result = MonthKey::parse(month.trim())
        .map_err(|err| err.to_string())
        .and_then(|month| {
            let today = parse_day(today)?;
            with_store(|store| {
                let view = projection::history_view(store.tasks(), store.notes(), &month, &today);
                HistoryResponse {
                    ok: true,
                    month: view.month.to_string(),
                    days: view
                        .days
                        .iter()
                        .map(|day| HistoryDayItem {
                            date: day.date.to_string(),
                            progress: to_progress_item(day.progress),
                            tasks: to_task_items(&day.tasks),
                            note: day.note.map(str::to_string),
                        })
                        .collect(),
                    summary: to_progress_item(view.summary),
                    message: String::new(),
                }
            })
        });
    result.unwrap_or_else(|err| HistoryResponse {
        ok: false,
        month: String::new(),
        days: Vec::new(),
        summary: to_progress_item(Progress::default()),
        message: format!("history_view failed: {err}"),
    })
}

/// Stores the note of `date`, overwriting an existing one.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_note_save(date: String, text: String) -> ActionResponse {
    let date = match parse_day(Some(date)) {
        Ok(date) => date,
        Err(err) => return ActionResponse::failure(err),
    };
    match with_store_pending(|store| store.save_daily_note(date, &text)) {
        Ok((Ok(status), pending)) => ActionResponse::from_status(status, None, pending),
        Ok((Err(err), _)) => ActionResponse::failure(err.to_string()),
        Err(err) => ActionResponse::failure(format!("daily_note_save failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn settings_get() -> SettingsResponse {
    match with_store(|store| to_settings_item(store.settings())) {
        Ok(settings) => SettingsResponse {
            ok: true,
            settings: Some(settings),
            message: String::new(),
        },
        Err(err) => SettingsResponse {
            ok: false,
            settings: None,
            message: format!("settings_get failed: {err}"),
        },
    }
}

/// Replaces the settings record. Alert times must be `HH:MM`.
#[flutter_rust_bridge::frb(sync)]
pub fn settings_update(settings: SettingsItem) -> ActionResponse {
    let parsed = match from_settings_item(settings) {
        Ok(parsed) => parsed,
        Err(err) => return ActionResponse::failure(err),
    };
    status_response("settings_update", |store| store.update_settings(parsed))
}

/// Writes again every record held in memory only.
///
/// # FFI contract
/// - `save_status == "unchanged"` when nothing was pending.
/// - `needs_eviction` stays `true` while storage is still full.
#[flutter_rust_bridge::frb(sync)]
pub fn storage_retry_unsaved() -> ActionResponse {
    status_response("storage_retry_unsaved", Store::retry_unsaved)
}

/// Deletes every task and note of the oldest stored month, then writes
/// the remaining state including mutations held in memory only.
#[flutter_rust_bridge::frb(sync)]
pub fn storage_evict_oldest_month() -> EvictionResponse {
    match with_store(|store| store.evict_oldest_month()) {
        Ok(eviction) => match eviction.outcome {
            EvictionOutcome::Evicted {
                month,
                tasks_removed,
                notes_removed,
            } => EvictionResponse {
                ok: !eviction.save.is_failed(),
                message: if eviction.save.is_failed() {
                    format!("Deleted {month}, but storage is still full.")
                } else {
                    format!("Deleted records from {month}.")
                },
                evicted_month: Some(month.to_string()),
                tasks_removed: to_u32(tasks_removed),
                notes_removed: to_u32(notes_removed),
            },
            EvictionOutcome::NothingToDelete => EvictionResponse {
                ok: true,
                evicted_month: None,
                tasks_removed: 0,
                notes_removed: 0,
                message: "Nothing to delete.".to_string(),
            },
        },
        Err(err) => EvictionResponse {
            ok: false,
            evicted_month: None,
            tasks_removed: 0,
            notes_removed: 0,
            message: format!("storage_evict_oldest_month failed: {err}"),
        },
    }
}

/// Startup check: opens the morning briefing when today has unconfirmed
/// plans. Blocks while the briefing text is generated.
#[flutter_rust_bridge::frb(sync)]
pub fn routine_check_on_load(today: Option<String>) -> RoutineResponse {
    run_routine(RoutineKind::Morning, today, |trigger, store, today| {
        trigger.check_on_load(store, today)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn routine_trigger_morning(today: Option<String>) -> RoutineResponse {
    run_routine(RoutineKind::Morning, today, |trigger, store, today| {
        trigger.trigger_morning(store, today)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn routine_trigger_evening(today: Option<String>) -> RoutineResponse {
    run_routine(RoutineKind::Evening, today, |trigger, store, today| {
        trigger.trigger_evening(store, today)
    })
}

/// Confirms today's plans and closes the morning briefing.
#[flutter_rust_bridge::frb(sync)]
pub fn routine_confirm_morning(today: Option<String>) -> ActionResponse {
    let today = match parse_day(today) {
        Ok(today) => today,
        Err(err) => return ActionResponse::failure(err),
    };
    status_response("routine_confirm_morning", |store| {
        routine().confirm_morning(store, &today)
    })
}

/// Stores `note` for today (when non-blank) and closes the evening ritual.
#[flutter_rust_bridge::frb(sync)]
pub fn routine_finish_evening(today: Option<String>, note: String) -> ActionResponse {
    let today = match parse_day(today) {
        Ok(today) => today,
        Err(err) => return ActionResponse::failure(err),
    };
    match with_store_pending(|store| routine().finish_evening(store, &today, &note)) {
        Ok((Ok(status), pending)) => ActionResponse::from_status(status, None, pending),
        Ok((Err(err), _)) => ActionResponse::failure(err.to_string()),
        Err(err) => ActionResponse::failure(format!("routine_finish_evening failed: {err}")),
    }
}

/// Ritual (`morning|evening`) opened by a click on notification `id`.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_route(id: i32) -> Option<String> {
    routine_for_notification(id).map(|kind| kind.as_str().to_string())
}

/// Daily reminders derived from the stored settings. Empty when
/// notifications are disabled.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_plan() -> Vec<ReminderItem> {
    let settings = match with_store(|store| store.settings().clone()) {
        Ok(settings) => settings,
        Err(err) => {
            warn!("event=reminder_plan module=ffi status=error error={err}");
            return Vec::new();
        }
    };
    if !settings.notifications_enabled {
        return Vec::new();
    }
    to_reminder_items(&settings)
}

/// Aligns platform reminders with the stored settings.
///
/// Input semantics:
/// - `is_native`: `false` in a browser context.
/// - `permission_granted`: outcome of the shell's permission prompt.
///
/// # FFI contract
/// - Returns commands only; the shell talks to the platform service.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_sync(is_native: bool, permission_granted: bool) -> ReminderSyncResponse {
    let settings = match with_store(|store| store.settings().clone()) {
        Ok(settings) => settings,
        Err(err) => {
            return ReminderSyncResponse {
                ok: false,
                status: "failed".to_string(),
                cancel_existing: false,
                reminders: Vec::new(),
                message: format!("reminder_sync failed: {err}"),
            }
        }
    };
    let mut bridge = ShellCommands::new(is_native, permission_granted);
    let status = sync_reminders(&mut bridge, &settings);
    let reminders = if bridge.scheduled {
        to_reminder_items(&settings)
    } else {
        Vec::new()
    };
    ReminderSyncResponse {
        ok: true,
        status: status.as_str().to_string(),
        cancel_existing: bridge.cancel_existing,
        reminders,
        message: String::new(),
    }
}

/// Id of the test notification the shell should fire for `kind`
/// (`morning|evening`). `None` for unknown kinds or outside a native shell.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_send_test(kind: String, is_native: bool) -> Option<i32> {
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "morning" => RoutineKind::Morning,
        "evening" => RoutineKind::Evening,
        _ => return None,
    };
    let mut bridge = ShellCommands::new(is_native, true);
    if !send_test_notification(&mut bridge, kind) {
        return None;
    }
    bridge.immediate.map(test_notification_id)
}

/// Renders `month` (`YYYY-MM`) as a PNG calendar grid.
#[flutter_rust_bridge::frb(sync)]
pub fn export_month_png(month: String) -> ExportResponse {
    let result = MonthKey::parse(month.trim())
        .map_err(|err| err.to_string())
        .and_then(|month| with_store(|store| month_grid(store.tasks(), store.notes(), &month)))
        .and_then(|grid| render_month_png(&grid).map_err(|err| err.to_string()));
    match result {
        Ok(png_bytes) => ExportResponse {
            ok: true,
            png_bytes,
            message: String::new(),
        },
        Err(err) => ExportResponse {
            ok: false,
            png_bytes: Vec::new(),
            message: format!("export_month_png failed: {err}"),
        },
    }
}

fn config() -> Result<&'static DayflowConfig, String> {
    CONFIG
        .get_or_init(|| DayflowConfig::from_env().map_err(|err| err.to_string()))
        .as_ref()
        .map_err(Clone::clone)
}

fn routine() -> MutexGuard<'static, RoutineTrigger> {
    ROUTINE
        .get_or_init(|| Mutex::new(RoutineTrigger::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Runs `f` on the process-wide store, loading it on first use.
fn with_store<T>(f: impl FnOnce(&mut Store) -> T) -> Result<T, String> {
    let config = config()?;
    let mut slot = STORE.lock().unwrap_or_else(PoisonError::into_inner);
    if slot.is_none() {
        let conn = open_db(&config.db_path).map_err(|err| format!("DB open failed: {err}"))?;
        *slot = Some(DayflowStore::open(OwnedSqliteKvStore::with_quota(
            conn,
            config.storage_quota_bytes,
        )));
        info!("event=ffi_store_open module=ffi status=ok");
    }
    match slot.as_mut() {
        Some(store) => Ok(f(store)),
        None => Err("store unavailable".to_string()),
    }
}

/// `with_store` plus whether any record is still held in memory only.
fn with_store_pending<T>(f: impl FnOnce(&mut Store) -> T) -> Result<(T, bool), String> {
    with_store(|store| {
        let value = f(store);
        (value, store.needs_eviction())
    })
}

fn status_response(operation: &str, f: impl FnOnce(&mut Store) -> SaveStatus) -> ActionResponse {
    match with_store_pending(f) {
        Ok((status, pending)) => ActionResponse::from_status(status, None, pending),
        Err(err) => ActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

/// Starts a ritual, then answers its request outside the routine lock so a
/// concurrent trigger observes `busy`.
fn run_routine(
    kind: RoutineKind,
    today: Option<String>,
    start: impl FnOnce(&mut RoutineTrigger, &Store, &DateKey) -> TriggerOutcome,
) -> RoutineResponse {
    let outcome = parse_day(today)
        .and_then(|today| with_store(|store| start(&mut routine(), &*store, &today)));
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            return RoutineResponse {
                ok: false,
                kind: kind.as_str().to_string(),
                state: "idle".to_string(),
                briefing: None,
                busy: false,
                message: format!("routine failed: {err}"),
            }
        }
    };

    if let TriggerOutcome::Requested(request) = &outcome {
        let reply = match config() {
            Ok(config) => text_generator_from_config(config).generate(&request.prompt),
            Err(err) => Err(dayflow_core::GenerationError::Transport(err)),
        };
        routine().complete(request.ticket, reply);
    }
    routine_snapshot(kind, outcome == TriggerOutcome::Busy)
}

fn routine_snapshot(kind: RoutineKind, busy: bool) -> RoutineResponse {
    let trigger = routine();
    let (state, briefing) = match kind {
        RoutineKind::Morning => match trigger.morning() {
            MorningState::Idle => ("idle", None),
            MorningState::Pending { .. } => ("pending", None),
            MorningState::Shown { message } => ("shown", Some(message.clone())),
        },
        RoutineKind::Evening => match trigger.evening() {
            EveningState::Idle => ("idle", None),
            EveningState::Pending { .. } => ("pending", None),
            EveningState::Shown { message } => ("shown", Some(message.clone())),
        },
    };
    RoutineResponse {
        ok: true,
        kind: kind.as_str().to_string(),
        state: state.to_string(),
        briefing,
        busy,
        message: if busy {
            "A briefing is already being prepared.".to_string()
        } else {
            String::new()
        },
    }
}

/// Records notification commands for the Flutter shell to carry out.
struct ShellCommands {
    native: bool,
    permission_granted: bool,
    cancel_existing: bool,
    scheduled: bool,
    immediate: Option<RoutineKind>,
}

impl ShellCommands {
    fn new(native: bool, permission_granted: bool) -> Self {
        Self {
            native,
            permission_granted,
            cancel_existing: false,
            scheduled: false,
            immediate: None,
        }
    }
}

impl NotificationBridge for ShellCommands {
    fn is_native(&self) -> bool {
        self.native
    }

    fn has_permission(&self) -> bool {
        self.permission_granted
    }

    // The shell prompts before calling in, so the answer is already known.
    fn request_permission(&mut self) -> bool {
        self.permission_granted
    }

    fn schedule_daily(&mut self, _morning: AlertTime, _evening: AlertTime) -> bool {
        self.scheduled = true;
        true
    }

    fn cancel_all(&mut self) {
        self.cancel_existing = true;
        self.scheduled = false;
    }

    fn send_immediate(&mut self, kind: RoutineKind) {
        self.immediate = Some(kind);
    }
}

fn parse_day(raw: Option<String>) -> Result<DateKey, String> {
    match raw.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => DateKey::parse(value).map_err(|err| err.to_string()),
        None => Ok(DateKey::today()),
    }
}

fn save_status_label(status: SaveStatus) -> &'static str {
    match status {
        SaveStatus::Saved => "saved",
        SaveStatus::Failed => "failed",
        SaveStatus::Unchanged => "unchanged",
    }
}

fn to_task_items(tasks: &[&Task]) -> Vec<TaskItem> {
    tasks
        .iter()
        .map(|task| TaskItem {
            id: task.id.clone(),
            text: task.text.clone(),
            completed: task.completed,
            memo: task.memo.clone(),
            date: task.date.to_string(),
            is_future_plan: task.is_future_plan,
            is_confirmed: task.is_confirmed,
        })
        .collect()
}

fn to_progress_item(progress: Progress) -> ProgressItem {
    ProgressItem {
        completed: to_u32(progress.completed),
        total: to_u32(progress.total),
        percent: progress.rounded_percent(),
    }
}

fn to_reminder_items(settings: &AppSettings) -> Vec<ReminderItem> {
    daily_reminders(settings)
        .into_iter()
        .map(|reminder| ReminderItem {
            id: reminder.id,
            kind: reminder.kind.as_str().to_string(),
            hour: reminder.at.hour(),
            minute: reminder.at.minute(),
            title: reminder.title.to_string(),
            body: reminder.body.to_string(),
        })
        .collect()
}

fn to_settings_item(settings: &AppSettings) -> SettingsItem {
    SettingsItem {
        morning_alert_time: settings.morning_alert_time.to_string(),
        evening_alert_time: settings.evening_alert_time.to_string(),
        notifications_enabled: settings.notifications_enabled,
        user_name: settings.user_name.clone(),
    }
}

fn from_settings_item(item: SettingsItem) -> Result<AppSettings, String> {
    Ok(AppSettings {
        morning_alert_time: AlertTime::parse(item.morning_alert_time.trim())
            .map_err(|err| err.to_string())?,
        evening_alert_time: AlertTime::parse(item.evening_alert_time.trim())
            .map_err(|err| err.to_string())?,
        notifications_enabled: item.notifications_enabled,
        user_name: item.user_name,
    })
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        confirm_day, core_version, daily_note_save, export_month_png, future_view, history_view,
        init_logging, notification_route, notification_send_test, ping, reminder_sync,
        settings_get, storage_retry_unsaved, task_add, task_delete, task_toggle,
        task_update_memo, today_view,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn added_task_shows_in_today_view_and_toggles() {
        let text = unique_token("Buy milk");
        let created = task_add(text.clone(), Some("2031-03-01".to_string()), false);
        assert!(created.ok, "{}", created.message);
        let task_id = created.task_id.expect("add should return task_id");

        let view = today_view(Some("2031-03-01".to_string()));
        assert!(view.ok, "{}", view.message);
        let item = view.tasks.iter().find(|item| item.id == task_id).unwrap();
        assert_eq!(item.text, text);
        assert!(item.is_confirmed);

        assert_eq!(task_toggle(task_id.clone()).save_status, "saved");
        assert_eq!(task_update_memo(task_id.clone(), "memo".to_string()).save_status, "saved");
        let view = today_view(Some("2031-03-01".to_string()));
        let item = view.tasks.iter().find(|item| item.id == task_id).unwrap();
        assert!(item.completed);
        assert_eq!(item.memo, "memo");

        assert_eq!(task_delete(task_id.clone()).save_status, "saved");
        assert_eq!(task_delete(task_id).save_status, "unchanged");
    }

    #[test]
    fn future_plan_needs_confirmation() {
        let created = task_add(unique_token("Dentist"), Some("2031-04-05".to_string()), true);
        let task_id = created.task_id.expect("add should return task_id");

        let planned = future_view("2031-04-05".to_string(), Some("2031-04-01".to_string()));
        assert_eq!(planned.min_selectable_date, "2031-04-02");
        assert!(planned.tasks.iter().any(|item| item.id == task_id));
        let today = today_view(Some("2031-04-05".to_string()));
        assert!(!today.tasks.iter().any(|item| item.id == task_id));

        assert!(confirm_day("2031-04-05".to_string()).ok);
        let today = today_view(Some("2031-04-05".to_string()));
        assert!(today.tasks.iter().any(|item| item.id == task_id));
    }

    #[test]
    fn invalid_input_is_reported_in_envelope() {
        assert!(!task_add("   ".to_string(), None, false).ok);
        assert!(!task_add("ok".to_string(), Some("2031-13-01".to_string()), false).ok);
        assert!(!history_view("June".to_string(), None).ok);
        let too_long = daily_note_save("2031-05-01".to_string(), "x".repeat(141));
        assert!(!too_long.ok);
        assert!(too_long.message.contains("140"));
    }

    #[test]
    fn history_and_export_cover_noted_days() {
        let saved = daily_note_save("2031-06-15".to_string(), "calm".to_string());
        assert!(saved.ok, "{}", saved.message);

        let history = history_view("2031-06".to_string(), Some("2031-06-01".to_string()));
        let row = history.days.iter().find(|day| day.date == "2031-06-15").unwrap();
        assert_eq!(row.note.as_deref(), Some("calm"));

        let export = export_month_png("2031-06".to_string());
        assert!(export.ok, "{}", export.message);
        assert_eq!(&export.png_bytes[..4], b"\x89PNG");
    }

    #[test]
    fn settings_are_readable() {
        let response = settings_get();
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.settings.unwrap().morning_alert_time.len(), 5);
    }

    #[test]
    fn notification_clicks_route_to_rituals() {
        assert_eq!(notification_route(100).as_deref(), Some("morning"));
        assert_eq!(notification_route(2).as_deref(), Some("evening"));
        assert_eq!(notification_route(42), None);
    }

    #[test]
    fn reminder_sync_returns_shell_commands() {
        let browser = reminder_sync(false, false);
        assert!(browser.ok, "{}", browser.message);
        assert_eq!(browser.status, "unsupported");
        assert!(!browser.cancel_existing);
        assert!(browser.reminders.is_empty());

        let native = reminder_sync(true, false);
        assert!(native.ok, "{}", native.message);
        assert!(native.reminders.is_empty());
        assert_ne!(native.status, "scheduled");
    }

    #[test]
    fn test_notifications_need_a_native_shell() {
        assert_eq!(notification_send_test("Evening".to_string(), true), Some(101));
        assert_eq!(notification_send_test("morning".to_string(), true), Some(100));
        assert_eq!(notification_send_test("morning".to_string(), false), None);
        assert_eq!(notification_send_test("noon".to_string(), true), None);
    }

    #[test]
    fn retry_without_full_storage_needs_no_eviction() {
        let response = storage_retry_unsaved();
        assert!(response.ok, "{}", response.message);
        assert!(!response.needs_eviction);
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
