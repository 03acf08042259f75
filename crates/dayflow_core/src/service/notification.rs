//! Native reminder bridge contract and scheduling policy.
//!
//! # Responsibility
//! - Define the narrow notification API a native shell provides.
//! - Build the two daily reminders from settings.
//! - Map notification clicks back to rituals.
//!
//! # Invariants
//! - Reminder ids are fixed: 1 morning, 2 evening; immediate test
//!   notifications use 100 and 101.
//! - Outside a native shell every bridge call is a no-op.

use crate::model::settings::{AlertTime, AppSettings};
use crate::service::briefing::RoutineKind;
use log::{info, warn};

pub const MORNING_REMINDER_ID: i32 = 1;
pub const EVENING_REMINDER_ID: i32 = 2;
pub const MORNING_TEST_ID: i32 = 100;
pub const EVENING_TEST_ID: i32 = 101;

/// One repeating daily reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyReminder {
    pub id: i32,
    pub kind: RoutineKind,
    pub at: AlertTime,
    pub title: &'static str,
    pub body: &'static str,
}

/// Platform notification service.
pub trait NotificationBridge {
    /// `false` in a browser context.
    fn is_native(&self) -> bool;
    fn has_permission(&self) -> bool;
    fn request_permission(&mut self) -> bool;
    /// Schedules both reminders to repeat daily. Returns `false` on failure.
    fn schedule_daily(&mut self, morning: AlertTime, evening: AlertTime) -> bool;
    fn cancel_all(&mut self);
    /// Fires a test notification for `kind` right away.
    fn send_immediate(&mut self, kind: RoutineKind);
}

/// Bridge used when no native shell is present.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotificationBridge;

impl NotificationBridge for NoopNotificationBridge {
    fn is_native(&self) -> bool {
        false
    }

    fn has_permission(&self) -> bool {
        false
    }

    fn request_permission(&mut self) -> bool {
        false
    }

    fn schedule_daily(&mut self, _morning: AlertTime, _evening: AlertTime) -> bool {
        false
    }

    fn cancel_all(&mut self) {}

    fn send_immediate(&mut self, _kind: RoutineKind) {}
}

/// Outcome of aligning scheduled reminders with settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderSync {
    Scheduled,
    /// Notifications are off in settings; pending reminders were cancelled.
    Disabled,
    Unsupported,
    PermissionDenied,
    Failed,
}

impl ReminderSync {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Disabled => "disabled",
            Self::Unsupported => "unsupported",
            Self::PermissionDenied => "permission_denied",
            Self::Failed => "failed",
        }
    }
}

/// Daily reminders described by `settings`.
pub fn daily_reminders(settings: &AppSettings) -> [DailyReminder; 2] {
    [
        DailyReminder {
            id: MORNING_REMINDER_ID,
            kind: RoutineKind::Morning,
            at: settings.morning_alert_time,
            title: "Good morning!",
            body: "Check today's tasks and start your day.",
        },
        DailyReminder {
            id: EVENING_REMINDER_ID,
            kind: RoutineKind::Evening,
            at: settings.evening_alert_time,
            title: "Time to wrap up the day",
            body: "Review today and get ready for tomorrow.",
        },
    ]
}

/// Ritual opened by a click on notification `id`.
pub fn routine_for_notification(id: i32) -> Option<RoutineKind> {
    match id {
        MORNING_REMINDER_ID | MORNING_TEST_ID => Some(RoutineKind::Morning),
        EVENING_REMINDER_ID | EVENING_TEST_ID => Some(RoutineKind::Evening),
        _ => None,
    }
}

/// Id of the immediate test notification for `kind`.
pub fn test_notification_id(kind: RoutineKind) -> i32 {
    match kind {
        RoutineKind::Morning => MORNING_TEST_ID,
        RoutineKind::Evening => EVENING_TEST_ID,
    }
}

/// Fires the test notification for `kind`; `false` without a native shell.
pub fn send_test_notification(bridge: &mut dyn NotificationBridge, kind: RoutineKind) -> bool {
    if !bridge.is_native() {
        return false;
    }
    bridge.send_immediate(kind);
    info!(
        "event=notification_test module=notification status=ok kind={} id={}",
        kind.as_str(),
        test_notification_id(kind)
    );
    true
}

/// Replaces scheduled reminders so they match `settings`.
pub fn sync_reminders(bridge: &mut dyn NotificationBridge, settings: &AppSettings) -> ReminderSync {
    if !bridge.is_native() {
        return ReminderSync::Unsupported;
    }
    if !settings.notifications_enabled {
        bridge.cancel_all();
        info!("event=reminder_sync module=notification status=disabled");
        return ReminderSync::Disabled;
    }
    if !bridge.has_permission() && !bridge.request_permission() {
        warn!("event=reminder_sync module=notification status=permission_denied");
        return ReminderSync::PermissionDenied;
    }

    bridge.cancel_all();
    if bridge.schedule_daily(settings.morning_alert_time, settings.evening_alert_time) {
        info!(
            "event=reminder_sync module=notification status=ok morning={} evening={}",
            settings.morning_alert_time, settings.evening_alert_time
        );
        ReminderSync::Scheduled
    } else {
        warn!("event=reminder_sync module=notification status=error error_code=schedule_failed");
        ReminderSync::Failed
    }
}
