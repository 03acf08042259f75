//! Morning/evening ritual state machines.
//!
//! # Responsibility
//! - Decide when the morning briefing is due (unconfirmed plans for today).
//! - Track each ritual in its own enum state field.
//! - Guard the single outbound text-generation call.
//!
//! # Invariants
//! - At most one generation request is in flight. A trigger while one is
//!   outstanding is ignored with `TriggerOutcome::Busy`.
//! - A reply is applied only when its ticket matches the in-flight request
//!   and the ritual is still pending; stale replies are dropped.
//! - Leaving a ritual (confirm/finish) cancels its in-flight request.
//! - Both rituals may be shown at once; presentation picks one.

use crate::model::date::DateKey;
use crate::model::note::{validate_note, NoteError};
use crate::model::task::{Task, TaskId};
use crate::repo::kv_repo::KeyValueStore;
use crate::service::briefing::{
    evening_prompt, morning_prompt, resolve_reply, GenerationError, RoutineKind, TextGenerator,
    MORNING_NO_PLANS,
};
use crate::service::projection::{tasks_on, unconfirmed_plans};
use crate::service::task_store::{DayflowStore, SaveStatus};
use log::{debug, info};

/// Ticket identifying one outbound generation request.
pub type Ticket = u64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MorningState {
    #[default]
    Idle,
    Pending {
        ticket: Ticket,
    },
    Shown {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EveningState {
    #[default]
    Idle,
    Pending {
        ticket: Ticket,
    },
    Shown {
        message: String,
    },
}

/// Outbound request the host must answer through [`RoutineTrigger::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BriefingRequest {
    pub ticket: Ticket,
    pub kind: RoutineKind,
    /// Tasks the message is about, in collection order.
    pub task_ids: Vec<TaskId>,
    pub prompt: String,
}

/// Result of a trigger call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// Ritual is pending; the request must be answered.
    Requested(BriefingRequest),
    /// Ritual shown immediately without calling the generator.
    Shown,
    /// No briefing is due.
    NotNeeded,
    /// Another generation request is still outstanding.
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    ticket: Ticket,
    kind: RoutineKind,
}

/// Owner of both ritual state machines.
#[derive(Debug, Default)]
pub struct RoutineTrigger {
    morning: MorningState,
    evening: EveningState,
    in_flight: Option<InFlight>,
    last_ticket: Ticket,
}

impl RoutineTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn morning(&self) -> &MorningState {
        &self.morning
    }

    pub fn evening(&self) -> &EveningState {
        &self.evening
    }

    /// Kind of the outstanding request, if any (drives loading indicators).
    pub fn loading(&self) -> Option<RoutineKind> {
        self.in_flight.map(|in_flight| in_flight.kind)
    }

    /// Automatic check run at startup.
    ///
    /// Starts the morning briefing only when today has future plans that
    /// are not confirmed yet.
    pub fn check_on_load<S: KeyValueStore>(
        &mut self,
        store: &DayflowStore<S>,
        today: &DateKey,
    ) -> TriggerOutcome {
        if self.in_flight.is_some() {
            return TriggerOutcome::Busy;
        }
        if self.morning != MorningState::Idle {
            return TriggerOutcome::NotNeeded;
        }
        let plans = unconfirmed_plans(store.tasks(), today);
        if plans.is_empty() {
            return TriggerOutcome::NotNeeded;
        }
        let prompt = morning_prompt(&plans, &store.settings().user_name);
        TriggerOutcome::Requested(self.begin(RoutineKind::Morning, &plans, prompt))
    }

    /// Manual morning trigger over all of today's tasks.
    pub fn trigger_morning<S: KeyValueStore>(
        &mut self,
        store: &DayflowStore<S>,
        today: &DateKey,
    ) -> TriggerOutcome {
        if self.in_flight.is_some() {
            return TriggerOutcome::Busy;
        }
        let todays = tasks_on(store.tasks(), today);
        if todays.is_empty() {
            self.morning = MorningState::Shown {
                message: MORNING_NO_PLANS.to_string(),
            };
            return TriggerOutcome::Shown;
        }
        let prompt = morning_prompt(&todays, &store.settings().user_name);
        TriggerOutcome::Requested(self.begin(RoutineKind::Morning, &todays, prompt))
    }

    /// Manual evening trigger over all of today's tasks.
    pub fn trigger_evening<S: KeyValueStore>(
        &mut self,
        store: &DayflowStore<S>,
        today: &DateKey,
    ) -> TriggerOutcome {
        if self.in_flight.is_some() {
            return TriggerOutcome::Busy;
        }
        let todays = tasks_on(store.tasks(), today);
        let prompt = evening_prompt(&todays, &store.settings().user_name);
        TriggerOutcome::Requested(self.begin(RoutineKind::Evening, &todays, prompt))
    }

    /// Applies a generator reply. Returns `false` for stale tickets.
    pub fn complete(&mut self, ticket: Ticket, reply: Result<String, GenerationError>) -> bool {
        let Some(in_flight) = self.in_flight.filter(|in_flight| in_flight.ticket == ticket) else {
            debug!("event=briefing_complete module=routine status=stale ticket={ticket}");
            return false;
        };
        self.in_flight = None;

        let message = resolve_reply(in_flight.kind, reply);
        match in_flight.kind {
            RoutineKind::Morning if self.morning == (MorningState::Pending { ticket }) => {
                self.morning = MorningState::Shown { message };
            }
            RoutineKind::Evening if self.evening == (EveningState::Pending { ticket }) => {
                self.evening = EveningState::Shown { message };
            }
            _ => return false,
        }
        info!(
            "event=briefing_complete module=routine status=ok kind={} ticket={ticket}",
            in_flight.kind.as_str()
        );
        true
    }

    /// Answers `request` synchronously with `generator`.
    pub fn run_pending(&mut self, request: &BriefingRequest, generator: &dyn TextGenerator) -> bool {
        let reply = generator.generate(&request.prompt);
        self.complete(request.ticket, reply)
    }

    /// Confirms today's plans and closes the morning ritual.
    pub fn confirm_morning<S: KeyValueStore>(
        &mut self,
        store: &mut DayflowStore<S>,
        today: &DateKey,
    ) -> SaveStatus {
        self.cancel(RoutineKind::Morning);
        self.morning = MorningState::Idle;
        store.confirm_day(today)
    }

    /// Closes the evening ritual, storing `note` for today when non-blank.
    ///
    /// # Errors
    /// - `NoteError::TooLong`; the ritual stays open so the note can be
    ///   shortened.
    pub fn finish_evening<S: KeyValueStore>(
        &mut self,
        store: &mut DayflowStore<S>,
        today: &DateKey,
        note: &str,
    ) -> Result<SaveStatus, NoteError> {
        validate_note(note)?;
        let status = if note.trim().is_empty() {
            SaveStatus::Unchanged
        } else {
            store.save_daily_note(today.clone(), note)?
        };
        self.cancel(RoutineKind::Evening);
        self.evening = EveningState::Idle;
        Ok(status)
    }

    fn begin(&mut self, kind: RoutineKind, tasks: &[&Task], prompt: String) -> BriefingRequest {
        self.last_ticket += 1;
        let ticket = self.last_ticket;
        self.in_flight = Some(InFlight { ticket, kind });
        match kind {
            RoutineKind::Morning => self.morning = MorningState::Pending { ticket },
            RoutineKind::Evening => self.evening = EveningState::Pending { ticket },
        }
        debug!(
            "event=briefing_request module=routine status=start kind={} ticket={ticket} tasks={}",
            kind.as_str(),
            tasks.len()
        );
        BriefingRequest {
            ticket,
            kind,
            task_ids: tasks.iter().map(|task| task.id.clone()).collect(),
            prompt,
        }
    }

    fn cancel(&mut self, kind: RoutineKind) {
        if self.in_flight.is_some_and(|in_flight| in_flight.kind == kind) {
            self.in_flight = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EveningState, MorningState, RoutineTrigger, TriggerOutcome};
    use crate::model::date::DateKey;
    use crate::repo::kv_repo::MemoryKvStore;
    use crate::service::briefing::{GenerationError, RoutineKind, MORNING_FALLBACK, MORNING_NO_PLANS};
    use crate::service::task_store::DayflowStore;

    fn day(value: &str) -> DateKey {
        DateKey::parse(value).unwrap()
    }

    #[test]
    fn load_check_ignores_days_without_pending_plans() {
        let mut store = DayflowStore::open(MemoryKvStore::new());
        store.add_task(day("2024-06-05"), false, "manual").unwrap();
        let mut trigger = RoutineTrigger::new();
        assert_eq!(trigger.check_on_load(&store, &day("2024-06-05")), TriggerOutcome::NotNeeded);
        assert_eq!(trigger.morning(), &MorningState::Idle);
    }

    #[test]
    fn second_trigger_while_pending_is_busy() {
        let mut store = DayflowStore::open(MemoryKvStore::new());
        store.add_task(day("2024-06-05"), true, "Dentist").unwrap();
        let mut trigger = RoutineTrigger::new();
        let TriggerOutcome::Requested(request) = trigger.check_on_load(&store, &day("2024-06-05"))
        else {
            panic!("expected morning request");
        };
        assert_eq!(request.kind, RoutineKind::Morning);
        assert_eq!(trigger.loading(), Some(RoutineKind::Morning));
        assert_eq!(trigger.trigger_evening(&store, &day("2024-06-05")), TriggerOutcome::Busy);

        assert!(trigger.complete(request.ticket, Err(GenerationError::Unavailable)));
        assert_eq!(
            trigger.morning(),
            &MorningState::Shown {
                message: MORNING_FALLBACK.to_string()
            }
        );
        assert_eq!(trigger.loading(), None);
    }

    #[test]
    fn reply_after_confirmation_is_dropped() {
        let mut store = DayflowStore::open(MemoryKvStore::new());
        let today = day("2024-06-05");
        store.add_task(today.clone(), true, "Dentist").unwrap();
        let mut trigger = RoutineTrigger::new();
        let TriggerOutcome::Requested(request) = trigger.check_on_load(&store, &today) else {
            panic!("expected morning request");
        };
        trigger.confirm_morning(&mut store, &today);
        assert!(!trigger.complete(request.ticket, Ok("late".to_string())));
        assert_eq!(trigger.morning(), &MorningState::Idle);
        assert!(store.tasks()[0].is_confirmed);
    }

    #[test]
    fn manual_morning_without_tasks_shows_fixed_message() {
        let store = DayflowStore::open(MemoryKvStore::new());
        let mut trigger = RoutineTrigger::new();
        assert_eq!(trigger.trigger_morning(&store, &day("2024-06-05")), TriggerOutcome::Shown);
        assert_eq!(
            trigger.morning(),
            &MorningState::Shown {
                message: MORNING_NO_PLANS.to_string()
            }
        );
    }

    #[test]
    fn evening_note_too_long_keeps_ritual_open() {
        let mut store = DayflowStore::open(MemoryKvStore::new());
        let today = day("2024-06-05");
        let mut trigger = RoutineTrigger::new();
        let TriggerOutcome::Requested(request) = trigger.trigger_evening(&store, &today) else {
            panic!("expected evening request");
        };
        assert!(trigger.complete(request.ticket, Ok("Well done.".to_string())));

        assert!(trigger.finish_evening(&mut store, &today, &"x".repeat(141)).is_err());
        assert!(matches!(trigger.evening(), EveningState::Shown { .. }));

        trigger.finish_evening(&mut store, &today, "Good day").unwrap();
        assert_eq!(trigger.evening(), &EveningState::Idle);
        assert_eq!(store.note_for(&today), Some("Good day"));
    }
}
