//! Morning briefing and evening review text generation.
//!
//! # Responsibility
//! - Define the narrow contract of the external text-generation service.
//! - Build prompts from task lists and apply fixed fallbacks.
//!
//! # Invariants
//! - Generation failures never escape: callers always get a message.
//! - Task memos are only sent for completed tasks in the evening review.

use crate::model::task::Task;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MORNING_FALLBACK: &str = "Ready to tackle the day?";
pub const MORNING_EMPTY_REPLY: &str = "Let's have a productive day!";
pub const MORNING_NO_PLANS: &str =
    "Good morning! Nothing is planned for today yet. Shall we make a plan?";
pub const EVENING_FALLBACK: &str = "Great job tracking your tasks today!";
pub const EVENING_EMPTY_REPLY: &str = "Great effort today! Keep pushing forward.";

/// Which ritual a message is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineKind {
    Morning,
    Evening,
}

impl RoutineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Evening => "evening",
        }
    }

    /// Fallback used when the generator fails.
    pub fn fallback(self) -> &'static str {
        match self {
            Self::Morning => MORNING_FALLBACK,
            Self::Evening => EVENING_FALLBACK,
        }
    }

    /// Fallback used when the generator returns blank text.
    pub fn empty_reply(self) -> &'static str {
        match self {
            Self::Morning => MORNING_EMPTY_REPLY,
            Self::Evening => EVENING_EMPTY_REPLY,
        }
    }
}

/// Text-generation failure.
#[derive(Debug)]
pub enum GenerationError {
    /// No credentials configured for the hosted model.
    Unavailable,
    Transport(String),
    /// Non-success HTTP status with response body excerpt.
    Status { code: u16, body: String },
    InvalidResponse(String),
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "text generation is not configured"),
            Self::Transport(message) => write!(f, "text generation transport error: {message}"),
            Self::Status { code, body } => {
                write!(f, "text generation returned status {code}: {body}")
            }
            Self::InvalidResponse(message) => {
                write!(f, "text generation response invalid: {message}")
            }
        }
    }
}

impl Error for GenerationError {}

/// External service producing a short natural-language reply.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).generate(prompt)
    }
}

/// Generator used when no hosted model is configured; always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableTextGenerator;

impl TextGenerator for UnavailableTextGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Unavailable)
    }
}

/// Builds the one-sentence morning motivation prompt.
pub fn morning_prompt(tasks: &[&Task], user_name: &str) -> String {
    let task_list = tasks
        .iter()
        .map(|task| format!("- {}", task.text))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are a helpful assistant for {user_name}.\n\
         It is morning. These tasks are scheduled for today:\n\
         {task_list}\n\n\
         Reply with one short, motivating sentence to start the day."
    )
}

/// Builds the end-of-day review prompt.
pub fn evening_prompt(tasks: &[&Task], user_name: &str) -> String {
    let completed = tasks
        .iter()
        .filter(|task| task.completed)
        .map(|task| format!("- [Completed] {} (Memo: {})", task.text, task.memo))
        .collect::<Vec<_>>()
        .join("\n");
    let incomplete = tasks
        .iter()
        .filter(|task| !task.completed)
        .map(|task| format!("- [Not Done] {}", task.text))
        .collect::<Vec<_>>()
        .join("\n");
    let done = tasks.iter().filter(|task| task.completed).count();
    let rate = if tasks.is_empty() {
        0
    } else {
        (done as f64 / tasks.len() as f64 * 100.0).round() as u32
    };
    format!(
        "You are a friendly, encouraging productivity assistant for {user_name}.\n\
         Today's task list:\n\
         {completed}\n\
         {incomplete}\n\n\
         Completion rate: {rate}%\n\n\
         Write a short, warm and constructive review of the day in at most three sentences. \
         Celebrate what went well and gently encourage moving forward on missed tasks. \
         Use plain text only, without markdown."
    )
}

/// Runs `generator` and maps failures or blank replies to fixed fallbacks.
pub fn generate_message(generator: &dyn TextGenerator, kind: RoutineKind, prompt: &str) -> String {
    resolve_reply(kind, generator.generate(prompt))
}

/// Maps a raw generator result to the message shown to the user.
pub fn resolve_reply(kind: RoutineKind, reply: Result<String, GenerationError>) -> String {
    match reply {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => kind.empty_reply().to_string(),
        Err(err) => {
            warn!(
                "event=briefing_generate module=briefing status=fallback kind={} error={err}",
                kind.as_str()
            );
            kind.fallback().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        evening_prompt, generate_message, morning_prompt, GenerationError, RoutineKind,
        TextGenerator, UnavailableTextGenerator, EVENING_EMPTY_REPLY, MORNING_FALLBACK,
    };
    use crate::model::date::DateKey;
    use crate::model::task::Task;

    struct Fixed(&'static str);

    impl TextGenerator for Fixed {
        fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    fn task(text: &str, completed: bool) -> Task {
        let mut task = Task::new(DateKey::parse("2024-06-01").unwrap(), false, text).unwrap();
        task.completed = completed;
        task.memo = "went fine".to_string();
        task
    }

    #[test]
    fn failure_uses_kind_fallback() {
        let message = generate_message(&UnavailableTextGenerator, RoutineKind::Morning, "p");
        assert_eq!(message, MORNING_FALLBACK);
    }

    #[test]
    fn blank_reply_uses_empty_reply_text() {
        let message = generate_message(&Fixed("  \n"), RoutineKind::Evening, "p");
        assert_eq!(message, EVENING_EMPTY_REPLY);
        let trimmed = generate_message(&Fixed(" Nice work. "), RoutineKind::Evening, "p");
        assert_eq!(trimmed, "Nice work.");
    }

    #[test]
    fn prompts_list_tasks_and_rate() {
        let done = task("Run", true);
        let open = task("Read", false);
        let tasks = vec![&done, &open];
        let morning = morning_prompt(&tasks, "Mina");
        assert!(morning.contains("- Run"));
        assert!(morning.contains("Mina"));

        let evening = evening_prompt(&tasks, "Mina");
        assert!(evening.contains("[Completed] Run (Memo: went fine)"));
        assert!(evening.contains("[Not Done] Read"));
        assert!(evening.contains("Completion rate: 50%"));
        assert!(evening_prompt(&[], "Mina").contains("Completion rate: 0%"));
    }
}
