//! Command-line front end over `dayflow_core`.
//!
//! # Responsibility
//! - Map subcommands onto store mutations, views and rituals.
//! - Keep output plain and line-oriented for scripting.

use clap::{Parser, Subcommand};
use dayflow_core::service::briefing::TextGenerator;
use dayflow_core::service::export::{month_grid, save_month_png};
use dayflow_core::service::notification::{daily_reminders, sync_reminders, NoopNotificationBridge};
use dayflow_core::service::projection::{future_view, history_view, today_view};
use dayflow_core::service::routine::{EveningState, MorningState, RoutineTrigger, TriggerOutcome};
use dayflow_core::{
    init_logging_from_config, open_db, text_generator_from_config, DateKey, DayflowConfig,
    DayflowStore, EvictionOutcome, MonthKey, SaveStatus, SqliteKvStore, Task,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "dayflow", version, about = "Daily task tracker")]
struct Cli {
    /// Database file (overrides DAYFLOW_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Write rolling logs (DAYFLOW_LOG_DIR or the temp dir)
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a task for today
    Add { text: String },
    /// Plan a task for a future day
    Plan {
        #[arg(value_parser = DateKey::parse)]
        date: DateKey,
        text: String,
    },
    /// Flip a task between done and open
    Toggle { id: String },
    /// Delete a task
    Delete { id: String },
    /// Replace the memo of a task
    Memo { id: String, memo: String },
    /// Confirmed tasks of a day and its progress
    Today {
        #[arg(long, value_parser = DateKey::parse)]
        date: Option<DateKey>,
    },
    /// Tasks planned for a day
    Future {
        #[arg(value_parser = DateKey::parse)]
        date: DateKey,
    },
    /// Day rows and totals of a month
    History {
        #[arg(value_parser = MonthKey::parse)]
        month: Option<MonthKey>,
    },
    /// Confirm the future plans of a day
    Confirm {
        #[arg(value_parser = DateKey::parse)]
        date: Option<DateKey>,
    },
    /// Store the note of a day (140 characters max)
    Note {
        text: String,
        #[arg(long, value_parser = DateKey::parse)]
        date: Option<DateKey>,
    },
    /// Delete every record of the oldest stored month
    Evict,
    /// Morning briefing over today's tasks
    Morning {
        /// Confirm today's plans after the briefing
        #[arg(long)]
        confirm: bool,
    },
    /// Evening review of today's tasks
    Evening {
        /// Note stored when closing the review
        #[arg(long)]
        note: Option<String>,
    },
    /// Daily reminders from settings and their sync status
    Reminders,
    /// Render a month grid to a PNG file
    Export {
        #[arg(value_parser = MonthKey::parse)]
        month: MonthKey,
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = DayflowConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if cli.log {
        init_logging_from_config(&config)?;
    }

    let conn = open_db(&config.db_path)?;
    let mut store = DayflowStore::open(SqliteKvStore::with_quota(
        &conn,
        config.storage_quota_bytes,
    ));
    let today = DateKey::today();

    match cli.command {
        Commands::Add { text } => add(&mut store, today, false, &text),
        Commands::Plan { date, text } => add(&mut store, date, true, &text),
        Commands::Toggle { id } => report(store.toggle_task(&id)),
        Commands::Delete { id } => report(store.delete_task(&id)),
        Commands::Memo { id, memo } => report(store.update_memo(&id, memo)),
        Commands::Today { date } => {
            let view = today_view(store.tasks(), date.as_ref().unwrap_or(&today));
            println!(
                "{} {}/{} ({}%)",
                view.date,
                view.progress.completed,
                view.progress.total,
                view.progress.rounded_percent()
            );
            print_tasks(&view.tasks);
            Ok(())
        }
        Commands::Future { date } => {
            let view = future_view(store.tasks(), &date, &today);
            if date < view.min_selectable_date {
                println!("note: plans usually start from {}", view.min_selectable_date);
            }
            print_tasks(&view.tasks);
            Ok(())
        }
        Commands::History { month } => {
            let month = month.unwrap_or_else(|| today.month());
            let view = history_view(store.tasks(), store.notes(), &month, &today);
            println!(
                "{} {}/{} ({}%)",
                view.month,
                view.summary.completed,
                view.summary.total,
                view.summary.rounded_percent()
            );
            for day in &view.days {
                println!(
                    "{} {}/{}{}",
                    day.date,
                    day.progress.completed,
                    day.progress.total,
                    day.note.map(|note| format!(" | {note}")).unwrap_or_default()
                );
            }
            Ok(())
        }
        Commands::Confirm { date } => report(store.confirm_day(date.as_ref().unwrap_or(&today))),
        Commands::Note { text, date } => {
            report(store.save_daily_note(date.unwrap_or(today), &text)?)
        }
        Commands::Evict => {
            let eviction = store.evict_oldest_month();
            match &eviction.outcome {
                EvictionOutcome::Evicted {
                    month,
                    tasks_removed,
                    notes_removed,
                } => println!("evicted {month}: {tasks_removed} tasks, {notes_removed} notes"),
                EvictionOutcome::NothingToDelete => println!("nothing to delete"),
            }
            report(eviction.save)
        }
        Commands::Morning { confirm } => {
            let generator = text_generator_from_config(&config);
            let mut trigger = RoutineTrigger::new();
            let outcome = trigger.trigger_morning(&store, &today);
            answer(&mut trigger, outcome, &*generator);
            if let MorningState::Shown { message } = trigger.morning() {
                println!("{message}");
            }
            if confirm {
                report(trigger.confirm_morning(&mut store, &today))?;
            }
            Ok(())
        }
        Commands::Evening { note } => {
            let generator = text_generator_from_config(&config);
            let mut trigger = RoutineTrigger::new();
            let outcome = trigger.trigger_evening(&store, &today);
            answer(&mut trigger, outcome, &*generator);
            if let EveningState::Shown { message } = trigger.evening() {
                println!("{message}");
            }
            if let Some(note) = note {
                report(trigger.finish_evening(&mut store, &today, &note)?)?;
            }
            Ok(())
        }
        Commands::Reminders => {
            let settings = store.settings();
            // No native shell behind a terminal.
            let status = sync_reminders(&mut NoopNotificationBridge, settings);
            println!(
                "notifications {} ({})",
                if settings.notifications_enabled { "on" } else { "off" },
                status.as_str()
            );
            for reminder in daily_reminders(settings) {
                println!(
                    "{} {} {}: {}",
                    reminder.at,
                    reminder.kind.as_str(),
                    reminder.title,
                    reminder.body
                );
            }
            Ok(())
        }
        Commands::Export { month, output } => {
            let grid = month_grid(store.tasks(), store.notes(), &month);
            save_month_png(&grid, &output)?;
            println!("wrote {}", output.display());
            Ok(())
        }
    }
}

fn add(
    store: &mut DayflowStore<SqliteKvStore<'_>>,
    date: DateKey,
    is_future_plan: bool,
    text: &str,
) -> Result<(), Box<dyn Error>> {
    let (id, status) = store
        .add_task(date, is_future_plan, text)
        .ok_or("task text cannot be empty")?;
    println!("{id}");
    report(status)
}

fn answer(trigger: &mut RoutineTrigger, outcome: TriggerOutcome, generator: &dyn TextGenerator) {
    if let TriggerOutcome::Requested(request) = outcome {
        trigger.run_pending(&request, generator);
    }
}

fn report(status: SaveStatus) -> Result<(), Box<dyn Error>> {
    match status {
        SaveStatus::Saved => Ok(()),
        SaveStatus::Unchanged => {
            println!("nothing changed");
            Ok(())
        }
        SaveStatus::Failed => {
            Err("storage is full; run `dayflow evict` to free the oldest month".into())
        }
    }
}

fn print_tasks(tasks: &[&Task]) {
    for task in tasks {
        let mark = if task.completed { 'x' } else { ' ' };
        let pending = if task.is_confirmed { "" } else { " (unconfirmed)" };
        println!("[{mark}] {} {}{pending}", task.id, task.text);
    }
}
