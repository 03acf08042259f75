//! Domain model for tasks, daily notes and settings.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep the persisted JSON shape stable (camelCase field names).
//!
//! # Invariants
//! - Dates are fixed-width `YYYY-MM-DD` keys compared as strings.
//! - Every task is identified by an id that never changes.

pub mod date;
pub mod note;
pub mod settings;
pub mod task;
