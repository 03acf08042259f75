//! Flutter bridge for DayFlow core.

pub mod api;
