//! Core use-case services.
//!
//! # Responsibility
//! - Own in-memory state and route every mutation through persistence.
//! - Derive read-only views, ritual state and exports from that state.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod briefing;
pub mod eviction;
pub mod export;
pub mod notification;
pub mod projection;
pub mod routine;
pub mod task_store;
