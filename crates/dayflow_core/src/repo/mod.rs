//! Storage layer: key-value contracts and the record persistence adapter.
//!
//! # Responsibility
//! - Isolate SQLite and in-memory storage details from the task store.
//! - Keep the three persisted records behind one adapter.
//!
//! # Invariants
//! - Stores surface quota exhaustion as `StoreError::QuotaExceeded`.
//! - The persistence adapter never propagates store or parse errors.

pub mod kv_repo;
pub mod persistence;
