//! Key-value store contracts and implementations.
//!
//! # Responsibility
//! - Provide the string key to string value storage the persistence adapter
//!   writes through.
//! - Report quota exhaustion as a distinct error so callers can evict.
//!
//! # Invariants
//! - `set` replaces the whole value of a key or leaves it untouched.
//! - A quota, when configured, bounds the summed UTF-8 byte length of all
//!   keys and values.

use crate::db::DbError;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value store error.
#[derive(Debug)]
pub enum StoreError {
    /// Writing `key` would exceed the configured storage quota.
    QuotaExceeded {
        key: String,
        requested_bytes: u64,
        quota_bytes: Option<u64>,
    },
    Db(DbError),
}

impl StoreError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    /// Stable short code for log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::Db(_) => "db_error",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuotaExceeded {
                key,
                requested_bytes,
                quota_bytes: Some(quota),
            } => write!(
                f,
                "storage quota exceeded writing `{key}`: {requested_bytes} bytes requested, quota {quota}"
            ),
            Self::QuotaExceeded { key, .. } => {
                write!(f, "storage full while writing `{key}`")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::QuotaExceeded { .. } => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Minimal key-value contract backing the persistence adapter.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&mut self, key: &str) -> StoreResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &mut T {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }
}

fn entry_bytes(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

/// SQLite-backed key-value store over the `kv_entries` table.
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
    quota_bytes: Option<u64>,
}

impl<'conn> SqliteKvStore<'conn> {
    /// Wraps a migrated connection without a byte quota.
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            quota_bytes: None,
        }
    }

    /// Wraps a migrated connection with an optional byte quota.
    pub fn with_quota(conn: &'conn Connection, quota_bytes: Option<u64>) -> Self {
        Self { conn, quota_bytes }
    }

    /// Summed key and value bytes, excluding `except_key` when given.
    pub fn used_bytes(&self, except_key: Option<&str>) -> StoreResult<u64> {
        let used: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
             FROM kv_entries
             WHERE ?1 IS NULL OR key <> ?1;",
            params![except_key],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(used).unwrap_or(0))
    }
}

impl KeyValueStore for SqliteKvStore<'_> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        if let Some(quota) = self.quota_bytes {
            let requested_bytes = self.used_bytes(Some(key))? + entry_bytes(key, value);
            if requested_bytes > quota {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    requested_bytes,
                    quota_bytes: Some(quota),
                });
            }
        }

        let result = self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        );

        match result {
            Ok(_) => Ok(()),
            Err(err) if err.sqlite_error_code() == Some(ErrorCode::DiskFull) => {
                Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    requested_bytes: entry_bytes(key, value),
                    quota_bytes: self.quota_bytes,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// `SqliteKvStore` that owns its connection, for stores kept across calls.
pub struct OwnedSqliteKvStore {
    conn: Connection,
    quota_bytes: Option<u64>,
}

impl OwnedSqliteKvStore {
    pub fn with_quota(conn: Connection, quota_bytes: Option<u64>) -> Self {
        Self { conn, quota_bytes }
    }

    fn borrowed(&self) -> SqliteKvStore<'_> {
        SqliteKvStore::with_quota(&self.conn, self.quota_bytes)
    }
}

impl KeyValueStore for OwnedSqliteKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.borrowed().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.borrowed().set(key, value)
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.borrowed().remove(key)
    }
}

/// In-process key-value store with an optional byte quota.
#[derive(Debug, Default, Clone)]
pub struct MemoryKvStore {
    entries: HashMap<String, String>,
    quota_bytes: Option<u64>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            entries: HashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Changes the quota; existing entries are kept even when over it.
    pub fn set_quota(&mut self, quota_bytes: Option<u64>) {
        self.quota_bytes = quota_bytes;
    }

    pub fn used_bytes(&self) -> u64 {
        self.entries
            .iter()
            .map(|(key, value)| entry_bytes(key, value))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        if let Some(quota) = self.quota_bytes {
            let others: u64 = self
                .entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| entry_bytes(existing, stored))
                .sum();
            let requested_bytes = others + entry_bytes(key, value);
            if requested_bytes > quota {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    requested_bytes,
                    quota_bytes: Some(quota),
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStore, MemoryKvStore, OwnedSqliteKvStore, SqliteKvStore};
    use crate::db::open_db_in_memory;

    #[test]
    fn memory_store_rejects_write_over_quota_and_keeps_old_value() {
        let mut store = MemoryKvStore::with_quota(10);
        store.set("k", "12345").unwrap();
        let err = store.set("k", "1234567890").unwrap_err();
        assert!(err.is_quota_exceeded());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("12345"));
    }

    #[test]
    fn memory_store_quota_ignores_value_being_replaced() {
        let mut store = MemoryKvStore::with_quota(8);
        store.set("k", "1234567").unwrap();
        store.set("k", "7654321").unwrap();
        assert_eq!(store.used_bytes(), 8);
    }

    #[test]
    fn sqlite_store_upserts_and_removes() {
        let conn = open_db_in_memory().unwrap();
        let mut store = SqliteKvStore::new(&conn);
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "one").unwrap();
        store.set("a", "two").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("two"));
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn sqlite_store_enforces_quota() {
        let conn = open_db_in_memory().unwrap();
        let mut store = SqliteKvStore::with_quota(&conn, Some(12));
        store.set("a", "12345").unwrap();
        store.set("b", "1234").unwrap();
        let err = store.set("c", "123").unwrap_err();
        assert!(err.is_quota_exceeded());
        assert_eq!(store.used_bytes(None).unwrap(), 11);
        assert_eq!(store.get("c").unwrap(), None);
    }

    #[test]
    fn owned_store_keeps_quota_and_data_on_its_connection() {
        let mut store = OwnedSqliteKvStore::with_quota(open_db_in_memory().unwrap(), Some(8));
        store.set("a", "1234567").unwrap();
        assert!(store.set("b", "1").unwrap_err().is_quota_exceeded());
        store.remove("a").unwrap();
        store.set("b", "1").unwrap();
        assert_eq!(store.get("b").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("a").unwrap(), None);
    }
}
