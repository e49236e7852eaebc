//! Key/value state store contracts with SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Persist whole serialized records under stable keys.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Records are rewritten wholesale; there is no partial update.
//! - `save_all` writes every entry or none of them.
//! - A missing key reads as `None`, never as an error.

use crate::db::{open_db, open_db_in_memory, DbError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type StateResult<T> = Result<T, StateError>;

/// Persistence failure for the key/value state store.
#[derive(Debug)]
pub enum StateError {
    Db(DbError),
    Serialization { key: String, source: serde_json::Error },
    Unavailable(String),
}

impl Display for StateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization { key, source } => {
                write!(f, "invalid state record `{key}`: {source}")
            }
            Self::Unavailable(reason) => write!(f, "state store unavailable: {reason}"),
        }
    }
}

impl Error for StateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization { source, .. } => Some(source),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StateError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StateError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence collaborator for preferences, snapshots and durable slices.
pub trait StateStore {
    fn load(&self, key: &str) -> StateResult<Option<String>>;
    fn save(&self, key: &str, value: &str) -> StateResult<()>;
    /// Writes a batch of records atomically.
    fn save_all(&self, entries: &[(String, String)]) -> StateResult<()>;
    fn remove(&self, key: &str) -> StateResult<()>;
}

/// Reads and deserializes one JSON record.
pub fn load_json<T: DeserializeOwned>(store: &dyn StateStore, key: &str) -> StateResult<Option<T>> {
    let Some(raw) = store.load(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StateError::Serialization {
            key: key.to_string(),
            source,
        })
}

/// Serializes and writes one JSON record, replacing any previous value.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn StateStore,
    key: &str,
    value: &T,
) -> StateResult<()> {
    let (key, raw) = json_entry(key, value)?;
    store.save(&key, &raw)
}

/// Serializes one record into a `(key, value)` pair for [`StateStore::save_all`].
pub fn json_entry<T: Serialize + ?Sized>(key: &str, value: &T) -> StateResult<(String, String)> {
    let raw = serde_json::to_string(value).map_err(|source| StateError::Serialization {
        key: key.to_string(),
        source,
    })?;
    Ok((key.to_string(), raw))
}

/// SQLite-backed state store over the `kv_state` table.
pub struct SqliteStateStore {
    conn: rusqlite::Connection,
}

impl SqliteStateStore {
    /// Wraps a connection that already has migrations applied.
    pub fn new(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: impl AsRef<Path>) -> StateResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> StateResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Returns stored keys in ascending order.
    pub fn keys(&self) -> StateResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv_state ORDER BY key ASC;")?;
        let mut rows = stmt.query([])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(row.get(0)?);
        }
        Ok(keys)
    }
}

impl StateStore for SqliteStateStore {
    fn load(&self, key: &str) -> StateResult<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM kv_state WHERE key = ?1;")?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn save(&self, key: &str, value: &str) -> StateResult<()> {
        upsert(&self.conn, key, value)
    }

    /// Runs the batch in one SQLite transaction; a failed write rolls back
    /// every earlier write of the batch.
    fn save_all(&self, entries: &[(String, String)]) -> StateResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (key, value) in entries {
            upsert(&tx, key, value)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StateResult<()> {
        self.conn
            .execute("DELETE FROM kv_state WHERE key = ?1;", [key])?;
        Ok(())
    }
}

fn upsert(conn: &rusqlite::Connection, key: &str, value: &str) -> StateResult<()> {
    conn.execute(
        "INSERT INTO kv_state (key, value, updated_at)
         VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at;",
        [key, value],
    )?;
    Ok(())
}

/// Volatile state store; can simulate an outage with `set_available(false)`.
#[derive(Debug)]
pub struct MemoryStateStore {
    entries: RefCell<BTreeMap<String, String>>,
    available: Cell<bool>,
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
            available: Cell::new(true),
        }
    }
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn ensure_available(&self) -> StateResult<()> {
        if self.available.get() {
            Ok(())
        } else {
            Err(StateError::Unavailable("memory store offline".to_string()))
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, key: &str) -> StateResult<Option<String>> {
        self.ensure_available()?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> StateResult<()> {
        self.ensure_available()?;
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn save_all(&self, entries: &[(String, String)]) -> StateResult<()> {
        self.ensure_available()?;
        let mut stored = self.entries.borrow_mut();
        for (key, value) in entries {
            stored.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StateResult<()> {
        self.ensure_available()?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
