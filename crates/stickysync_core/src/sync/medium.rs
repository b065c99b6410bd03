//! Shared medium adapters.
//!
//! A shared medium holds exactly one published snapshot payload. Publishing
//! overwrites it (last writer wins); fetching returns whatever is currently
//! published. Adapters never interpret the payload.

use crate::db::{open_db, DbError};
use crate::storage::kv::KvStore;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Fixed key the SQLite medium stores the snapshot under.
pub const SHARED_SNAPSHOT_KEY: &str = "stickysync.shared_snapshot";

#[derive(Debug)]
pub enum MediumError {
    Db(DbError),
    /// A previous holder of the medium lock panicked.
    Poisoned,
}

impl Display for MediumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Poisoned => write!(f, "shared medium lock is poisoned"),
        }
    }
}

impl Error for MediumError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Poisoned => None,
        }
    }
}

impl From<DbError> for MediumError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Single-slot last-writer-wins store for serialized snapshots.
pub trait SharedMedium {
    /// Replaces the published payload.
    fn publish(&self, payload: &str) -> Result<(), MediumError>;
    /// Returns the currently published payload, if any.
    fn fetch(&self) -> Result<Option<String>, MediumError>;
}

impl<M: SharedMedium + ?Sized> SharedMedium for Arc<M> {
    fn publish(&self, payload: &str) -> Result<(), MediumError> {
        (**self).publish(payload)
    }

    fn fetch(&self) -> Result<Option<String>, MediumError> {
        (**self).fetch()
    }
}

/// Process-local medium. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMedium {
    slot: Arc<Mutex<Option<String>>>,
}

impl InMemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SharedMedium for InMemoryMedium {
    fn publish(&self, payload: &str) -> Result<(), MediumError> {
        let mut slot = self.slot.lock().map_err(|_| MediumError::Poisoned)?;
        *slot = Some(payload.to_string());
        Ok(())
    }

    fn fetch(&self) -> Result<Option<String>, MediumError> {
        let slot = self.slot.lock().map_err(|_| MediumError::Poisoned)?;
        Ok(slot.clone())
    }
}

/// Medium backed by the `kv_entries` table of a SQLite database file.
///
/// Separate instances opened on the same file (in this or other processes)
/// observe each other's publications.
pub struct SqliteMedium {
    conn: Mutex<Connection>,
}

impl SqliteMedium {
    /// Opens the database file, applying migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MediumError> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Removes the published snapshot.
    pub fn clear(&self) -> Result<(), MediumError> {
        let conn = self.conn.lock().map_err(|_| MediumError::Poisoned)?;
        KvStore::new(&conn).delete(SHARED_SNAPSHOT_KEY)?;
        Ok(())
    }
}

impl SharedMedium for SqliteMedium {
    fn publish(&self, payload: &str) -> Result<(), MediumError> {
        let conn = self.conn.lock().map_err(|_| MediumError::Poisoned)?;
        KvStore::new(&conn).put(SHARED_SNAPSHOT_KEY, payload)?;
        Ok(())
    }

    fn fetch(&self) -> Result<Option<String>, MediumError> {
        let conn = self.conn.lock().map_err(|_| MediumError::Poisoned)?;
        Ok(KvStore::new(&conn).get(SHARED_SNAPSHOT_KEY)?)
    }
}
