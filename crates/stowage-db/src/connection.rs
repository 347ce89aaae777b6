//! Database connection management.
//!
//! A [`DbConnection`] names one store and opens it lazily on first use. Its
//! identity keys per-store state such as the schema catalog.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
    time::Duration,
};

use rusqlite::Connection;
use tracing::debug;

use crate::error::{DbError, Result};

static MEMORY_STORES: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, Debug, PartialEq, Eq)]
enum Location {
    Memory,
    File(PathBuf),
}

/// A lazily opened SQLite connection.
#[derive(Debug)]
pub struct DbConnection {
    identity: String,
    location: Location,
    conn: Mutex<Option<Connection>>,
}

impl DbConnection {
    /// A connection to the database file at `path`, or a private in-memory
    /// store when `path` is `:memory:`.
    ///
    /// Relative paths are made absolute against the current directory, so
    /// `a.db` and `./a.db` share one identity.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.as_os_str() == ":memory:" {
            return Self::memory();
        }
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Self {
            identity: path.to_string_lossy().into_owned(),
            location: Location::File(path),
            conn: Mutex::new(None),
        }
    }

    /// A private in-memory store. Each call yields a distinct identity.
    pub fn memory() -> Self {
        let id = MEMORY_STORES.fetch_add(1, Ordering::Relaxed);
        Self {
            identity: format!(":memory:#{id}"),
            location: Location::Memory,
            conn: Mutex::new(None),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn is_open(&self) -> bool {
        self.conn.lock().map(|c| c.is_some()).unwrap_or(false)
    }

    /// Opens the store now instead of on first use.
    pub fn open(&self) -> Result<()> {
        self.with_conn(|_| Ok(()))
    }

    /// Runs `f` with exclusive access to the open connection, opening it
    /// first if needed.
    pub fn with_conn<R>(&self, f: impl FnOnce(&mut Connection) -> Result<R>) -> Result<R> {
        let mut guard = self.conn.lock()?;
        if guard.is_none() {
            *guard = Some(self.establish()?);
        }
        match guard.as_mut() {
            Some(conn) => f(conn),
            None => Err(DbError::Poisoned),
        }
    }

    fn establish(&self) -> Result<Connection> {
        let conn = match &self.location {
            Location::Memory => Connection::open_in_memory().map_err(|e| self.error(e))?,
            Location::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|e| self.error(e))?;
                }
                let conn = Connection::open(path).map_err(|e| self.error(e))?;
                conn.busy_timeout(Duration::from_secs(5))
                    .map_err(|e| self.error(e))?;
                conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get::<_, String>(0))
                    .map_err(|e| self.error(e))?;
                conn
            }
        };

        debug!(identity = %self.identity, "opened store");
        Ok(conn)
    }

    fn error(&self, source: impl std::error::Error + Send + Sync + 'static) -> DbError {
        DbError::Connection {
            identity: self.identity.clone(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.db");
        let db = DbConnection::new(&path);

        assert!(!db.is_open());
        assert!(!path.exists());

        db.open().unwrap();
        assert!(db.is_open());
        assert!(path.exists());
        assert_eq!(db.identity(), path.to_string_lossy());
    }

    #[test]
    fn test_relative_paths_share_identity() {
        let plain = DbConnection::new("store.db");
        let dotted = DbConnection::new("./store.db");

        assert_eq!(plain.identity(), dotted.identity());
        assert!(Path::new(plain.identity()).is_absolute());
        assert!(!plain.is_open());
    }

    #[test]
    fn test_memory_identities_are_distinct() {
        let a = DbConnection::new(":memory:");
        let b = DbConnection::memory();
        assert_ne!(a.identity(), b.identity());
        assert!(a.identity().starts_with(":memory:"));
    }

    #[test]
    fn test_connection_error_carries_identity() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"not a directory").unwrap();

        let db = DbConnection::new(blocker.join("store.db"));
        let err = db.open().unwrap_err();
        assert!(matches!(err, DbError::Connection { ref identity, .. } if identity.ends_with("store.db")));
        assert!(!db.is_open());
    }

    #[test]
    fn test_with_conn_reuses_connection() {
        let db = DbConnection::memory();
        db.with_conn(|c| {
            c.execute_batch("CREATE TABLE t (x INTEGER)")
                .map_err(|e| DbError::query("t", e))
        })
        .unwrap();

        let count: i64 = db
            .with_conn(|c| {
                c.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
                    .map_err(|e| DbError::query("t", e))
            })
            .unwrap();
        assert_eq!(count, 0);
    }
}
