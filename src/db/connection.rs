//! Database handle and the process-wide accessor.
//!
//! # Invariants
//! - At most one cached handle exists per process, created on first use.
//! - Returned handles have `foreign_keys=ON` and the `users` table in place.
//! - A failed construction caches nothing.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{error, info};
use once_cell::sync::OnceCell;
use rusqlite::Connection;

use super::error::{DbError, DbResult};
use super::users;
use crate::config::AppConfig;
use crate::models::{NewUser, User};

static DATABASE: OnceCell<Arc<Database>> = OnceCell::new();

/// Shared handle over one SQLite connection. Queries take the lock for their
/// own duration only, so callers on different threads interleave per query.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

/// Return the process-wide database handle, opening it on first use.
///
/// Concurrent first calls block on the cell until one of them has finished
/// construction, so exactly one connection is ever opened. Errors are handed
/// back to the caller and leave the cell empty.
pub fn get_database(config: &AppConfig) -> DbResult<Arc<Database>> {
    let requested = config.db_path();
    let database = DATABASE.get_or_try_init(|| Database::open(&requested).map(Arc::new))?;

    match database.path() {
        Some(open) if open == requested.as_path() => Ok(Arc::clone(database)),
        open => Err(DbError::AlreadyOpen {
            open: open.map(Path::to_path_buf).unwrap_or_default(),
            requested,
        }),
    }
}

impl Database {
    /// Open (or create) the SQLite file at `path`, creating parent folders.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=file");

        let result = create_parent_dir(path)
            .and_then(|()| Connection::open(path).map_err(DbError::from))
            .and_then(|conn| bootstrap_connection(&conn).map(|()| conn));

        match result {
            Ok(conn) => {
                info!(
                    "event=db_open module=db status=ok mode=file duration_ms={} path={}",
                    started_at.elapsed().as_millis(),
                    path.display()
                );
                Ok(Self {
                    conn: Mutex::new(conn),
                    path: Some(path.to_path_buf()),
                })
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode=file duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Open a throwaway database that lives as long as the handle.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        bootstrap_connection(&conn)?;
        info!("event=db_open module=db status=ok mode=memory");
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// File backing this handle; `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` with exclusive access to the underlying connection.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> DbResult<T>) -> DbResult<T> {
        let conn = self.conn.lock().map_err(|_| DbError::Poisoned)?;
        f(&conn)
    }

    pub fn insert_users(&self, users: &[User]) -> DbResult<()> {
        self.with_conn(|conn| users::insert_users(conn, users))
    }

    pub fn create_user(&self, new_user: &NewUser) -> DbResult<User> {
        self.with_conn(|conn| users::create_user(conn, new_user))
    }

    pub fn fetch_users(&self) -> DbResult<Vec<User>> {
        self.with_conn(users::fetch_users)
    }

    pub fn delete_user(&self, id: i64) -> DbResult<bool> {
        self.with_conn(|conn| users::delete_user(conn, id))
    }

    pub fn count_users(&self) -> DbResult<i64> {
        self.with_conn(users::count_users)
    }
}

fn create_parent_dir(path: &Path) -> DbResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| DbError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn bootstrap_connection(conn: &Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("users.sqlite");

        let database = Database::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(database.path(), Some(path.as_path()));
        assert_eq!(database.count_users().unwrap(), 0);
    }

    #[test]
    fn open_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = Database::open(blocker.join("users.sqlite")).err().unwrap();
        assert!(matches!(err, DbError::Io { .. }));
    }
}
