//! Repo catalog: member name → family main.
//!
//! The catalog answers exactly one question for the change monitor: is this
//! repository monitored, and if so which family does it belong to. It is
//! truncated at every process start — an entry only ever means "fetched at
//! least once since this monitor instance started". Stale entries from a
//! previous run must never cause a spurious match.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use super::IndexError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "\
    CREATE TABLE repos (
        name TEXT NOT NULL,
        main TEXT NOT NULL
    );
    CREATE INDEX repos_name ON repos (name);";

/// Handle to the catalog database file.
///
/// The value owns only the path; the bootstrap thread takes a `writer()` and
/// the dispatcher thread a `reader()`, each with its own connection, so the
/// two sides never share a handle. SQLite's own locking arbitrates between
/// them.
pub struct RepoCatalog {
    db_path: PathBuf,
}

impl RepoCatalog {
    /// Delete any previous catalog at `path` and create a fresh one.
    pub fn create(path: &Path) -> Result<Self, IndexError> {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(IndexError::Truncate {
                    path: path.to_owned(),
                    source,
                });
            }
        }

        let init_err = |source| IndexError::Init {
            path: path.to_owned(),
            source,
        };
        let conn = Connection::open(path).map_err(init_err)?;
        conn.execute_batch(SCHEMA).map_err(init_err)?;

        Ok(RepoCatalog {
            db_path: path.to_owned(),
        })
    }

    pub fn writer(&self) -> Result<CatalogWriter, IndexError> {
        let init_err = |source| IndexError::Init {
            path: self.db_path.clone(),
            source,
        };
        let conn = Connection::open(&self.db_path).map_err(init_err)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(init_err)?;
        Ok(CatalogWriter { conn })
    }

    pub fn reader(&self) -> Result<CatalogReader, IndexError> {
        let init_err = |source| IndexError::Init {
            path: self.db_path.clone(),
            source,
        };
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(init_err)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(init_err)?;
        Ok(CatalogReader { conn })
    }
}

pub struct CatalogWriter {
    conn: Connection,
}

impl CatalogWriter {
    /// Record that `name` belongs to the family rooted at `main`.
    pub fn insert(&self, name: &str, main: &str) -> Result<(), IndexError> {
        let mut stmt = self
            .conn
            .prepare_cached("INSERT INTO repos (name, main) VALUES (?1, ?2)")
            .map_err(IndexError::Write)?;
        stmt.execute(params![name, main]).map_err(IndexError::Write)?;
        Ok(())
    }
}

pub struct CatalogReader {
    conn: Connection,
}

impl CatalogReader {
    /// Point lookup by member name. `Ok(None)` means not monitored, which is
    /// distinct from a lookup failure.
    pub fn lookup_main(&self, name: &str) -> Result<Option<String>, IndexError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT main FROM repos WHERE name = ?1")
            .map_err(IndexError::Lookup)?;
        stmt.query_row(params![name], |row| row.get::<_, String>(0))
            .optional()
            .map_err(IndexError::Lookup)
    }
}
