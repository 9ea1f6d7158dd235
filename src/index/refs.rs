//! Ref-observation index.
//!
//! Append-only log of every ref tip ever seen during a fetch: which object
//! id, advertised under which name, by which member repository, when. The
//! same tip may recur across fetch rounds; each recurrence is a distinct row.
//! Durability of the objects themselves is the job of the synthetic
//! `refs/uniq/<sha>` references, not of this index.

use std::path::Path;

use rusqlite::{Connection, params};

use super::IndexError;

const SCHEMA: &str = "\
    CREATE TABLE heads (
        sha TEXT NOT NULL,
        repository TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        name TEXT NOT NULL
    );
    CREATE INDEX heads_repository ON heads (repository);
    CREATE INDEX heads_timestamp ON heads (timestamp);";

const INSERT: &str = "INSERT INTO heads (sha, repository, timestamp, name) VALUES (?1, ?2, ?3, ?4)";

/// Sidecar observation log for one family repository.
pub struct RefsIndex {
    conn: Connection,
}

impl RefsIndex {
    /// Open the index at `path`, creating the table and both secondary
    /// indexes when the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        let is_new = !path.exists();
        let init_err = |source| IndexError::Init {
            path: path.to_owned(),
            source,
        };

        let conn = Connection::open(path).map_err(init_err)?;
        if is_new {
            conn.execute_batch(SCHEMA).map_err(init_err)?;
        }

        Ok(RefsIndex { conn })
    }

    /// Append one observation. No deduplication.
    ///
    /// `timestamp` is the already-formatted UTC ISO-8601-basic string
    /// (`YYYYMMDDThhmmssZ`); `name` is the ref name exactly as advertised.
    pub fn record(
        &self,
        sha: &str,
        repository: &str,
        timestamp: &str,
        name: &str,
    ) -> Result<(), IndexError> {
        let mut stmt = self.conn.prepare_cached(INSERT).map_err(IndexError::Write)?;
        stmt.execute(params![sha, repository, timestamp, name])
            .map_err(IndexError::Write)?;
        Ok(())
    }
}
