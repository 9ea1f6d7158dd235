//! Durable indexes: the per-family ref-observation log and the run-scoped
//! repo catalog. Both are small SQLite tables; the object store itself lives
//! in git (see `archive`).

mod catalog;
mod refs;

use std::path::PathBuf;

use thiserror::Error;

pub use catalog::{CatalogReader, CatalogWriter, RepoCatalog};
pub use refs::RefsIndex;

use crate::error::Transience;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IndexError {
    #[error("failed to open index {path}: {source}")]
    Init {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to truncate catalog {path}: {source}")]
    Truncate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index write failed: {0}")]
    Write(#[source] rusqlite::Error),

    #[error("catalog lookup failed: {0}")]
    Lookup(#[source] rusqlite::Error),
}

impl IndexError {
    /// Whether retrying may succeed.
    pub fn transience(&self) -> Transience {
        match self {
            IndexError::Init { .. } | IndexError::Truncate { .. } => Transience::Permanent,
            IndexError::Write(_) | IndexError::Lookup(_) => Transience::Retryable,
        }
    }
}
