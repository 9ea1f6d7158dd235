//! Archive error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::error::Transience;
use crate::index::IndexError;

/// Errors that can occur while opening or fetching into a family repository.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ArchiveError {
    #[error("failed to open repository at {0}: {1}")]
    OpenRepo(PathBuf, #[source] git2::Error),

    #[error("failed to initialise bare repository at {0}: {1}")]
    InitRepo(PathBuf, #[source] git2::Error),

    #[error("failed to set repository config: {0}")]
    Config(#[source] git2::Error),

    #[error("failed to enumerate references: {0}")]
    ListRefs(#[source] git2::Error),

    #[error("fetch failed: {0}")]
    Fetch(#[source] git2::Error),

    #[error("failed to create reference: {0}")]
    CreateRef(#[source] git2::Error),

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl ArchiveError {
    /// Whether retrying may succeed.
    ///
    /// Fetches go over the network and are worth retrying; everything that
    /// touches only the local store is not.
    pub fn transience(&self) -> Transience {
        match self {
            ArchiveError::Fetch(_) => Transience::Retryable,

            ArchiveError::OpenRepo(_, _)
            | ArchiveError::InitRepo(_, _)
            | ArchiveError::Config(_)
            | ArchiveError::ListRefs(_)
            | ArchiveError::CreateRef(_) => Transience::Permanent,

            ArchiveError::Index(e) => e.transience(),
        }
    }
}
