//! Startup: expand the config into the monitored set, then sweep every
//! family once.

use std::path::Path;

use crate::archive::FamilyRepository;
use crate::config::RepoEntry;
use crate::hosting::{HostClient, HostError, enumerate};
use crate::index::CatalogWriter;
use crate::Result;

/// Expand config entries into the list of family mains.
///
/// `repo` entries pass through; `owner` entries expand to every non-fork
/// repository of that owner. Failures here are fatal: without the monitored
/// set there is nothing to run.
pub fn expand_monitored_set(
    entries: &[RepoEntry],
    client: &HostClient,
) -> std::result::Result<Vec<String>, HostError> {
    let mut mains = Vec::new();
    for entry in entries {
        match entry {
            RepoEntry::Repo(name) => mains.push(name.clone()),
            RepoEntry::Owner(owner) => mains.extend(enumerate::list_owner_repos(client, owner)?),
        }
    }
    Ok(mains)
}

/// Fetch every family once: the main, then each of its forks.
///
/// A catalog entry is only written after the member fetched successfully,
/// so the catalog never names a repository this run has not archived. Every
/// failure is logged and skipped; the sweep always runs to the end.
pub fn initial_sweep(
    data_dir: &Path,
    mains: &[String],
    writer: &CatalogWriter,
    client: &HostClient,
) {
    for main in mains {
        tracing::info!("doing the startup fetch of {main}...");
        if let Err(e) = sweep_family(data_dir, main, writer, client) {
            tracing::warn!("startup fetch of {main} failed: {e}");
        }
    }
}

fn sweep_family(
    data_dir: &Path,
    main: &str,
    writer: &CatalogWriter,
    client: &HostClient,
) -> Result<()> {
    let mut family = FamilyRepository::open(data_dir, main)?;

    family.fetch(main, true)?;
    writer.insert(main, main)?;

    let forks = enumerate::list_forks(client, main)?;
    for (i, fork) in forks.iter().enumerate() {
        tracing::info!("[{} / {}] {fork}", i + 1, forks.len());
        if let Err(e) = sweep_fork(&mut family, writer, fork, main) {
            tracing::warn!("startup fetch of {fork} failed: {e}");
        }
    }

    // Dropping the family closes the git handle and the index.
    Ok(())
}

fn sweep_fork(
    family: &mut FamilyRepository,
    writer: &CatalogWriter,
    fork: &str,
    main: &str,
) -> Result<()> {
    family.fetch(fork, false)?;
    writer.insert(fork, main)?;
    Ok(())
}
