//! Family repository: the fetch engine.
//!
//! One bare object store holds the upstream main and all of its forks.
//! Fetching a member merges its objects into the store; every advertised
//! head is recorded in the sidecar [`RefsIndex`], and any object id seen for
//! the first time gets a synthetic `refs/uniq/<sha>` reference so it stays
//! reachable no matter how often fork branches shadow each other under
//! `refs/*`. History that is later rewritten or deleted upstream therefore
//! remains anchored locally and attributable to the member and moment it was
//! seen.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use git2::{Direction, ErrorCode, FetchOptions, Oid, Repository};
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

use super::ArchiveError;
use super::progress;
use crate::index::RefsIndex;

const CLONE_URL_BASE: &str = "https://github.com";
const REPO_DIR_PREFIX: &str = "github.com";

/// Force all remote refs into local refs under the same names. The `+` is
/// required: fork branches shadow each other's names, which is tolerated
/// because durability comes from `refs/uniq/<sha>`, not from `refs/*`.
/// Covering all of `refs/*` (not just heads) captures tagged-only objects.
const REFSPEC: &str = "+refs/*:refs/*";

const UNIQ_REF_PREFIX: &str = "refs/uniq/";

/// ISO 8601 basic format, UTC.
const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year][month][day]T[hour][minute][second]Z");

/// A family's bare object store plus its observation index.
///
/// Not safe for concurrent use: the git handle, the `known_tips` set, and
/// the index connection are all single-caller. Serialisation per family is
/// the caller's responsibility. Dropping the value closes both the git
/// handle and the index.
pub struct FamilyRepository {
    path: PathBuf,
    repo: Repository,
    refs_index: RefsIndex,
    known_tips: HashSet<Oid>,
}

impl FamilyRepository {
    /// Open the store for family root `name` under `data_dir`, initialising
    /// a new bare repository if none exists.
    ///
    /// `known_tips` is seeded from the target of every existing reference,
    /// and `gc.auto` is pinned to `0`: force-updated refs must never orphan
    /// (and then prune) objects that are the only anchor for a historical
    /// tip from another fork.
    pub fn open(data_dir: &Path, name: &str) -> Result<Self, ArchiveError> {
        let path = data_dir.join(REPO_DIR_PREFIX).join(name);

        let repo = match Repository::open_bare(&path) {
            Ok(repo) => repo,
            Err(e) if e.code() == ErrorCode::NotFound => {
                Repository::init_bare(&path).map_err(|e| ArchiveError::InitRepo(path.clone(), e))?
            }
            Err(e) => return Err(ArchiveError::OpenRepo(path, e)),
        };

        let mut sidecar = path.clone().into_os_string();
        sidecar.push(".sqlite");
        let refs_index = RefsIndex::open(Path::new(&sidecar))?;

        repo.config()
            .and_then(|mut config| config.set_str("gc.auto", "0"))
            .map_err(ArchiveError::Config)?;

        let mut known_tips = HashSet::new();
        for reference in repo.references().map_err(ArchiveError::ListRefs)? {
            let reference = reference.map_err(ArchiveError::ListRefs)?;
            // Symbolic refs (HEAD and friends) have no direct target.
            if let Some(oid) = reference.target() {
                known_tips.insert(oid);
            }
        }

        Ok(FamilyRepository {
            path,
            repo,
            refs_index,
            known_tips,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Object ids currently anchored by a local reference.
    pub fn known_tips(&self) -> &HashSet<Oid> {
        &self.known_tips
    }

    /// Fetch the member `owner/name` from its public clone URL.
    pub fn fetch(&mut self, member: &str, is_main: bool) -> Result<(), ArchiveError> {
        let url = format!("{CLONE_URL_BASE}/{member}.git");
        self.fetch_from(member, &url, is_main)
    }

    /// Fetch `member` from an explicit clone URL.
    ///
    /// For the family main this is a full fetch: objects are downloaded and
    /// local refs under `refs/*` are force-updated to match the remote. For
    /// a fork only the objects are downloaded; the fork's refs must not
    /// overwrite the main's, and the synthetic `refs/uniq/<sha>` references
    /// created below anchor its tips instead.
    ///
    /// Every advertised head with a valid ref name is recorded in the
    /// observation index (write failures are logged, not fatal: the durable
    /// ref is what guarantees the object stays; the index is secondary
    /// provenance).
    pub fn fetch_from(
        &mut self,
        member: &str,
        url: &str,
        is_main: bool,
    ) -> Result<(), ArchiveError> {
        let now = OffsetDateTime::now_utc()
            .format(TIMESTAMP_FORMAT)
            .expect("timestamp format is valid");

        // Anonymous: bound to this one call, never persisted in the repo
        // config. Dropped on every exit path.
        let mut remote = self
            .repo
            .remote_anonymous(url)
            .map_err(ArchiveError::Fetch)?;

        if is_main {
            let mut options = FetchOptions::new();
            options.remote_callbacks(progress::remote_callbacks());
            remote
                .fetch(&[REFSPEC], Some(&mut options), None)
                .map_err(ArchiveError::Fetch)?;
        } else {
            remote
                .connect(Direction::Fetch)
                .map_err(ArchiveError::Fetch)?;
            let mut options = FetchOptions::new();
            options.remote_callbacks(progress::remote_callbacks());
            remote
                .download(&[REFSPEC], Some(&mut options))
                .map_err(ArchiveError::Fetch)?;
            remote.disconnect().map_err(ArchiveError::Fetch)?;
        }

        // The advertisement list survives disconnect.
        let heads: Vec<(Oid, String)> = remote
            .list()
            .map_err(ArchiveError::Fetch)?
            .iter()
            .map(|head| (head.oid(), head.name().to_string()))
            .collect();

        for (oid, name) in heads {
            if !git2::Reference::is_valid_name(&name) {
                continue;
            }

            let sha = oid.to_string();
            if let Err(e) = self.refs_index.record(&sha, member, &now, &name) {
                tracing::warn!("ref index write failed for {member} {name}: {e}");
            }

            if !self.known_tips.contains(&oid) {
                let uniq = format!("{UNIQ_REF_PREFIX}{sha}");
                self.repo
                    .reference(&uniq, oid, true, "")
                    .map_err(ArchiveError::CreateRef)?;
                self.known_tips.insert(oid);

                eprintln!("New ref: [{}] {}", &sha[..7], name);
            }
        }

        Ok(())
    }
}
