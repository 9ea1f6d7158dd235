//! Fetch engine tests against local fixture repositories.

mod fixtures;

use std::collections::HashSet;
use std::path::Path;

use continuum::FamilyRepository;
use git2::{Oid, Repository};
use rusqlite::Connection;

/// Rows of the sidecar observation index, as (sha, repository, name).
fn index_rows(store_path: &Path) -> Vec<(String, String, String)> {
    let mut sidecar = store_path.to_path_buf().into_os_string();
    sidecar.push(".sqlite");
    let conn = Connection::open(&sidecar).expect("open index");
    let mut stmt = conn
        .prepare("SELECT sha, repository, name FROM heads ORDER BY repository, name")
        .expect("prepare");
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })
        .expect("query")
        .collect::<Result<Vec<_>, _>>()
        .expect("rows");
    rows
}

fn uniq_refs(store_path: &Path) -> HashSet<String> {
    let repo = Repository::open_bare(store_path).expect("open store");
    repo.references_glob("refs/uniq/*")
        .expect("glob")
        .names()
        .map(|name| name.expect("ref name").to_string())
        .collect()
}

fn resolves(store_path: &Path, refname: &str) -> Option<Oid> {
    let repo = Repository::open_bare(store_path).expect("open store");
    repo.refname_to_id(refname).ok()
}

#[test]
fn single_main_captures_branches_and_tags() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path().join("data");
    let remote_dir = dir.path().join("remote");

    let source = fixtures::init_source_repo(&remote_dir);
    let head = fixtures::commit(&source, "refs/heads/main", "one");
    let tagged = fixtures::commit(&source, "refs/heads/dev", "two");
    fixtures::tag(&source, "v1", tagged);
    fixtures::delete_ref(&source, "refs/heads/dev");

    let mut family = FamilyRepository::open(&data_dir, "a/b").expect("open family");
    family
        .fetch_from("a/b", &fixtures::url(&remote_dir), true)
        .expect("fetch main");

    let store = data_dir.join("github.com").join("a/b");
    assert_eq!(family.path(), store);

    // Full fetch: the remote's refs land under the same names.
    assert_eq!(resolves(&store, "refs/heads/main"), Some(head));
    assert_eq!(resolves(&store, "refs/tags/v1"), Some(tagged));

    // Both tips are anchored, tagged-only objects included.
    let uniq = uniq_refs(&store);
    assert!(uniq.contains(&format!("refs/uniq/{head}")));
    assert!(uniq.contains(&format!("refs/uniq/{tagged}")));

    // One observation row per advertised head.
    let rows = index_rows(&store);
    assert!(rows.contains(&(head.to_string(), "a/b".into(), "refs/heads/main".into())));
    assert!(rows.contains(&(tagged.to_string(), "a/b".into(), "refs/tags/v1".into())));
    assert!(rows.iter().all(|(_, repository, _)| repository == "a/b"));
}

#[test]
fn fork_fetch_downloads_objects_without_touching_main_refs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path().join("data");
    let main_dir = dir.path().join("main");
    let fork_dir = dir.path().join("fork");

    let main_source = fixtures::init_source_repo(&main_dir);
    let main_head = fixtures::commit(&main_source, "refs/heads/main", "upstream");

    let fork_source = fixtures::init_source_repo(&fork_dir);
    let fork_head = fixtures::commit(&fork_source, "refs/heads/main", "divergent");

    let mut family = FamilyRepository::open(&data_dir, "a/b").expect("open family");
    family
        .fetch_from("a/b", &fixtures::url(&main_dir), true)
        .expect("fetch main");
    family
        .fetch_from("c/b", &fixtures::url(&fork_dir), false)
        .expect("fetch fork");

    let store = data_dir.join("github.com").join("a/b");

    // The fork's divergent head must not overwrite the main's ref...
    assert_eq!(resolves(&store, "refs/heads/main"), Some(main_head));

    // ...but both tips are anchored and their objects present.
    let uniq = uniq_refs(&store);
    assert!(uniq.contains(&format!("refs/uniq/{main_head}")));
    assert!(uniq.contains(&format!("refs/uniq/{fork_head}")));
    {
        let repo = Repository::open_bare(&store).expect("open store");
        assert!(repo.find_commit(fork_head).is_ok());
    }

    assert!(family.known_tips().contains(&main_head));
    assert!(family.known_tips().contains(&fork_head));

    // At least one observation per member.
    let rows = index_rows(&store);
    assert!(rows.iter().any(|(_, repository, _)| repository == "a/b"));
    assert!(rows.iter().any(|(_, repository, _)| repository == "c/b"));
}

#[test]
fn known_tips_survive_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path().join("data");
    let main_dir = dir.path().join("main");
    let fork_dir = dir.path().join("fork");

    let main_source = fixtures::init_source_repo(&main_dir);
    let main_head = fixtures::commit(&main_source, "refs/heads/main", "upstream");
    let fork_source = fixtures::init_source_repo(&fork_dir);
    let fork_head = fixtures::commit(&fork_source, "refs/heads/main", "divergent");

    {
        let mut family = FamilyRepository::open(&data_dir, "a/b").expect("open family");
        family
            .fetch_from("a/b", &fixtures::url(&main_dir), true)
            .expect("fetch main");
        family
            .fetch_from("c/b", &fixtures::url(&fork_dir), false)
            .expect("fetch fork");
    }

    // Reopen: known tips are rebuilt from the store's references alone.
    let family = FamilyRepository::open(&data_dir, "a/b").expect("reopen family");
    assert!(family.known_tips().contains(&main_head));
    assert!(family.known_tips().contains(&fork_head));

    // And they are exactly the targets of the store's references.
    let store = data_dir.join("github.com").join("a/b");
    {
        let repo = Repository::open_bare(&store).expect("open store");
        let targets: HashSet<Oid> = repo
            .references()
            .expect("references")
            .filter_map(|reference| reference.expect("reference").target())
            .collect();
        assert_eq!(family.known_tips(), &targets);
    }
    assert!(resolves(&store, &format!("refs/uniq/{main_head}")).is_some());
    assert!(resolves(&store, &format!("refs/uniq/{fork_head}")).is_some());
}

#[test]
fn refetching_a_member_never_duplicates_anchors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path().join("data");
    let remote_dir = dir.path().join("remote");

    let source = fixtures::init_source_repo(&remote_dir);
    let head = fixtures::commit(&source, "refs/heads/main", "one");

    let mut family = FamilyRepository::open(&data_dir, "a/b").expect("open family");
    let url = fixtures::url(&remote_dir);
    family.fetch_from("a/b", &url, true).expect("fetch");
    family.fetch_from("c/b", &url, false).expect("refetch as fork");
    family.fetch_from("a/b", &url, true).expect("refetch");

    let store = data_dir.join("github.com").join("a/b");
    let anchors: Vec<_> = uniq_refs(&store)
        .into_iter()
        .filter(|name| name == &format!("refs/uniq/{head}"))
        .collect();
    assert_eq!(anchors.len(), 1);

    // Observations, by contrast, accumulate: one per fetch per head.
    let rows = index_rows(&store);
    let main_rows = rows
        .iter()
        .filter(|(sha, _, name)| sha == &head.to_string() && name == "refs/heads/main")
        .count();
    assert_eq!(main_rows, 3);
}

#[test]
fn gc_is_disabled_for_the_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data_dir = dir.path().join("data");

    let family = FamilyRepository::open(&data_dir, "a/b").expect("open family");
    drop(family);

    let repo = Repository::open_bare(data_dir.join("github.com").join("a/b")).expect("open store");
    let config = repo.config().expect("config");
    assert_eq!(config.get_string("gc.auto").expect("gc.auto"), "0");
}
