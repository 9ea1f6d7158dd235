//! Git fixtures: minimal source repositories for fetch tests.

use std::path::Path;

use git2::{Oid, Repository, Signature};

/// Initialise a bare repository to fetch from.
pub fn init_source_repo(path: &Path) -> Repository {
    Repository::init_bare(path).expect("git init --bare")
}

/// Create a commit on `refname` (parented on the ref's current tip, if any)
/// whose tree contains one file with `content`.
pub fn commit(repo: &Repository, refname: &str, content: &str) -> Oid {
    let sig = Signature::now("Test", "test@test.com").expect("signature");

    let blob = repo.blob(content.as_bytes()).expect("blob");
    let mut builder = repo.treebuilder(None).expect("treebuilder");
    builder.insert("file", blob, 0o100644).expect("tree entry");
    let tree = repo.find_tree(builder.write().expect("tree")).expect("find tree");

    let parent = repo
        .refname_to_id(refname)
        .ok()
        .map(|oid| repo.find_commit(oid).expect("parent commit"));
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some(refname), &sig, &sig, content, &tree, &parents)
        .expect("commit")
}

/// Point `refs/tags/<name>` at `target` (lightweight tag).
pub fn tag(repo: &Repository, name: &str, target: Oid) {
    repo.reference(&format!("refs/tags/{name}"), target, true, "")
        .expect("tag ref");
}

/// Delete a reference.
pub fn delete_ref(repo: &Repository, refname: &str) {
    repo.find_reference(refname)
        .expect("find reference")
        .delete()
        .expect("delete reference");
}

/// The clone URL for a local fixture repository.
pub fn url(path: &Path) -> String {
    path.to_str().expect("utf8 path").to_string()
}
