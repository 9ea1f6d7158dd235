//! Monitored-set enumeration: forks of a repository, repositories of an
//! owner. Both walk the API's pagination (100 per page) until no next page
//! is advertised.

use serde::Deserialize;

use super::{HostClient, HostError};

#[derive(Debug, Deserialize)]
struct RepoSummary {
    full_name: String,
    #[serde(default)]
    fork: bool,
}

/// All public forks of `owner/name`, as full names.
pub fn list_forks(client: &HostClient, name: &str) -> Result<Vec<String>, HostError> {
    let (owner, repo) = name
        .split_once('/')
        .ok_or_else(|| HostError::BadName(name.to_string()))?;
    let url = format!("{}/repos/{owner}/{repo}/forks", client.base_url());

    let forks: Vec<String> = paginate(client, url, &[("per_page", "100")], |repos, all| {
        all.extend(repos.into_iter().map(|r| r.full_name));
    })?;

    tracing::info!("found {} forks of {name}", forks.len());
    Ok(forks)
}

/// All repositories owned by `owner`, excluding those that are themselves
/// forks. Each owned repo's own forks are picked up separately via
/// [`list_forks`] during the bootstrap sweep.
pub fn list_owner_repos(client: &HostClient, owner: &str) -> Result<Vec<String>, HostError> {
    let url = format!("{}/users/{owner}/repos", client.base_url());

    let repos: Vec<String> = paginate(
        client,
        url,
        &[("type", "owner"), ("per_page", "100")],
        |repos, all| {
            all.extend(repos.into_iter().filter(|r| !r.fork).map(|r| r.full_name));
        },
    )?;

    tracing::info!("found {} repos owned by {owner}", repos.len());
    Ok(repos)
}

/// Walk `Link: rel="next"` pages starting at `url`. `params` only apply to
/// the first request; the next-page URL carries them along itself.
fn paginate(
    client: &HostClient,
    url: String,
    params: &[(&str, &str)],
    mut collect: impl FnMut(Vec<RepoSummary>, &mut Vec<String>),
) -> Result<Vec<String>, HostError> {
    let mut all = Vec::new();
    let mut next = Some(url);
    let mut first = true;

    while let Some(url) = next.take() {
        let (body, further) = client.get(&url, if first { params } else { &[] })?;
        let page: Vec<RepoSummary> = serde_json::from_str(&body).map_err(HostError::Decode)?;
        collect(page, &mut all);

        first = false;
        next = further;
        if next.is_some() {
            tracing::info!("found {}, continuing...", all.len());
        }
    }

    Ok(all)
}
