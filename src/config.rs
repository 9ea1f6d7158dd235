//! Config loading.
//!
//! The archiver reads `config.yml` from the working directory. There are no
//! flags and no subcommands; the config file is the whole surface.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE: &str = "config.yml";

/// One entry of the `Repositories` list.
///
/// `repo: owner/name` adds a single repository as a monitored main;
/// `owner: name` expands to every non-fork repository of that owner, each
/// added as a main. Any other key fails deserialisation, which is fatal at
/// startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoEntry {
    Repo(String),
    Owner(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(rename = "Repositories")]
    pub repositories: Vec<RepoEntry>,

    #[serde(rename = "DataDir")]
    pub data_dir: PathBuf,

    #[serde(rename = "UserAgent")]
    pub user_agent: String,

    #[serde(rename = "GitHubID", default)]
    pub github_id: String,

    #[serde(rename = "GitHubSecret", default)]
    pub github_secret: String,

    #[serde(rename = "QueueSize")]
    pub queue_size: usize,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Load `config.yml` from the working directory.
pub fn load() -> Result<Config, ConfigError> {
    load_from(Path::new(CONFIG_FILE))
}

pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_owned(),
        source,
    })
}
