//! Code-hosting API client.
//!
//! Unauthenticated, rate-limited transport: every request carries the
//! configured user agent, and the client id/secret pair is appended as query
//! parameters when supplied, which buys the higher unauthenticated rate
//! limit tier.

pub mod enumerate;

use std::io::Read;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::error::Transience;

const API_URL: &str = "https://api.github.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Event type emitted when refs of a repository are pushed.
pub const PUSH_EVENT: &str = "PushEvent";

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HostError {
    #[error("api request failed: {0}")]
    Transport(#[source] Box<ureq::Error>),

    #[error("api returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("failed to read api response: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to decode api response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("malformed repository name (want owner/name): {0}")]
    BadName(String),
}

impl HostError {
    /// Whether retrying may succeed.
    pub fn transience(&self) -> Transience {
        match self {
            HostError::Transport(_) | HostError::Status { .. } | HostError::Read(_) => {
                Transience::Retryable
            }
            HostError::Decode(_) | HostError::BadName(_) => Transience::Permanent,
        }
    }
}

/// One public event from the firehose.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub repo: EventRepo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRepo {
    pub name: String,
}

/// The change monitor's view of the firehose. One page of the most recent
/// public events per call, newest first; the monitor computes "new since
/// last poll" itself.
pub trait EventSource: Send {
    fn list_events(&self) -> Result<Vec<Event>, HostError>;
}

#[derive(Clone)]
pub struct HostClient {
    agent: ureq::Agent,
    base_url: String,
    user_agent: String,
    client_id: String,
    client_secret: String,
}

impl HostClient {
    pub fn new(user_agent: &str, client_id: &str, client_secret: &str) -> Self {
        Self::with_base_url(API_URL, user_agent, client_id, client_secret)
    }

    /// Point the client at a different API root (mirrors, tests).
    pub fn with_base_url(
        base_url: &str,
        user_agent: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        HostClient {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url`, returning the body and the `Link: rel="next"` URL if the
    /// response is paginated and has a further page.
    pub(crate) fn get(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<(String, Option<String>), HostError> {
        let mut request = self.agent.get(url).set("User-Agent", &self.user_agent);
        for (key, value) in params {
            request = request.query(key, value);
        }
        if !self.client_id.is_empty() {
            request = request
                .query("client_id", &self.client_id)
                .query("client_secret", &self.client_secret);
        }

        let response = request.call().map_err(|e| match e {
            ureq::Error::Status(status, _) => HostError::Status {
                status,
                url: url.to_string(),
            },
            e => HostError::Transport(Box::new(e)),
        })?;

        let next = response.header("link").and_then(parse_next_link);
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(HostError::Read)?;
        Ok((body, next))
    }
}

impl EventSource for HostClient {
    fn list_events(&self) -> Result<Vec<Event>, HostError> {
        let url = format!("{}/events", self.base_url);
        let (body, _) = self.get(&url, &[])?;
        serde_json::from_str(&body).map_err(HostError::Decode)
    }
}

/// Extract the `rel="next"` URL from a `Link` header.
///
/// `<https://api.../repos?page=2>; rel="next", <https://...>; rel="last"`
fn parse_next_link(header: &str) -> Option<String> {
    for part in header.split(',') {
        if let Some((url, rel)) = part.split_once(';')
            && rel.trim() == r#"rel="next""#
        {
            return Some(url.trim().trim_start_matches('<').trim_end_matches('>').to_string());
        }
    }
    None
}
