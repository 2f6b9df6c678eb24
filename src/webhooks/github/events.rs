use std::fmt::Display;

use serde::{Deserialize, Deserializer};
use url::Url;

mod ping;
mod pull_request;
mod pull_request_review;
mod push;
mod refs;

pub use ping::*;
pub use pull_request::*;
pub use pull_request_review::*;
pub use push::*;
pub use refs::*;

/// Placeholder for names missing from a payload.
pub const UNKNOWN: &str = "Unknown";

/// Value of the `X-GitHub-Event` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Push,
    PullRequest,
    PullRequestReview,
    CreateRef,
    DeleteRef,
    Ping,
    Unknown(String),
}

impl EventKind {
    pub fn from_header(name: &str) -> Self {
        match name {
            "push" => Self::Push,
            "pull_request" => Self::PullRequest,
            "pull_request_review" => Self::PullRequestReview,
            "create" => Self::CreateRef,
            "delete" => Self::DeleteRef,
            "ping" => Self::Ping,
            other => Self::Unknown(other.to_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
            Self::PullRequestReview => "pull_request_review",
            Self::CreateRef => "create",
            Self::DeleteRef => "delete",
            Self::Ping => "ping",
            Self::Unknown(name) => name,
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A webhook delivery, before we look at its kind-specific content.
#[derive(Debug)]
pub struct InboundEvent {
    pub kind: EventKind,
    pub action: Option<String>,
    pub payload: serde_json::Value,
}

impl InboundEvent {
    pub fn parse(kind: EventKind, body: &[u8]) -> Result<Self, serde_json::Error> {
        let payload: serde_json::Value = serde_json::from_slice(body)?;
        let action = payload
            .get("action")
            .and_then(|action| action.as_str())
            .map(str::to_owned);

        Ok(Self {
            kind,
            action,
            payload,
        })
    }
}

/// Events we know how to announce.
#[derive(Debug)]
pub enum GitHubEvent {
    Create(RefEvent),
    Delete(RefEvent),
    PullRequest(PullRequestEvent),
    PullRequestReview(PullRequestReviewEvent),
    Push(PushEvent),
}

impl GitHubEvent {
    /// Returns `None` for kinds that are never announced.
    pub fn from_inbound(event: &InboundEvent) -> Result<Option<Self>, serde_json::Error> {
        let payload = &event.payload;
        let event = match event.kind {
            EventKind::Push => Self::Push(Deserialize::deserialize(payload)?),
            EventKind::PullRequest => Self::PullRequest(Deserialize::deserialize(payload)?),
            EventKind::PullRequestReview => {
                Self::PullRequestReview(Deserialize::deserialize(payload)?)
            }
            EventKind::CreateRef => Self::Create(Deserialize::deserialize(payload)?),
            EventKind::DeleteRef => Self::Delete(Deserialize::deserialize(payload)?),
            EventKind::Ping | EventKind::Unknown(_) => return Ok(None),
        };

        Ok(Some(event))
    }
}

/// GitHub sends `null` for some objects (e.g. a deleted account), treat it like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefType {
    Branch,
    Tag,
    Other(String),
}

impl RefType {
    pub fn from_payload(ref_type: Option<&str>) -> Self {
        match ref_type {
            Some("branch") => Self::Branch,
            Some("tag") => Self::Tag,
            Some(other) => Self::Other(other.to_owned()),
            None => Self::Other(UNKNOWN.to_owned()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubUser {
    pub login: Option<String>,
}

impl GitHubUser {
    pub fn login(&self) -> &str {
        self.login.as_deref().unwrap_or(UNKNOWN)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Repository {
    pub full_name: Option<String>,
    pub html_url: Option<String>,
}

impl Repository {
    pub fn full_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn html_url(&self) -> Option<Url> {
        parse_url(self.html_url.as_deref())
    }
}

/// Links that don't parse are treated as missing.
fn parse_url(url: Option<&str>) -> Option<Url> {
    Url::parse(url?).ok()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PullRequest {
    pub number: Option<u64>,
    pub html_url: Option<String>,
    pub title: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub user: GitHubUser,
    #[serde(deserialize_with = "null_as_default")]
    pub requested_reviewers: Vec<GitHubUser>,
    #[serde(deserialize_with = "null_as_default")]
    pub base: PrRef,
    #[serde(deserialize_with = "null_as_default")]
    pub head: PrRef,
}

impl PullRequest {
    pub fn number(&self) -> String {
        self.number
            .map_or_else(|| "N/A".to_owned(), |number| number.to_string())
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("No title")
    }

    pub fn html_url(&self) -> Option<Url> {
        parse_url(self.html_url.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PrRef {
    pub r#ref: Option<String>,
}

impl PrRef {
    pub fn name(&self) -> &str {
        self.r#ref.as_deref().unwrap_or(UNKNOWN)
    }
}
