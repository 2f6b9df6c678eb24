use serde::Deserialize;

use crate::webhooks::github::events::{null_as_default, GitHubUser, RefType, Repository};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PushEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: GitHubUser,
    #[serde(deserialize_with = "null_as_default")]
    pub commits: Vec<Commit>,
    pub head_commit: Option<Commit>,
    pub created: bool,
    pub deleted: bool,
    pub before: Option<String>,
    pub after: Option<String>,
    pub r#ref: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Commit {
    pub message: Option<String>,
}

/// GitHub uses an all-zero hash for the missing side of a ref creation or deletion.
fn is_null_sha(sha: Option<&str>) -> bool {
    matches!(sha, Some(sha) if !sha.is_empty() && sha.chars().all(|c| c == '0'))
}

impl PushEvent {
    pub fn full_ref(&self) -> &str {
        self.r#ref.as_deref().unwrap_or_default()
    }

    /// Branch or tag name, without its `refs/heads/` or `refs/tags/` prefix.
    pub fn ref_name(&self) -> &str {
        let full_ref = self.full_ref();
        full_ref
            .strip_prefix("refs/heads/")
            .or_else(|| full_ref.strip_prefix("refs/tags/"))
            .unwrap_or(full_ref)
    }

    pub fn ref_type(&self) -> RefType {
        if self.full_ref().starts_with("refs/tags/") {
            RefType::Tag
        } else {
            RefType::Branch
        }
    }

    pub fn creates_ref(&self) -> bool {
        self.created && is_null_sha(self.before.as_deref())
    }

    pub fn deletes_ref(&self) -> bool {
        self.deleted && is_null_sha(self.after.as_deref())
    }

    /// Message of the head commit, falling back on the last listed commit.
    pub fn last_commit_message(&self) -> Option<&str> {
        self.head_commit
            .as_ref()
            .or_else(|| self.commits.last())
            .and_then(|commit| commit.message.as_deref())
    }
}
