use serde::Deserialize;

use crate::webhooks::github::events::{null_as_default, GitHubUser, PullRequest, Repository};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PullRequestReviewEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: GitHubUser,
    #[serde(deserialize_with = "null_as_default")]
    pub pull_request: PullRequest,
    #[serde(deserialize_with = "null_as_default")]
    pub review: Review,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Review {
    pub state: Option<String>,
    pub body: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub user: GitHubUser,
}

impl Review {
    /// Lowercased review state, `commented` when GitHub didn't send one.
    pub fn state(&self) -> String {
        self.state
            .as_deref()
            .unwrap_or("commented")
            .to_lowercase()
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}
