use serde::Deserialize;

use crate::webhooks::github::events::{null_as_default, GitHubUser, PullRequest, Repository};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PullRequestEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: GitHubUser,
    #[serde(deserialize_with = "null_as_default")]
    pub pull_request: PullRequest,
}
