use serde::Deserialize;

use crate::webhooks::github::events::{null_as_default, GitHubUser, RefType, Repository};

/// Payload of the `create` and `delete` events.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefEvent {
    pub r#ref: Option<String>,
    pub ref_type: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub repository: Repository,
    #[serde(deserialize_with = "null_as_default")]
    pub sender: GitHubUser,
}

impl RefEvent {
    pub fn ref_name(&self) -> &str {
        self.r#ref.as_deref().unwrap_or_default()
    }

    pub fn ref_type(&self) -> RefType {
        RefType::from_payload(self.ref_type.as_deref())
    }
}
