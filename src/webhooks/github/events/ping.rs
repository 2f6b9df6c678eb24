use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PingEvent {
    pub zen: Option<String>,
    pub hook_id: Option<u64>,
}
