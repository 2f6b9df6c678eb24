use std::path::PathBuf;

use url::Url;

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Token of the Telegram bot, as given by BotFather
    pub telegram_bot_token: String,
    /// Publicly reachable base URL of this server. Telegram updates are registered on
    /// `<webhook_domain>/telegram`.
    pub webhook_domain: Url,
    /// Secret shared with GitHub, used to check the `X-Hub-Signature-256` header
    pub github_secret: String,
    /// Sent by Telegram in `X-Telegram-Bot-Api-Secret-Token` with every update. Updates without
    /// it are refused when set.
    pub telegram_secret_token: Option<String>,
    /// ID of the Telegram chat where notifications are posted. Commands are only accepted from
    /// this chat.
    pub chat_id: i64,
    /// Forum topic inside `chat_id`. When set, notifications are posted in this topic and
    /// commands are only accepted from it.
    pub thread_id: Option<i64>,
    /// Path to the YAML file mapping GitHub logins to Telegram usernames
    pub users_file: PathBuf,
}

impl NotifierConfig {
    /// URL Telegram should deliver bot updates to.
    pub fn telegram_webhook_url(&self) -> Result<Url, url::ParseError> {
        // `join` would drop the last path segment of a domain without trailing slash
        let base = self.webhook_domain.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/telegram", base))
    }
}

#[cfg(test)]
pub(crate) fn test_config(users_file: PathBuf) -> NotifierConfig {
    NotifierConfig {
        telegram_bot_token: "123:token".to_string(),
        webhook_domain: Url::parse("https://notifier.example.org/").unwrap(),
        github_secret: "It's a Secret to Everybody".to_string(),
        telegram_secret_token: None,
        chat_id: -1001234,
        thread_id: Some(42),
        users_file,
    }
}
