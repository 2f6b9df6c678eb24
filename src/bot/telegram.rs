use anyhow::{anyhow, Context};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};
use url::Url;

use crate::bot::{ChatClient, OutgoingMessage, ParseMode};

pub const TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";

/// Minimal client for the Telegram Bot API.
pub struct TelegramBot {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

/// Every Bot API method answers with this envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramBot {
    pub fn new(token: String) -> Self {
        Self::with_base_url(TELEGRAM_API_BASE_URL.to_owned(), token)
    }

    pub fn with_base_url(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    fn api_url(&self, method: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}/bot{}/{}", base, self.token, method)
    }

    async fn call(&self, method: &str, body: &Value) -> anyhow::Result<()> {
        trace!("calling Bot API method {}", method);
        let response = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            // the URL contains the bot token
            .map_err(|e| anyhow!("{} request failed: {}", method, e.without_url()))?;

        let status = response.status();
        let response: ApiResponse = response
            .json()
            .await
            .with_context(|| format!("couldn't parse {} response (HTTP {})", method, status))?;

        if !response.ok {
            return Err(anyhow!(
                "{} failed: {}",
                method,
                response
                    .description
                    .unwrap_or_else(|| format!("HTTP {}", status))
            ));
        }

        Ok(())
    }

    /// Asks Telegram to deliver bot updates to `url`, along with `secret_token` if any.
    pub async fn set_webhook(&self, url: &Url, secret_token: Option<&str>) -> anyhow::Result<()> {
        let mut body = json!({ "url": url.as_str() });
        if let Some(secret_token) = secret_token {
            body["secret_token"] = json!(secret_token);
        }

        self.call("setWebhook", &body).await?;
        debug!("registered telegram webhook on {}", url);
        Ok(())
    }
}

fn send_message_body(message: &OutgoingMessage) -> Value {
    let mut body = json!({
        "chat_id": message.chat_id,
        "text": message.text,
    });

    if message.parse_mode == ParseMode::Markdown {
        body["parse_mode"] = json!("Markdown");
    }
    if let Some(thread_id) = message.thread_id {
        body["message_thread_id"] = json!(thread_id);
    }
    if let Some(reply_to) = message.reply_to {
        body["reply_to_message_id"] = json!(reply_to);
    }

    body
}

#[rocket::async_trait]
impl ChatClient for TelegramBot {
    async fn send_message(&self, message: OutgoingMessage) -> anyhow::Result<()> {
        trace!("sending message {}", message);
        self.call("sendMessage", &send_message_body(&message)).await
    }
}

/// An incoming update, as posted by Telegram on our webhook.
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub message_thread_id: Option<i64>,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}
