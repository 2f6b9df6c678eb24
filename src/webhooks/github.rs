use std::sync::Arc;

use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request, State,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

mod events;
pub use events::*;

mod filter;
pub use filter::EventFilter;

mod signing;
pub use signing::{validate_signature, GitHubHeaders, RawPayload};
#[cfg(test)]
pub(crate) use signing::sign;

use crate::{
    bot::{handle_github_event, ChatClient, OutgoingMessage, ParseMode},
    config::NotifierConfig,
    users::UserStore,
};

/// Every failure is a client error, so that GitHub doesn't start retrying deliveries.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    BadRequest(String),
}

impl<'r> Responder<'r, 'static> for WebhookError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = match self {
            WebhookError::Unauthorized(_) => Status::Unauthorized,
            WebhookError::BadRequest(_) => Status::BadRequest,
        };

        (status, Json(json!({ "detail": self.to_string() }))).respond_to(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
    pub message: String,
}

impl WebhookResponse {
    fn new(status: &str, message: &str) -> Self {
        Self {
            status: status.to_owned(),
            message: message.to_owned(),
        }
    }
}

#[rocket::post("/webhook", data = "<payload>")]
pub async fn github_webhook(
    headers: GitHubHeaders,
    payload: RawPayload,
    dispatcher: &State<WebhookDispatcher>,
) -> Result<Json<WebhookResponse>, WebhookError> {
    dispatcher.dispatch(&headers, &payload.0).await.map(Json)
}

/// Turns signed GitHub deliveries into notifications in the configured chat.
pub struct WebhookDispatcher {
    secret: String,
    chat_id: i64,
    thread_id: Option<i64>,
    filter: EventFilter,
    users: Arc<UserStore>,
    client: Arc<dyn ChatClient>,
}

impl WebhookDispatcher {
    pub fn new(config: &NotifierConfig, users: Arc<UserStore>, client: Arc<dyn ChatClient>) -> Self {
        Self {
            secret: config.github_secret.clone(),
            chat_id: config.chat_id,
            thread_id: config.thread_id,
            filter: EventFilter::default(),
            users,
            client,
        }
    }

    pub async fn dispatch(
        &self,
        headers: &GitHubHeaders,
        payload: &[u8],
    ) -> Result<WebhookResponse, WebhookError> {
        info!("received GitHub webhook");

        let signature = match headers.signature.as_deref() {
            Some(signature) => signature,
            None => {
                warn!("missing signature");
                return Err(WebhookError::Unauthorized("missing signature"));
            }
        };
        if !validate_signature(&self.secret, Some(signature), payload) {
            warn!("invalid signature");
            return Err(WebhookError::Unauthorized("invalid signature"));
        }

        let kind = match headers.event.as_deref() {
            Some(event) => EventKind::from_header(event),
            None => {
                warn!("missing event type");
                return Err(WebhookError::BadRequest("missing event type".to_owned()));
            }
        };
        info!("event: {}", kind);

        self.process(kind, payload).await.map_err(|e| {
            warn!("couldn't process event: {}", e);
            e
        })
    }

    async fn process(
        &self,
        kind: EventKind,
        payload: &[u8],
    ) -> Result<WebhookResponse, WebhookError> {
        let event = InboundEvent::parse(kind, payload)
            .map_err(|e| WebhookError::BadRequest(format!("invalid payload: {}", e)))?;

        if event.kind == EventKind::Ping {
            let ping = PingEvent::deserialize(&event.payload).unwrap_or_default();
            info!(
                "ping received for hook {:?}: {}",
                ping.hook_id,
                ping.zen.as_deref().unwrap_or_default()
            );
            return Ok(WebhookResponse::new("ok", "pong"));
        }

        if !self.filter.is_enabled(&event.kind, &event) {
            info!(
                "event {} (action {:?}) ignored by filters",
                event.kind, event.action
            );
            return Ok(WebhookResponse::new("ignored", "event ignored by filters"));
        }

        let github_event = GitHubEvent::from_inbound(&event)
            .map_err(|e| WebhookError::BadRequest(format!("invalid {} payload: {}", event.kind, e)))?
            .ok_or_else(|| WebhookError::BadRequest("unsupported event".to_owned()))?;

        let message = handle_github_event(&github_event, &self.users.load());
        if message.trim().is_empty() {
            return Err(WebhookError::BadRequest("empty message".to_owned()));
        }

        let message = OutgoingMessage {
            chat_id: self.chat_id,
            thread_id: self.thread_id,
            text: message,
            parse_mode: ParseMode::Markdown,
            reply_to: None,
        };
        debug!("sending notification {}", message);
        self.client.send_message(message).await.map_err(|e| {
            WebhookError::BadRequest(format!("couldn't send notification: {:#}", e))
        })?;

        info!("notification sent");
        Ok(WebhookResponse::new("ok", "notification sent"))
    }
}
