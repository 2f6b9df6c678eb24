use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    bot::{
        telegram::{Message, Update},
        ChatClient, OutgoingMessage, ParseMode,
    },
    config::NotifierConfig,
    users::{UserStore, UserStoreError},
};

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Start,
    GetChatId,
    Link(Vec<&'a str>),
    Unlink(Vec<&'a str>),
}

impl<'a> Command<'a> {
    /// Parses `/command[@bot] args...`. Returns `None` for anything we don't handle.
    fn parse(text: &'a str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let command = words.next()?.strip_prefix('/')?;
        // in groups, commands may be addressed to a specific bot
        let command = command.split('@').next().unwrap_or_default();
        let args = words.collect();

        match command {
            "start" => Some(Self::Start),
            "get_chat_id" => Some(Self::GetChatId),
            "link" => Some(Self::Link(args)),
            "unlink" => Some(Self::Unlink(args)),
            _ => None,
        }
    }
}

/// Answers the bot commands used to link GitHub logins to Telegram usernames.
pub struct CommandHandler {
    chat_id: i64,
    thread_id: Option<i64>,
    secret_token: Option<String>,
    users: Arc<UserStore>,
    client: Arc<dyn ChatClient>,
}

impl CommandHandler {
    pub fn new(config: &NotifierConfig, users: Arc<UserStore>, client: Arc<dyn ChatClient>) -> Self {
        Self {
            chat_id: config.chat_id,
            thread_id: config.thread_id,
            secret_token: config.telegram_secret_token.clone(),
            users,
            client,
        }
    }

    pub async fn handle_update(&self, update: Update) -> anyhow::Result<()> {
        let message = match update.message {
            Some(message) => message,
            None => {
                debug!("update {} has no message, ignoring it", update.update_id);
                return Ok(());
            }
        };

        let reply = match self.reply(&message) {
            Some(reply) => reply,
            None => return Ok(()),
        };

        self.client
            .send_message(OutgoingMessage {
                chat_id: message.chat.id,
                thread_id: message.message_thread_id,
                text: reply,
                parse_mode: ParseMode::Plain,
                reply_to: Some(message.message_id),
            })
            .await
    }

    /// Whether an update carrying `provided` in its secret token header comes from Telegram.
    pub fn accepts_secret(&self, provided: Option<&str>) -> bool {
        match &self.secret_token {
            Some(secret) => provided.map_or(false, |provided| timing_safe_eq(secret, provided)),
            None => true,
        }
    }

    fn is_authorized(&self, message: &Message) -> bool {
        message.chat.id == self.chat_id
            && self
                .thread_id
                .map_or(true, |thread_id| message.message_thread_id == Some(thread_id))
    }

    /// Text to answer `message` with, if any.
    fn reply(&self, message: &Message) -> Option<String> {
        let command = Command::parse(message.text.as_deref()?)?;

        let username = message.from.as_ref().and_then(|user| user.username.as_deref());
        if !self.is_authorized(message) {
            warn!(
                "refused command from {} in chat {}, thread {:?}",
                username.unwrap_or("<no username>"),
                message.chat.id,
                message.message_thread_id
            );
            return None;
        }

        let reply = match command {
            Command::Start => "Hello!".to_owned(),
            Command::GetChatId => {
                let text = format!(
                    "Chat ID: {}\nUser ID: {}\nThread ID: {}",
                    message.chat.id,
                    message
                        .from
                        .as_ref()
                        .map_or_else(|| "None".to_owned(), |user| user.id.to_string()),
                    message
                        .message_thread_id
                        .map_or_else(|| "None".to_owned(), |id| id.to_string()),
                );
                info!("{}", text.replace('\n', ", "));
                text
            }
            Command::Link(args) => match args.as_slice() {
                [login] => self.link(login, username),
                _ => "Usage: /link <github_username>".to_owned(),
            },
            Command::Unlink(args) => match args.as_slice() {
                [login] => self.unlink(login),
                _ => "Usage: /unlink <github_username>".to_owned(),
            },
        };

        Some(reply)
    }

    fn link(&self, login: &str, username: Option<&str>) -> String {
        let username = match username {
            Some(username) => username,
            None => return "You need a Telegram username to link a GitHub account".to_owned(),
        };

        match self.users.link(login, username) {
            Ok(()) => format!("GitHub user {} linked to {}", login, self.users.resolve(login)),
            Err(e @ UserStoreError::InvalidHandle(_)) => e.to_string(),
            Err(e) => {
                warn!("couldn't link {} to @{}: {}", login, username, e);
                format!("Error: {}", e)
            }
        }
    }

    fn unlink(&self, login: &str) -> String {
        match self.users.unlink(login) {
            Ok(()) => format!("GitHub user {} unlinked", login),
            Err(e @ UserStoreError::NotFound(_)) => e.to_string(),
            Err(e) => {
                warn!("couldn't unlink {}: {}", login, e);
                format!("Error: {}", e)
            }
        }
    }
}

fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}
