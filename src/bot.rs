use std::fmt::Display;

mod commands;
pub use commands::CommandHandler;

pub(crate) mod github;
pub use github::handle_github_event;

mod message_builder;

pub mod telegram;
pub use telegram::TelegramBot;

pub(crate) mod utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    Markdown,
}

/// A message to post in a Telegram chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub thread_id: Option<i64>,
    pub text: String,
    pub parse_mode: ParseMode,
    pub reply_to: Option<i64>,
}

impl Display for OutgoingMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` to chat {}", self.text, self.chat_id)?;
        if let Some(thread_id) = self.thread_id {
            write!(f, " (thread {})", thread_id)?;
        }
        Ok(())
    }
}

/// Delivers messages to the chat platform.
#[rocket::async_trait]
pub trait ChatClient: Send + Sync {
    async fn send_message(&self, message: OutgoingMessage) -> anyhow::Result<()>;
}
