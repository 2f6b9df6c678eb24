use std::{net::IpAddr, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

mod bot;
use bot::{CommandHandler, TelegramBot};

mod config;
use config::NotifierConfig;

mod users;
use users::UserStore;

mod webhooks;
use webhooks::WebhookDispatcher;

#[derive(Parser)]
#[command(version, about = "Relays GitHub events to a Telegram chat")]
struct Opts {
    /// Token of the Telegram bot
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    telegram_bot_token: String,
    /// Public base URL of this server, Telegram updates are posted to `<url>/telegram`
    #[arg(long, env = "WEBHOOK_DOMAIN")]
    webhook_domain: Url,
    /// Secret configured on the GitHub webhook
    #[arg(long, env = "GITHUB_SECRET", hide_env_values = true)]
    github_secret: String,
    /// Secret Telegram must send along with bot updates
    #[arg(long, env = "TELEGRAM_SECRET_TOKEN", hide_env_values = true)]
    telegram_secret_token: Option<String>,
    /// Telegram chat receiving notifications and accepting commands
    #[arg(long, env = "CHAT_ID", allow_negative_numbers = true)]
    chat_id: i64,
    /// Forum topic of the chat to post in
    #[arg(long, env = "THREAD_ID")]
    thread_id: Option<i64>,
    /// YAML file linking GitHub logins to Telegram usernames
    #[arg(long, env = "USERS_FILE", default_value = "users.yaml")]
    users_file: PathBuf,
    #[arg(long, env = "ADDRESS", default_value = "0.0.0.0")]
    address: IpAddr,
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

impl Opts {
    fn config(&self) -> NotifierConfig {
        NotifierConfig {
            telegram_bot_token: self.telegram_bot_token.clone(),
            webhook_domain: self.webhook_domain.clone(),
            github_secret: self.github_secret.clone(),
            telegram_secret_token: self.telegram_secret_token.clone(),
            chat_id: self.chat_id,
            thread_id: self.thread_id,
            users_file: self.users_file.clone(),
        }
    }
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let opts = Opts::parse();
    let config = opts.config();
    info!(
        "posting to chat {} (thread {:?})",
        config.chat_id, config.thread_id
    );

    let bot = Arc::new(TelegramBot::new(config.telegram_bot_token.clone()));
    let telegram_webhook = config
        .telegram_webhook_url()
        .context("couldn't build telegram webhook URL")?;
    info!("registering telegram webhook on {}", telegram_webhook);
    bot.set_webhook(&telegram_webhook, config.telegram_secret_token.as_deref())
        .await
        .context("failed to register telegram webhook")?;

    let users = Arc::new(UserStore::new(&config.users_file));
    info!("GitHub/Telegram users stored in {}", users.path().display());
    let dispatcher = WebhookDispatcher::new(&config, users.clone(), bot.clone());
    let commands = CommandHandler::new(&config, users, bot);

    let figment = rocket::Config::figment()
        .merge(("address", opts.address))
        .merge(("port", opts.port));
    let rocket = webhooks::mount(rocket::custom(figment), dispatcher, commands);

    rocket.launch().await.map_err(|err| anyhow!("{}", err))?;
    Ok(())
}
