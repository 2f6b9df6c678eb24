use rocket::{routes, Build, Rocket};

use crate::bot::CommandHandler;

pub mod github;
pub use github::{github_webhook, WebhookDispatcher};

pub mod telegram;
pub use telegram::telegram_webhook;

/// Mounts the GitHub and Telegram webhook endpoints.
pub fn mount(
    rocket: Rocket<Build>,
    dispatcher: WebhookDispatcher,
    commands: CommandHandler,
) -> Rocket<Build> {
    rocket
        .mount("/", routes![github_webhook, telegram_webhook])
        .manage(dispatcher)
        .manage(commands)
}
