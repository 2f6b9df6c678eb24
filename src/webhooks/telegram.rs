use rocket::{
    http::Status,
    request::{self, FromRequest},
    serde::json::Json,
    Request, State,
};
use tracing::{info, trace, warn};

use crate::bot::{telegram::Update, CommandHandler};

const X_TELEGRAM_SECRET_TOKEN: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Secret token Telegram attaches to updates when one was given to `setWebhook`.
pub struct SecretToken(Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SecretToken {
    type Error = std::convert::Infallible;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let token = request.headers().get_one(X_TELEGRAM_SECRET_TOKEN);
        request::Outcome::Success(SecretToken(token.map(str::to_owned)))
    }
}

/// Bot updates pushed by Telegram. Always acknowledged once parsed, Telegram would otherwise
/// redeliver them.
#[rocket::post("/telegram", format = "json", data = "<update>")]
pub async fn telegram_webhook(
    token: SecretToken,
    update: Json<Update>,
    commands: &State<CommandHandler>,
) -> Status {
    info!("received Telegram update");
    if !commands.accepts_secret(token.0.as_deref()) {
        warn!("refused Telegram update {} with a bad secret token", update.update_id);
        return Status::Unauthorized;
    }
    trace!("update: {:?}", update.0);

    if let Err(e) = commands.handle_update(update.into_inner()).await {
        warn!("couldn't answer command: {:#}", e);
    }

    Status::Ok
}
