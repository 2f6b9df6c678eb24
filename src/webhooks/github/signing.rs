use std::io;

use anyhow::anyhow;
use hmac::{Hmac, Mac};
use rocket::{
    data::{ByteUnit, FromData, Outcome},
    http::Status,
    request::{self, FromRequest},
    Data, Request,
};
use sha2::Sha256;
use tracing::trace;

const X_GITHUB_SIGNATURE: &str = "X-Hub-Signature-256";
const X_GITHUB_EVENT: &str = "X-GitHub-Event";

type HmacSha256 = Hmac<Sha256>;

/// Checks GitHub's `sha256=<hex>` signature of `payload`. The comparison runs in constant time.
pub fn validate_signature(secret: &str, signature: Option<&str>, payload: &[u8]) -> bool {
    trace!("validating signature...");

    let signature = match signature {
        Some(signature) => signature,
        None => {
            trace!("no signature to validate");
            return false;
        }
    };

    // GitHub puts a prefix in front of its hex SHA256
    let signature = match signature.strip_prefix("sha256=") {
        Some(s) => s,
        None => {
            trace!("couldn't strip prefix from signature `{}`", signature);
            return false;
        }
    };

    let signature = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            trace!("couldn't decode hex-encoded signature {}", signature);
            return false;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    mac.verify_slice(&signature).is_ok()
}

/// The headers GitHub uses to describe a delivery. Missing headers are reported by the
/// dispatcher, in its own order.
#[derive(Debug, Default, Clone)]
pub struct GitHubHeaders {
    pub signature: Option<String>,
    pub event: Option<String>,
}

fn single_header(request: &Request<'_>, name: &str) -> Option<String> {
    let values = request.headers().get(name).collect::<Vec<_>>();
    match values.as_slice() {
        [value] => Some((*value).to_owned()),
        [] => None,
        _ => {
            trace!("found {} `{}` headers, ignoring them", values.len(), name);
            None
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for GitHubHeaders {
    type Error = std::convert::Infallible;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        request::Outcome::Success(GitHubHeaders {
            signature: single_header(request, X_GITHUB_SIGNATURE),
            event: single_header(request, X_GITHUB_EVENT),
        })
    }
}

/// The request body, exactly as received: the signature is computed over these bytes.
pub struct RawPayload(pub Vec<u8>);

/// GitHub caps deliveries at 25 MB. Can be changed with the `github` rocket limit.
const LIMIT: ByteUnit = ByteUnit::Mebibyte(25);

#[rocket::async_trait]
impl<'r> FromData<'r> for RawPayload {
    type Error = anyhow::Error;

    async fn from_data(request: &'r Request<'_>, data: Data<'r>) -> Outcome<'r, Self> {
        trace!("received payload on GitHub webhook endpoint: {:?}", request);

        let size_limit = request.limits().get("github").unwrap_or(LIMIT);
        match data.open(size_limit).into_bytes().await {
            Ok(bytes) if bytes.is_complete() => Outcome::Success(RawPayload(bytes.into_inner())),
            Ok(_) => {
                let eof = io::ErrorKind::UnexpectedEof;
                trace!("payload was too big");
                Outcome::Error((
                    Status::PayloadTooLarge,
                    io::Error::new(eof, "data limit exceeded").into(),
                ))
            }
            Err(e) => Outcome::Error((Status::BadRequest, anyhow!(e))),
        }
    }
}

#[cfg(test)]
pub(crate) fn sign(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
