//! Token endpoint round trips
//!
//! Each helper builds its request with the synchronous code in this crate,
//! sends it with `reqwest`, and hands the body to the matching parser:
//! 1. Login: form POST, `Auth=` or a CAPTCHA challenge
//! 2. Delegated upgrade: single-use token to session token
//! 3. OAuth request token and access token
//!
//! Endpoints are always passed in; the defaults live in [`crate::constants`].

use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::authsub::DelegatedCredential;
use crate::constants::CAPTCHA_BASE_URL;
use crate::error::{Error, Result};
use crate::login::{CaptchaChallenge, LoginCredential, LoginRequest, captcha_challenge_from_body};
use crate::oauth::{OAuthCredential, SigningContext, TokenState};
use crate::request::HttpRequest;

/// Result of a login attempt that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Token(LoginCredential),
    /// The server wants a CAPTCHA answered; retry with
    /// [`LoginRequest::with_captcha_answer`].
    Captcha(CaptchaChallenge),
}

async fn execute(client: &reqwest::Client, request: &HttpRequest) -> Result<(StatusCode, String)> {
    let response = request
        .to_reqwest(client)?
        .send()
        .await
        .map_err(|e| Error::Http(format!("{} {} failed: {e}", request.method, request.url)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::Http(format!("reading response from {} failed: {e}", request.url)))?;
    debug!(url = %request.url, status = status.as_u16(), "token endpoint responded");
    Ok((status, body))
}

/// Send `request` and return the body of a 2xx response.
pub async fn send(client: &reqwest::Client, request: &HttpRequest) -> Result<String> {
    let (status, body) = execute(client, request).await?;
    if !status.is_success() {
        return Err(Error::TokenExchange(format!(
            "{} returned {status}: {body}",
            request.url
        )));
    }
    Ok(body)
}

/// Log in with an email and password.
///
/// The login endpoint reports a CAPTCHA with a non-success status, so the
/// body is checked for a challenge before the status is.
pub async fn client_login(
    client: &reqwest::Client,
    endpoint: &str,
    login: &LoginRequest<'_>,
) -> Result<LoginOutcome> {
    let request = login.to_http_request(endpoint)?;
    let (status, body) = execute(client, &request).await?;

    if let Some(challenge) = captcha_challenge_from_body(&body, CAPTCHA_BASE_URL) {
        warn!(email = login.email, "login requires a CAPTCHA answer");
        return Ok(LoginOutcome::Captcha(challenge));
    }
    if !status.is_success() {
        return Err(Error::TokenExchange(format!(
            "login returned {status}: {}",
            body.trim()
        )));
    }
    let credential = LoginCredential::from_response_body(&body)
        .ok_or_else(|| Error::MissingField("Auth line in login response".into()))?;
    info!(email = login.email, service = login.service, "login succeeded");
    Ok(LoginOutcome::Token(credential))
}

/// Exchange a single-use delegated token for a session token.
pub async fn upgrade_delegated(
    client: &reqwest::Client,
    endpoint: &str,
    credential: DelegatedCredential,
) -> Result<DelegatedCredential> {
    let mut request = HttpRequest::parse("GET", endpoint)?;
    credential.apply_to(&mut request)?;
    let body = send(client, &request).await?;
    let upgraded = credential
        .upgrade(&body)
        .ok_or_else(|| Error::MissingField("Token line in session token response".into()))?;
    info!(scopes = upgraded.scopes.len(), "delegated token upgraded");
    Ok(upgraded)
}

/// Ask `endpoint` for a request token valid for `scopes`.
///
/// The returned credential is still a request token, now holding the
/// server's token and secret.
pub async fn fetch_request_token(
    client: &reqwest::Client,
    credential: OAuthCredential,
    scopes: &[&str],
    endpoint: &str,
) -> Result<OAuthCredential> {
    let request = credential.request_token_request(scopes, endpoint, &SigningContext::generate())?;
    let body = send(client, &request).await?;
    credential.with_request_token_response(&body)
}

/// Exchange an authorized request token for an access token.
pub async fn fetch_access_token(
    client: &reqwest::Client,
    credential: OAuthCredential,
    endpoint: &str,
) -> Result<OAuthCredential> {
    if credential.state() != TokenState::AuthorizedRequestToken {
        return Err(Error::InvalidTransition(format!(
            "access token requested in state {}",
            credential.state().label()
        )));
    }
    let request = credential.access_token_request(endpoint, &SigningContext::generate())?;
    let body = send(client, &request).await?;
    credential.upgrade(&body)
}
