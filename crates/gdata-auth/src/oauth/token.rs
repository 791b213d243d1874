//! OAuth 1.0 credential and its three-state lifecycle
//!
//! ```text
//! RequestToken ──authorize(redirect)──▶ AuthorizedRequestToken ──upgrade(body)──▶ AccessToken
//! ```
//!
//! Transitions consume the credential and return the next state; there is no
//! way back. Each [`OAuthState`] variant only holds the fields that state can
//! have, so an access token without a secret or a request token with a
//! verifier cannot be constructed.

use common::Secret;
use tracing::{debug, info};
use url::Url;

use crate::constants::{DEFAULT_DOMAIN, OAUTH_AUTHORIZE_URL, OAUTH_VERSION, OOB_CALLBACK};
use crate::error::{Error, Result};
use crate::oauth::base_string::{OAuthParams, build_base_string};
use crate::oauth::context::SigningContext;
use crate::oauth::header::build_auth_header;
use crate::oauth::response::{token_info_from_body, token_info_from_url};
use crate::oauth::signer::{SignatureMethod, sign_with};
use crate::request::HttpRequest;

/// The registered application making requests on the user's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumer {
    pub key: String,
    pub secret: Secret<String>,
    pub signature_method: SignatureMethod,
}

impl Consumer {
    /// HMAC-SHA1 consumer.
    pub fn new(key: impl Into<String>, secret: impl Into<Secret<String>>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            signature_method: SignatureMethod::HmacSha1,
        }
    }

    pub fn with_signature_method(mut self, method: SignatureMethod) -> Self {
        self.signature_method = method;
        self
    }
}

/// Lifecycle position of an [`OAuthCredential`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    RequestToken,
    AuthorizedRequestToken,
    AccessToken,
}

impl TokenState {
    pub fn label(&self) -> &'static str {
        match self {
            TokenState::RequestToken => "request_token",
            TokenState::AuthorizedRequestToken => "authorized_request_token",
            TokenState::AccessToken => "access_token",
        }
    }
}

/// State-specific token fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OAuthState {
    /// Before or just after the request-token response. Token and secret
    /// are filled in from that response.
    RequestToken {
        token: Option<String>,
        token_secret: Option<Secret<String>>,
        callback: Option<String>,
    },
    /// The user approved the request token and the redirect carried a verifier.
    AuthorizedRequestToken {
        token: String,
        verifier: String,
        token_secret: Option<Secret<String>>,
        callback: Option<String>,
    },
    AccessToken {
        token: String,
        token_secret: Secret<String>,
    },
}

/// Options for the user-facing authorization page URL.
#[derive(Debug, Clone)]
pub struct AuthorizationUrlOptions<'a> {
    pub auth_server: &'a str,
    /// Hosted domain (`hd`), `default` for regular accounts
    pub domain: &'a str,
    /// ISO 639 language of the approval page (`hl`)
    pub language: Option<&'a str>,
    /// `mobile` forces the mobile approval page (`btmpl`)
    pub btmpl: Option<&'a str>,
    pub callback: Option<&'a str>,
}

impl Default for AuthorizationUrlOptions<'_> {
    fn default() -> Self {
        Self {
            auth_server: OAUTH_AUTHORIZE_URL,
            domain: DEFAULT_DOMAIN,
            language: None,
            btmpl: None,
            callback: None,
        }
    }
}

/// OAuth 1.0 HMAC-SHA1 credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredential {
    consumer: Consumer,
    state: OAuthState,
}

impl OAuthCredential {
    /// Empty request token, ready to ask the server for a request token.
    pub fn new(consumer: Consumer) -> Self {
        Self {
            consumer,
            state: OAuthState::RequestToken {
                token: None,
                token_secret: None,
                callback: None,
            },
        }
    }

    /// Rebuild an access token obtained earlier.
    pub fn from_access_token(
        consumer: Consumer,
        token: impl Into<String>,
        token_secret: impl Into<Secret<String>>,
    ) -> Self {
        Self {
            consumer,
            state: OAuthState::AccessToken {
                token: token.into(),
                token_secret: token_secret.into(),
            },
        }
    }

    /// Rebuild a request token received earlier, e.g. in another process.
    pub fn from_request_token(
        consumer: Consumer,
        token: impl Into<String>,
        token_secret: impl Into<Secret<String>>,
    ) -> Self {
        Self {
            consumer,
            state: OAuthState::RequestToken {
                token: Some(token.into()),
                token_secret: Some(token_secret.into()),
                callback: None,
            },
        }
    }

    /// Set the URL the user is sent back to after authorizing.
    ///
    /// Access tokens carry no callback; the value is dropped for them.
    pub fn with_callback(mut self, url: impl Into<String>) -> Self {
        match &mut self.state {
            OAuthState::RequestToken { callback, .. }
            | OAuthState::AuthorizedRequestToken { callback, .. } => *callback = Some(url.into()),
            OAuthState::AccessToken { .. } => {}
        }
        self
    }

    pub fn consumer(&self) -> &Consumer {
        &self.consumer
    }

    pub fn oauth_state(&self) -> &OAuthState {
        &self.state
    }

    pub fn state(&self) -> TokenState {
        match self.state {
            OAuthState::RequestToken { .. } => TokenState::RequestToken,
            OAuthState::AuthorizedRequestToken { .. } => TokenState::AuthorizedRequestToken,
            OAuthState::AccessToken { .. } => TokenState::AccessToken,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            OAuthState::RequestToken { token, .. } => token.as_deref(),
            OAuthState::AuthorizedRequestToken { token, .. }
            | OAuthState::AccessToken { token, .. } => Some(token.as_str()),
        }
    }

    pub fn token_secret(&self) -> Option<&str> {
        match &self.state {
            OAuthState::RequestToken { token_secret, .. }
            | OAuthState::AuthorizedRequestToken { token_secret, .. } => {
                token_secret.as_ref().map(|s| s.expose().as_str())
            }
            OAuthState::AccessToken { token_secret, .. } => Some(token_secret.expose().as_str()),
        }
    }

    pub fn verifier(&self) -> Option<&str> {
        match &self.state {
            OAuthState::AuthorizedRequestToken { verifier, .. } => Some(verifier.as_str()),
            _ => None,
        }
    }

    pub fn callback(&self) -> Option<&str> {
        match &self.state {
            OAuthState::RequestToken { callback, .. }
            | OAuthState::AuthorizedRequestToken { callback, .. } => callback.as_deref(),
            OAuthState::AccessToken { .. } => None,
        }
    }

    /// Store the token and secret returned by the request-token endpoint.
    pub fn with_request_token_response(self, body: &str) -> Result<Self> {
        let OAuthState::RequestToken { callback, .. } = self.state else {
            return Err(Error::InvalidTransition(format!(
                "request token response applied in state {}",
                self.state().label()
            )));
        };
        let info = token_info_from_body(body);
        let token = info
            .token
            .ok_or_else(|| Error::MissingField("oauth_token in request token response".into()))?;

        debug!(consumer_key = %self.consumer.key, "received request token");
        Ok(Self {
            consumer: self.consumer,
            state: OAuthState::RequestToken {
                token: Some(token),
                token_secret: info.token_secret.map(Secret::new),
                callback,
            },
        })
    }

    /// RequestToken → AuthorizedRequestToken using the authorization redirect URL.
    pub fn authorize(self, redirect_url: &str) -> Result<Self> {
        let OAuthState::RequestToken {
            token_secret,
            callback,
            ..
        } = self.state
        else {
            return Err(Error::InvalidTransition(format!(
                "authorize called in state {}",
                self.state().label()
            )));
        };
        let url = Url::parse(redirect_url)
            .map_err(|e| Error::InvalidUrl(format!("{redirect_url}: {e}")))?;
        let info = token_info_from_url(&url);
        let token = info
            .token
            .ok_or_else(|| Error::MissingField("oauth_token in redirect URL".into()))?;
        let verifier = info
            .verifier
            .ok_or_else(|| Error::MissingField("oauth_verifier in redirect URL".into()))?;

        info!(consumer_key = %self.consumer.key, "request token authorized");
        Ok(Self {
            consumer: self.consumer,
            state: OAuthState::AuthorizedRequestToken {
                token,
                verifier,
                token_secret,
                callback,
            },
        })
    }

    /// AuthorizedRequestToken → AccessToken using the access-token endpoint body.
    ///
    /// The verifier and callback are dropped.
    pub fn upgrade(self, body: &str) -> Result<Self> {
        if self.state() != TokenState::AuthorizedRequestToken {
            return Err(Error::InvalidTransition(format!(
                "upgrade called in state {}",
                self.state().label()
            )));
        }
        let info = token_info_from_body(body);
        let token = info
            .token
            .ok_or_else(|| Error::MissingField("oauth_token in access token response".into()))?;
        let token_secret = info.token_secret.ok_or_else(|| {
            Error::MissingField("oauth_token_secret in access token response".into())
        })?;

        info!(consumer_key = %self.consumer.key, "upgraded to access token");
        Ok(Self {
            consumer: self.consumer,
            state: OAuthState::AccessToken {
                token,
                token_secret: Secret::new(token_secret),
            },
        })
    }

    /// URL of the page where the user approves the request token.
    pub fn authorization_url(&self, options: &AuthorizationUrlOptions<'_>) -> Result<Url> {
        let token = self
            .token()
            .ok_or_else(|| Error::MissingField("oauth_token for authorization URL".into()))?;
        let mut url = Url::parse(options.auth_server)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", options.auth_server)))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("oauth_token", token);
            query.append_pair("hd", options.domain);
            if let Some(callback) = options.callback {
                query.append_pair("oauth_callback", callback);
            }
            if let Some(language) = options.language {
                query.append_pair("hl", language);
            }
            if let Some(btmpl) = options.btmpl {
                query.append_pair("btmpl", btmpl);
            }
        }
        Ok(url)
    }

    /// Signed POST asking `endpoint` for a request token valid for `scopes`.
    ///
    /// The callback defaults to `oob` when none was configured.
    pub fn request_token_request(
        &self,
        scopes: &[&str],
        endpoint: &str,
        ctx: &SigningContext,
    ) -> Result<HttpRequest> {
        let mut request = HttpRequest::parse("POST", endpoint)?;
        if !scopes.is_empty() {
            request
                .url
                .query_pairs_mut()
                .append_pair("scope", &scopes.join(" "));
        }
        let callback = self.callback().unwrap_or(OOB_CALLBACK);
        self.sign_into(&mut request, ctx, None, Some(callback))?;
        request.set_content_length(0);
        Ok(request)
    }

    /// Signed POST asking `endpoint` to exchange the authorized request token.
    pub fn access_token_request(&self, endpoint: &str, ctx: &SigningContext) -> Result<HttpRequest> {
        let mut request = HttpRequest::parse("POST", endpoint)?;
        request.set_content_length(0);
        self.apply_to_with(&mut request, ctx)?;
        Ok(request)
    }

    /// Sign `request` with a fresh nonce and timestamp.
    pub fn apply_to(&self, request: &mut HttpRequest) -> Result<()> {
        self.apply_to_with(request, &SigningContext::generate())
    }

    /// Sign `request` with an injected nonce and timestamp.
    pub fn apply_to_with(&self, request: &mut HttpRequest, ctx: &SigningContext) -> Result<()> {
        self.sign_into(request, ctx, self.token(), self.callback())
    }

    fn sign_into(
        &self,
        request: &mut HttpRequest,
        ctx: &SigningContext,
        token: Option<&str>,
        callback: Option<&str>,
    ) -> Result<()> {
        let params = OAuthParams {
            consumer_key: &self.consumer.key,
            nonce: &ctx.nonce,
            signature_method: self.consumer.signature_method,
            timestamp: ctx.timestamp,
            version: Some(OAUTH_VERSION),
            callback,
            token,
            verifier: self.verifier(),
        };
        let base_string = build_base_string(request, &params);
        let signature = sign_with(
            self.consumer.signature_method,
            &base_string,
            self.consumer.secret.expose(),
            self.token_secret(),
        )?;
        debug!(
            method = %request.method,
            url = %request.url,
            state = self.state().label(),
            "signed OAuth request"
        );
        request.set_authorization(&build_auth_header(&params, &signature))
    }
}
