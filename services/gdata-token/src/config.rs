//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The OAuth consumer secret is loaded from GDATA_CONSUMER_SECRET or
//! consumer_secret_file, never stored in the TOML directly.

use std::path::{Path, PathBuf};

use common::Secret;
use gdata_auth::constants::{
    ACCESS_TOKEN_URL, AUTHSUB_REQUEST_URL, AUTHSUB_SESSION_TOKEN_URL, CLIENT_LOGIN_URL,
    DEFAULT_ACCOUNT_TYPE, DEFAULT_DOMAIN, OAUTH_AUTHORIZE_URL, REQUEST_TOKEN_URL,
};
use gdata_auth::{Consumer, SignatureMethod};
use serde::Deserialize;

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub login: LoginConfig,
    #[serde(default)]
    pub authsub: AuthSubConfig,
    /// Absent when no OAuth consumer is registered
    #[serde(default)]
    pub oauth: Option<OAuthConfig>,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Where credentials are persisted
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Email/password login settings
#[derive(Debug, Deserialize)]
pub struct LoginConfig {
    #[serde(default = "default_login_endpoint")]
    pub endpoint: String,
    /// Service code of the target API (`cl` for calendar, `writely` for docs)
    #[serde(default = "default_service")]
    pub service: String,
    /// Identifies this application to the login endpoint
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_account_type")]
    pub account_type: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            endpoint: default_login_endpoint(),
            service: default_service(),
            source: default_source(),
            account_type: default_account_type(),
        }
    }
}

/// Delegated (AuthSub) settings
#[derive(Debug, Deserialize)]
pub struct AuthSubConfig {
    #[serde(default = "default_authsub_request_url")]
    pub request_url: String,
    #[serde(default = "default_session_token_url")]
    pub session_token_url: String,
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default)]
    pub secure: bool,
}

impl Default for AuthSubConfig {
    fn default() -> Self {
        Self {
            request_url: default_authsub_request_url(),
            session_token_url: default_session_token_url(),
            domain: default_domain(),
            secure: false,
        }
    }
}

/// OAuth 1.0 consumer settings
#[derive(Debug, Deserialize)]
pub struct OAuthConfig {
    pub consumer_key: String,
    #[serde(skip)]
    pub consumer_secret: Option<Secret<String>>,
    /// Path to a file containing the consumer secret (alternative to
    /// GDATA_CONSUMER_SECRET)
    #[serde(default)]
    pub consumer_secret_file: Option<PathBuf>,
    #[serde(default = "default_signature_method")]
    pub signature_method: String,
    #[serde(default = "default_request_token_url")]
    pub request_token_url: String,
    #[serde(default = "default_access_token_url")]
    pub access_token_url: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default)]
    pub callback: Option<String>,
}

impl OAuthConfig {
    /// Consumer built from the key and resolved secret.
    pub fn consumer(&self) -> common::Result<Consumer> {
        let secret = self.consumer_secret.clone().ok_or_else(|| {
            common::Error::Config(
                "OAuth consumer secret not set: use GDATA_CONSUMER_SECRET or consumer_secret_file"
                    .into(),
            )
        })?;
        Ok(Consumer::new(self.consumer_key.clone(), secret))
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("gdata-tokens.json")
}

fn default_login_endpoint() -> String {
    CLIENT_LOGIN_URL.to_owned()
}

fn default_service() -> String {
    "cl".to_owned()
}

fn default_source() -> String {
    concat!("gdata-token-", env!("CARGO_PKG_VERSION")).to_owned()
}

fn default_account_type() -> String {
    DEFAULT_ACCOUNT_TYPE.to_owned()
}

fn default_authsub_request_url() -> String {
    AUTHSUB_REQUEST_URL.to_owned()
}

fn default_session_token_url() -> String {
    AUTHSUB_SESSION_TOKEN_URL.to_owned()
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_owned()
}

fn default_signature_method() -> String {
    SignatureMethod::HmacSha1.as_str().to_owned()
}

fn default_request_token_url() -> String {
    REQUEST_TOKEN_URL.to_owned()
}

fn default_access_token_url() -> String {
    ACCESS_TOKEN_URL.to_owned()
}

fn default_authorize_url() -> String {
    OAUTH_AUTHORIZE_URL.to_owned()
}

/// Require an absolute http(s) URL.
fn validate_url(field: &str, value: &str) -> common::Result<()> {
    let url = url::Url::parse(value)
        .map_err(|e| common::Error::Config(format!("{field} is not a valid URL ({e}): {value}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(common::Error::Config(format!(
            "{field} must start with http:// or https://, got: {value}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Consumer secret resolution order:
    /// 1. GDATA_CONSUMER_SECRET env var
    /// 2. consumer_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.validate()?;

        if let Some(oauth) = config.oauth.as_mut() {
            if let Ok(secret) = std::env::var("GDATA_CONSUMER_SECRET") {
                oauth.consumer_secret = Some(Secret::new(secret));
            } else if let Some(ref secret_file) = oauth.consumer_secret_file {
                let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                    common::Error::Config(format!(
                        "failed to read consumer_secret_file {}: {e}",
                        secret_file.display()
                    ))
                })?;
                let secret = secret.trim().to_owned();
                if !secret.is_empty() {
                    oauth.consumer_secret = Some(Secret::new(secret));
                }
            }
        }

        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        validate_url("login.endpoint", &self.login.endpoint)?;
        validate_url("authsub.request_url", &self.authsub.request_url)?;
        validate_url("authsub.session_token_url", &self.authsub.session_token_url)?;

        if let Some(oauth) = &self.oauth {
            if oauth.consumer_key.trim().is_empty() {
                return Err(common::Error::Config(
                    "oauth.consumer_key must not be empty".into(),
                ));
            }
            let method: SignatureMethod = oauth
                .signature_method
                .parse()
                .map_err(|e| common::Error::Config(format!("oauth.signature_method: {e}")))?;
            if method != SignatureMethod::HmacSha1 {
                return Err(common::Error::Config(format!(
                    "oauth.signature_method {method} is not supported, use HMAC-SHA1"
                )));
            }
            validate_url("oauth.request_token_url", &oauth.request_token_url)?;
            validate_url("oauth.access_token_url", &oauth.access_token_url)?;
            validate_url("oauth.authorize_url", &oauth.authorize_url)?;
            if let Some(callback) = &oauth.callback
                && callback != "oob"
            {
                validate_url("oauth.callback", callback)?;
            }
        }
        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("gdata-token.toml")
    }
}
