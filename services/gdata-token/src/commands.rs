//! Subcommand implementations
//!
//! Each command returns the text to print on stdout so it can be tested
//! without capturing output. Store-backed commands load the store from the
//! backend, mutate it, and save it back.

use anyhow::{Context, Result, bail};
use gdata_auth::exchange::{self, LoginOutcome};
use gdata_auth::oauth::AuthorizationUrlOptions;
use gdata_auth::{
    AuthSubOptions, CaptchaAnswer, Credential, DelegatedCredential, HttpRequest, LoginRequest,
    OAuthCredential,
};
use token_store::{BlobBackend, TokenStore, load_store, save_store};
use tracing::{info, warn};

use crate::config::{Config, OAuthConfig};

/// Shared inputs of every command.
pub struct App<'a> {
    pub config: &'a Config,
    pub backend: &'a dyn BlobBackend,
    pub client: reqwest::Client,
}

impl App<'_> {
    async fn load(&self) -> Result<TokenStore> {
        load_store(self.backend)
            .await
            .context("failed to load token store")
    }

    async fn save(&self, store: &TokenStore) -> Result<()> {
        let report = save_store(self.backend, store)
            .await
            .context("failed to save token store")?;
        if report.skipped > 0 {
            warn!(skipped = report.skipped, "some credentials were not persisted");
        }
        Ok(())
    }

    fn oauth(&self) -> Result<&OAuthConfig> {
        self.config
            .oauth
            .as_ref()
            .context("no [oauth] section in the configuration")
    }

    /// `Authorization` header value for `url` from the store.
    pub async fn header(&self, method: &str, url: &str) -> Result<String> {
        let store = self.load().await?;
        let mut request = HttpRequest::parse(method, url)?;
        if !store.authorize(&mut request)? {
            bail!("no stored credential matches {url}");
        }
        Ok(request.authorization().unwrap_or_default().to_owned())
    }

    /// One `scope<TAB>kind` line per stored scope.
    pub async fn list(&self) -> Result<String> {
        let store = self.load().await?;
        let lines: Vec<String> = store
            .entries()
            .into_iter()
            .map(|(scope, credential)| format!("{scope}\t{}", credential.kind()))
            .collect();
        Ok(lines.join("\n"))
    }

    pub async fn remove(&self, url: &str) -> Result<String> {
        let store = self.load().await?;
        if !store.remove(url) {
            bail!("no stored credential matches {url}");
        }
        self.save(&store).await?;
        Ok(format!("removed credential for {url}"))
    }

    /// Log in and store the token under `scopes`.
    ///
    /// A CAPTCHA challenge is printed instead; rerun with the answer.
    pub async fn add_login(
        &self,
        email: &str,
        password: &str,
        scopes: &[String],
        captcha: Option<(&str, &str)>,
    ) -> Result<String> {
        let login = &self.config.login;
        let mut request = LoginRequest::new(email, password, &login.service, &login.source);
        request.account_type = &login.account_type;
        if let Some((token, response)) = captcha {
            request = request.with_captcha_answer(CaptchaAnswer { token, response });
        }

        match exchange::client_login(&self.client, &login.endpoint, &request).await? {
            LoginOutcome::Token(credential) => {
                let store = self.load().await?;
                store.add(credential.into(), scopes);
                self.save(&store).await?;
                info!(email, scopes = scopes.len(), "stored login token");
                Ok(format!("stored login token for {} scope(s)", scopes.len()))
            }
            LoginOutcome::Captcha(challenge) => Ok(format!(
                "CAPTCHA required: open {}\nthen rerun with --captcha-token {} --captcha-answer <text>",
                challenge.url, challenge.token
            )),
        }
    }

    /// URL to send the user to for a delegated token.
    pub fn authsub_url(&self, next: &str, scopes: &[String]) -> Result<String> {
        let authsub = &self.config.authsub;
        let scopes: Vec<&str> = scopes.iter().map(String::as_str).collect();
        let url = gdata_auth::authorization_url(
            next,
            &scopes,
            &AuthSubOptions {
                secure: authsub.secure,
                session: true,
                request_url: &authsub.request_url,
                domain: &authsub.domain,
                ..Default::default()
            },
        )?;
        Ok(url.to_string())
    }

    /// Store the delegated token carried by a redirect URL.
    ///
    /// `scopes` overrides the scopes echoed on the redirect.
    pub async fn add_delegated(
        &self,
        redirect_url: &str,
        scopes: &[String],
        upgrade: bool,
    ) -> Result<String> {
        let mut credential = DelegatedCredential::from_redirect_url(
            redirect_url,
            gdata_auth::constants::DEFAULT_SCOPES_PARAM,
        )
        .context("redirect URL carries no token")?;
        if !scopes.is_empty() {
            credential.scopes = scopes.to_vec();
        }
        if credential.scopes.is_empty() {
            bail!("no scopes on the redirect URL; pass --scope");
        }
        if upgrade {
            credential = exchange::upgrade_delegated(
                &self.client,
                &self.config.authsub.session_token_url,
                credential,
            )
            .await?;
        }

        let scopes = credential.scopes.clone();
        let store = self.load().await?;
        store.add(credential.into(), &scopes);
        self.save(&store).await?;
        Ok(format!("stored delegated token for {} scope(s)", scopes.len()))
    }

    /// Fetch a request token and print it with the approval page URL.
    pub async fn oauth_request_token(&self, scopes: &[String]) -> Result<String> {
        let oauth = self.oauth()?;
        let mut credential = OAuthCredential::new(oauth.consumer()?);
        if let Some(callback) = &oauth.callback {
            credential = credential.with_callback(callback.clone());
        }
        let scopes: Vec<&str> = scopes.iter().map(String::as_str).collect();
        let credential = exchange::fetch_request_token(
            &self.client,
            credential,
            &scopes,
            &oauth.request_token_url,
        )
        .await?;

        let url = credential.authorization_url(&AuthorizationUrlOptions {
            auth_server: &oauth.authorize_url,
            callback: oauth.callback.as_deref(),
            ..Default::default()
        })?;
        Ok(format!(
            "authorize at: {url}\nrequest token: {}\nrequest token secret: {}",
            credential.token().unwrap_or_default(),
            credential.token_secret().unwrap_or_default()
        ))
    }

    /// Trade an approved request token for an access token.
    pub async fn oauth_access_token(
        &self,
        request_token: &str,
        request_token_secret: &str,
        redirect_url: &str,
    ) -> Result<String> {
        let oauth = self.oauth()?;
        let credential =
            OAuthCredential::from_request_token(oauth.consumer()?, request_token, request_token_secret)
                .authorize(redirect_url)?;
        let credential =
            exchange::fetch_access_token(&self.client, credential, &oauth.access_token_url).await?;
        Ok(format!(
            "access token: {}\naccess token secret: {}",
            credential.token().unwrap_or_default(),
            credential.token_secret().unwrap_or_default()
        ))
    }

    /// Signed `Authorization` header for one request.
    pub fn oauth_header(
        &self,
        method: &str,
        url: &str,
        token: &str,
        token_secret: &str,
    ) -> Result<String> {
        let credential: Credential =
            OAuthCredential::from_access_token(self.oauth()?.consumer()?, token, token_secret).into();
        let mut request = HttpRequest::parse(method, url)?;
        credential.apply_to(&mut request)?;
        Ok(request.authorization().unwrap_or_default().to_owned())
    }
}
