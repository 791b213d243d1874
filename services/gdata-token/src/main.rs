//! gdata-token
//!
//! Command-line front end for the token store:
//! 1. Loads the TOML configuration and opens the token file
//! 2. Obtains login, delegated, or OAuth tokens from the auth endpoints
//! 3. Prints the `Authorization` header to use for a given URL

mod commands;
mod config;
mod metrics;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use token_store::FileBackend;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::App;
use crate::config::{Config, LogFormat};

/// Obtain, store, and apply Google Data API authorization tokens
#[derive(Parser, Debug)]
#[command(name = "gdata-token", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (falls back to CONFIG_PATH, then gdata-token.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Render Prometheus metrics to stderr after the command
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Authorization header stored for a URL
    Header {
        url: String,
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
    },

    /// List stored scopes and their credential kind
    List,

    /// Remove the credential matching a URL
    Remove { url: String },

    /// Log in with email and password and store the token
    AddLogin {
        #[arg(long)]
        email: String,
        #[arg(long, env = "GDATA_PASSWORD", hide_env_values = true)]
        password: String,
        /// URL prefix the token is valid for (repeatable)
        #[arg(long = "scope", required = true)]
        scopes: Vec<String>,
        #[arg(long, requires = "captcha_answer")]
        captcha_token: Option<String>,
        #[arg(long, requires = "captcha_token")]
        captcha_answer: Option<String>,
    },

    /// Print the URL that starts a delegated (AuthSub) authorization
    AuthsubUrl {
        /// Where the user is redirected after approving
        #[arg(long)]
        next: String,
        #[arg(long = "scope", required = true)]
        scopes: Vec<String>,
    },

    /// Store the delegated token from the redirect URL
    AddDelegated {
        redirect_url: String,
        /// Override the scopes carried by the redirect (repeatable)
        #[arg(long = "scope")]
        scopes: Vec<String>,
        /// Exchange the single-use token for a session token first
        #[arg(long)]
        upgrade: bool,
    },

    /// Fetch an OAuth request token and print the approval URL
    OauthRequestToken {
        #[arg(long = "scope", required = true)]
        scopes: Vec<String>,
    },

    /// Exchange an approved OAuth request token for an access token
    OauthAccessToken {
        redirect_url: String,
        #[arg(long)]
        request_token: String,
        #[arg(long, env = "GDATA_REQUEST_TOKEN_SECRET", hide_env_values = true)]
        request_token_secret: String,
    },

    /// Print a signed OAuth Authorization header for one request
    OauthHeader {
        url: String,
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        #[arg(long)]
        token: String,
        #[arg(long, env = "GDATA_TOKEN_SECRET", hide_env_values = true)]
        token_secret: String,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Header { .. } => "header",
            Command::List => "list",
            Command::Remove { .. } => "remove",
            Command::AddLogin { .. } => "add-login",
            Command::AuthsubUrl { .. } => "authsub-url",
            Command::AddDelegated { .. } => "add-delegated",
            Command::OauthRequestToken { .. } => "oauth-request-token",
            Command::OauthAccessToken { .. } => "oauth-access-token",
            Command::OauthHeader { .. } => "oauth-header",
        }
    }
}

/// Initialize tracing on stderr with LOG_LEVEL / RUST_LOG support.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run(app: &App<'_>, command: &Command) -> Result<String> {
    match command {
        Command::Header { url, method } => app.header(method, url).await,
        Command::List => app.list().await,
        Command::Remove { url } => app.remove(url).await,
        Command::AddLogin {
            email,
            password,
            scopes,
            captcha_token,
            captcha_answer,
        } => {
            let captcha = captcha_token.as_deref().zip(captcha_answer.as_deref());
            app.add_login(email, password, scopes, captcha).await
        }
        Command::AuthsubUrl { next, scopes } => app.authsub_url(next, scopes),
        Command::AddDelegated {
            redirect_url,
            scopes,
            upgrade,
        } => app.add_delegated(redirect_url, scopes, *upgrade).await,
        Command::OauthRequestToken { scopes } => app.oauth_request_token(scopes).await,
        Command::OauthAccessToken {
            redirect_url,
            request_token,
            request_token_secret,
        } => {
            app.oauth_access_token(request_token, request_token_secret, redirect_url)
                .await
        }
        Command::OauthHeader {
            url,
            method,
            token,
            token_secret,
        } => app.oauth_header(method, url, token, token_secret),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref());
    let config = if cli.config.is_some() || config_path.exists() {
        Config::load(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?
    } else {
        Config::default()
    };

    init_tracing(config.log_format);
    info!(
        path = %config_path.display(),
        store = %config.store.path.display(),
        oauth = config.oauth.is_some(),
        "configuration loaded"
    );

    let prometheus = if cli.print_metrics {
        Some(metrics::install_recorder()?)
    } else {
        None
    };

    let backend = FileBackend::open(config.store.path.clone())
        .await
        .with_context(|| format!("failed to open token file {}", config.store.path.display()))?;
    let app = App {
        config: &config,
        backend: &backend,
        client: reqwest::Client::new(),
    };

    let name = cli.command.name();
    let result = run(&app, &cli.command).await;
    metrics::record_command(name, result.is_ok());

    if let Some(handle) = prometheus {
        eprint!("{}", handle.render());
    }

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            Ok(())
        }
        Err(e) => {
            error!(command = name, error = %e, "command failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_header_with_method() {
        let cli = Cli::try_parse_from([
            "gdata-token",
            "header",
            "-X",
            "POST",
            "http://www.google.com/calendar/feeds/default",
        ])
        .unwrap();
        match cli.command {
            Command::Header { url, method } => {
                assert_eq!(url, "http://www.google.com/calendar/feeds/default");
                assert_eq!(method, "POST");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn add_login_collects_repeated_scopes() {
        let cli = Cli::try_parse_from([
            "gdata-token",
            "--config",
            "/etc/gdata-token.toml",
            "add-login",
            "--email",
            "u@example.com",
            "--password",
            "pw",
            "--scope",
            "http://x/",
            "--scope",
            "http://y/",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("/etc/gdata-token.toml"));
        let Command::AddLogin { scopes, captcha_token, .. } = cli.command else {
            panic!("expected add-login");
        };
        assert_eq!(scopes, vec!["http://x/", "http://y/"]);
        assert!(captcha_token.is_none());
    }

    #[test]
    fn captcha_token_needs_answer() {
        let result = Cli::try_parse_from([
            "gdata-token",
            "add-login",
            "--email",
            "u@example.com",
            "--password",
            "pw",
            "--scope",
            "http://x/",
            "--captcha-token",
            "ct",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn command_names_match_subcommands() {
        let cli = Cli::try_parse_from(["gdata-token", "list"]).unwrap();
        assert_eq!(cli.command.name(), "list");
        let cli = Cli::try_parse_from(["gdata-token", "remove", "http://x/"]).unwrap();
        assert_eq!(cli.command.name(), "remove");
    }
}
