//! Delegated (AuthSub) tokens obtained through a browser redirect
//!
//! Flow:
//! 1. The app sends the user to [`authorization_url`]; the requested scopes
//!    are also appended to the `next` URL so they come back on the redirect.
//! 2. The authorization server redirects to `next?token=...&auth_sub_scopes=...`
//!    and [`DelegatedCredential::from_redirect_url`] reads both.
//! 3. A single-use token may be exchanged for a session token; the
//!    response body's `Token=` line is read by [`DelegatedCredential::upgrade`].

use tracing::debug;
use url::Url;

use crate::constants::{AUTHSUB_AUTH_LABEL, AUTHSUB_REQUEST_URL, DEFAULT_DOMAIN, DEFAULT_SCOPES_PARAM};
use crate::error::{Error, Result};
use crate::request::HttpRequest;

/// Delegated credential (`Authorization: AuthSub token=...`).
///
/// `scopes` are not used when applying the token; they are kept so a
/// stored credential can be registered under the right scopes again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegatedCredential {
    pub value: String,
    pub scopes: Vec<String>,
}

/// Options for [`authorization_url`].
#[derive(Debug, Clone)]
pub struct AuthSubOptions<'a> {
    /// Request a secure (signed) token
    pub secure: bool,
    /// Request a token that can be upgraded to a session token
    pub session: bool,
    pub request_url: &'a str,
    pub domain: &'a str,
    /// Query key used to echo the scopes back on the redirect
    pub scopes_param: &'a str,
}

impl Default for AuthSubOptions<'_> {
    fn default() -> Self {
        Self {
            secure: false,
            session: true,
            request_url: AUTHSUB_REQUEST_URL,
            domain: DEFAULT_DOMAIN,
            scopes_param: DEFAULT_SCOPES_PARAM,
        }
    }
}

impl DelegatedCredential {
    pub fn new(value: impl Into<String>, scopes: Vec<String>) -> Self {
        Self {
            value: value.into(),
            scopes,
        }
    }

    /// Read the token and scopes from the redirect URL.
    ///
    /// Returns `None` when the URL cannot be parsed or has no `token`
    /// parameter. Missing scopes give an empty list.
    pub fn from_redirect_url(url: &str, scopes_param: &str) -> Option<Self> {
        let url = Url::parse(url).ok()?;
        let mut token = None;
        let mut scopes = Vec::new();
        for (key, value) in url.query_pairs() {
            if key == "token" {
                token = Some(value.into_owned());
            } else if key == scopes_param {
                scopes = value
                    .split(' ')
                    .filter(|s| !s.is_empty())
                    .map(str::to_owned)
                    .collect();
            }
        }
        token.map(|value| Self { value, scopes })
    }

    /// Replace the single-use value with the session token in `body`.
    ///
    /// Returns `None` when the body carries no `Token=` line.
    pub fn upgrade(self, body: &str) -> Option<Self> {
        let value = session_token_from_body(body)?;
        debug!(scopes = self.scopes.len(), "upgraded delegated token to session token");
        Some(Self {
            value,
            scopes: self.scopes,
        })
    }

    pub fn header_value(&self) -> String {
        format!("{AUTHSUB_AUTH_LABEL}{}", self.value)
    }

    pub fn apply_to(&self, request: &mut HttpRequest) -> Result<()> {
        request.set_authorization(&self.header_value())
    }
}

/// Value of the first `Token=` line of a session-token response.
pub fn session_token_from_body(body: &str) -> Option<String> {
    body.lines()
        .find_map(|line| line.strip_prefix("Token="))
        .map(str::to_owned)
}

/// Build the URL the user's browser is sent to for authorization.
pub fn authorization_url(next: &str, scopes: &[&str], options: &AuthSubOptions<'_>) -> Result<Url> {
    let scopes_string = scopes.join(" ");

    let mut next = Url::parse(next).map_err(|e| Error::InvalidUrl(format!("{next}: {e}")))?;
    next.query_pairs_mut()
        .append_pair(options.scopes_param, &scopes_string);

    let mut url = Url::parse(options.request_url)
        .map_err(|e| Error::InvalidUrl(format!("{}: {e}", options.request_url)))?;
    url.query_pairs_mut()
        .append_pair("next", next.as_str())
        .append_pair("scope", &scopes_string)
        .append_pair("session", if options.session { "1" } else { "0" })
        .append_pair("secure", if options.secure { "1" } else { "0" })
        .append_pair("hd", options.domain);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(url: &Url, key: &str) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn authorization_url_carries_scopes_twice() {
        let url = authorization_url(
            "http://app.example/welcome",
            &["http://www.google.com/calendar/feeds/", "http://docs.google.com/feeds/"],
            &AuthSubOptions::default(),
        )
        .unwrap();

        assert!(url.as_str().starts_with(AUTHSUB_REQUEST_URL));
        let scope = query(&url, "scope").unwrap();
        assert_eq!(
            scope,
            "http://www.google.com/calendar/feeds/ http://docs.google.com/feeds/"
        );
        assert_eq!(query(&url, "session").as_deref(), Some("1"));
        assert_eq!(query(&url, "secure").as_deref(), Some("0"));
        assert_eq!(query(&url, "hd").as_deref(), Some("default"));

        let next = Url::parse(&query(&url, "next").unwrap()).unwrap();
        assert_eq!(query(&next, DEFAULT_SCOPES_PARAM).unwrap(), scope);
    }

    #[test]
    fn authorization_url_honours_flags() {
        let url = authorization_url(
            "http://app.example/",
            &["http://x/"],
            &AuthSubOptions {
                secure: true,
                session: false,
                domain: "example.edu",
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(query(&url, "session").as_deref(), Some("0"));
        assert_eq!(query(&url, "secure").as_deref(), Some("1"));
        assert_eq!(query(&url, "hd").as_deref(), Some("example.edu"));
    }

    #[test]
    fn authorization_url_rejects_relative_next() {
        let result = authorization_url("/welcome", &["http://x/"], &AuthSubOptions::default());
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn reads_token_and_scopes_from_redirect() {
        let cred = DelegatedCredential::from_redirect_url(
            "http://app.example/welcome?auth_sub_scopes=http%3A%2F%2Fx%2F+http%3A%2F%2Fy%2F&token=CKF50YzIHxCT85KMAg",
            DEFAULT_SCOPES_PARAM,
        )
        .unwrap();
        assert_eq!(cred.value, "CKF50YzIHxCT85KMAg");
        assert_eq!(cred.scopes, vec!["http://x/", "http://y/"]);
    }

    #[test]
    fn redirect_without_scopes_has_empty_list() {
        let cred =
            DelegatedCredential::from_redirect_url("http://app.example/?token=abc", "custom")
                .unwrap();
        assert_eq!(cred.value, "abc");
        assert!(cred.scopes.is_empty());
    }

    #[test]
    fn redirect_without_token_is_none() {
        assert!(
            DelegatedCredential::from_redirect_url("http://app.example/?x=1", DEFAULT_SCOPES_PARAM)
                .is_none()
        );
        assert!(DelegatedCredential::from_redirect_url("garbage", DEFAULT_SCOPES_PARAM).is_none());
    }

    #[test]
    fn upgrade_replaces_value_keeps_scopes() {
        let cred = DelegatedCredential::new("single-use", vec!["http://x/".into()]);
        let upgraded = cred.upgrade("Token=session-token\nExpiration=20991231\n").unwrap();
        assert_eq!(upgraded.value, "session-token");
        assert_eq!(upgraded.scopes, vec!["http://x/"]);
    }

    #[test]
    fn upgrade_without_token_line_is_none() {
        let cred = DelegatedCredential::new("single-use", vec![]);
        assert!(cred.upgrade("Error=Unknown\n").is_none());
    }

    #[test]
    fn apply_sets_authsub_header() {
        let mut request = HttpRequest::parse("GET", "http://a.com/feeds").unwrap();
        request.set_authorization("GoogleLogin auth=old").unwrap();
        DelegatedCredential::new("abc", vec![])
            .apply_to(&mut request)
            .unwrap();
        assert_eq!(request.authorization(), Some("AuthSub token=abc"));
    }
}
