//! Token information carried by token-endpoint bodies and redirect URLs.
//!
//! These helpers never fail: missing fields come back as `None` and the
//! state machine decides whether that is acceptable.

use url::Url;

use crate::encoding::percent_decode;

/// `oauth_token` / `oauth_token_secret` from a token endpoint body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenInfo {
    pub token: Option<String>,
    pub token_secret: Option<String>,
}

/// `oauth_token` / `oauth_verifier` from an authorization redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectInfo {
    pub token: Option<String>,
    pub verifier: Option<String>,
}

/// Parse an `&`-joined token endpoint response body.
///
/// ```
/// use gdata_auth::oauth::response::token_info_from_body;
///
/// let info = token_info_from_body("oauth_token=ab%2Fc&oauth_token_secret=s");
/// assert_eq!(info.token.as_deref(), Some("ab/c"));
/// assert_eq!(info.token_secret.as_deref(), Some("s"));
/// ```
pub fn token_info_from_body(body: &str) -> TokenInfo {
    let mut info = TokenInfo::default();
    for pair in body.trim().split('&') {
        if let Some(value) = pair.strip_prefix("oauth_token_secret=") {
            info.token_secret = Some(percent_decode(value));
        } else if let Some(value) = pair.strip_prefix("oauth_token=") {
            info.token = Some(percent_decode(value));
        }
    }
    info
}

/// Read `oauth_token` and `oauth_verifier` from the URL the authorization
/// server redirected the browser to.
pub fn token_info_from_url(url: &Url) -> RedirectInfo {
    let mut info = RedirectInfo::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "oauth_token" => info.token = Some(value.into_owned()),
            "oauth_verifier" => info.verifier = Some(value.into_owned()),
            _ => {}
        }
    }
    info
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_without_tokens_yields_none() {
        assert_eq!(token_info_from_body("foo=bar"), TokenInfo::default());
        assert_eq!(token_info_from_body(""), TokenInfo::default());
    }

    #[test]
    fn body_with_trailing_newline_parses() {
        let info = token_info_from_body("oauth_token=T2&oauth_token_secret=S2\n");
        assert_eq!(info.token.as_deref(), Some("T2"));
        assert_eq!(info.token_secret.as_deref(), Some("S2"));
    }

    #[test]
    fn body_with_extra_fields_ignores_them() {
        let info = token_info_from_body(
            "oauth_token=T&oauth_token_secret=S&oauth_callback_confirmed=true",
        );
        assert_eq!(info.token.as_deref(), Some("T"));
        assert_eq!(info.token_secret.as_deref(), Some("S"));
    }

    #[test]
    fn redirect_url_is_decoded() {
        let url = Url::parse("http://app.example/cb?oauth_token=4%2FT&oauth_verifier=V").unwrap();
        let info = token_info_from_url(&url);
        assert_eq!(info.token.as_deref(), Some("4/T"));
        assert_eq!(info.verifier.as_deref(), Some("V"));
    }

    #[test]
    fn redirect_url_without_verifier() {
        let url = Url::parse("http://app.example/cb?oauth_token=T").unwrap();
        let info = token_info_from_url(&url);
        assert_eq!(info.token.as_deref(), Some("T"));
        assert!(info.verifier.is_none());
    }
}
