//! The closed set of credential schemes

use crate::authsub::DelegatedCredential;
use crate::error::Result;
use crate::login::LoginCredential;
use crate::oauth::OAuthCredential;
use crate::request::HttpRequest;

/// Any credential that can authorize a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Login(LoginCredential),
    Delegated(DelegatedCredential),
    OAuth(OAuthCredential),
}

impl Credential {
    /// Set the request's `Authorization` header, replacing any prior value.
    ///
    /// OAuth credentials sign the request with a fresh nonce and timestamp,
    /// so two applications give different headers.
    pub fn apply_to(&self, request: &mut HttpRequest) -> Result<()> {
        match self {
            Credential::Login(cred) => cred.apply_to(request),
            Credential::Delegated(cred) => cred.apply_to(request),
            Credential::OAuth(cred) => cred.apply_to(request),
        }
    }

    /// Short scheme name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Credential::Login(_) => "login",
            Credential::Delegated(_) => "delegated",
            Credential::OAuth(_) => "oauth",
        }
    }
}

impl From<LoginCredential> for Credential {
    fn from(cred: LoginCredential) -> Self {
        Credential::Login(cred)
    }
}

impl From<DelegatedCredential> for Credential {
    fn from(cred: DelegatedCredential) -> Self {
        Credential::Delegated(cred)
    }
}

impl From<OAuthCredential> for Credential {
    fn from(cred: OAuthCredential) -> Self {
        Credential::OAuth(cred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::Consumer;

    fn request() -> HttpRequest {
        HttpRequest::parse("GET", "http://www.google.com/calendar/feeds/default").unwrap()
    }

    #[test]
    fn each_variant_sets_its_scheme() {
        let mut req = request();
        Credential::from(LoginCredential::new("L")).apply_to(&mut req).unwrap();
        assert_eq!(req.authorization(), Some("GoogleLogin auth=L"));

        Credential::from(DelegatedCredential::new("D", vec![]))
            .apply_to(&mut req)
            .unwrap();
        assert_eq!(req.authorization(), Some("AuthSub token=D"));

        let oauth = OAuthCredential::from_access_token(Consumer::new("ck", "cs"), "T", "S");
        Credential::from(oauth).apply_to(&mut req).unwrap();
        let header = req.authorization().unwrap();
        assert!(header.starts_with("OAuth "), "{header}");
        assert!(header.contains("oauth_token=\"T\""), "{header}");
    }

    #[test]
    fn oauth_application_is_not_idempotent() {
        let cred = Credential::from(OAuthCredential::from_access_token(
            Consumer::new("ck", "cs"),
            "T",
            "S",
        ));
        let mut first = request();
        let mut second = request();
        cred.apply_to(&mut first).unwrap();
        cred.apply_to(&mut second).unwrap();
        // Fresh nonce per call.
        assert_ne!(first.authorization(), second.authorization());
    }

    #[test]
    fn apply_touches_only_authorization() {
        let mut req = request();
        req.set_content_length(12);
        Credential::from(LoginCredential::new("L")).apply_to(&mut req).unwrap();
        assert_eq!(req.headers.len(), 2);
        assert_eq!(req.url.as_str(), "http://www.google.com/calendar/feeds/default");
    }

    #[test]
    fn kind_labels() {
        assert_eq!(Credential::from(LoginCredential::new("x")).kind(), "login");
        assert_eq!(
            Credential::from(DelegatedCredential::new("x", vec![])).kind(),
            "delegated"
        );
    }
}
