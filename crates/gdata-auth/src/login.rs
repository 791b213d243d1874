//! Login tokens issued by username/password authentication
//!
//! The login endpoint answers with `Key=Value` lines. A successful response
//! carries `Auth=<token>`; a throttled one carries `Error=CaptchaRequired`
//! together with `CaptchaToken=` and a relative `CaptchaUrl=`.

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::debug;
use url::form_urlencoded;

use crate::constants::{DEFAULT_ACCOUNT_TYPE, LOGIN_AUTH_LABEL};
use crate::error::Result;
use crate::request::HttpRequest;

/// Bearer-style login credential (`Authorization: GoogleLogin auth=...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredential {
    pub value: String,
}

impl LoginCredential {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Build a credential from a login response body, if it holds a token.
    pub fn from_response_body(body: &str) -> Option<Self> {
        login_token_from_body(body).map(Self::new)
    }

    pub fn header_value(&self) -> String {
        format!("{LOGIN_AUTH_LABEL}{}", self.value)
    }

    pub fn apply_to(&self, request: &mut HttpRequest) -> Result<()> {
        request.set_authorization(&self.header_value())
    }
}

/// A user's answer to a CAPTCHA challenge.
#[derive(Debug, Clone, Copy)]
pub struct CaptchaAnswer<'a> {
    pub token: &'a str,
    pub response: &'a str,
}

/// Form fields of a login request.
#[derive(Debug, Clone)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub service: &'a str,
    pub source: &'a str,
    /// `HOSTED_OR_GOOGLE`, `GOOGLE` or `HOSTED`
    pub account_type: &'a str,
    pub captcha: Option<CaptchaAnswer<'a>>,
}

impl<'a> LoginRequest<'a> {
    pub fn new(email: &'a str, password: &'a str, service: &'a str, source: &'a str) -> Self {
        Self {
            email,
            password,
            service,
            source,
            account_type: DEFAULT_ACCOUNT_TYPE,
            captcha: None,
        }
    }

    pub fn with_captcha_answer(mut self, answer: CaptchaAnswer<'a>) -> Self {
        self.captcha = Some(answer);
        self
    }

    /// `application/x-www-form-urlencoded` body for the login endpoint.
    pub fn to_form_body(&self) -> String {
        let mut form = form_urlencoded::Serializer::new(String::new());
        form.append_pair("Email", self.email)
            .append_pair("Passwd", self.password)
            .append_pair("accountType", self.account_type)
            .append_pair("service", self.service)
            .append_pair("source", self.source);
        if let Some(answer) = &self.captcha {
            form.append_pair("logintoken", answer.token)
                .append_pair("logincaptcha", answer.response);
        }
        form.finish()
    }

    /// POST request carrying the form body.
    pub fn to_http_request(&self, endpoint: &str) -> Result<HttpRequest> {
        let mut request = HttpRequest::parse("POST", endpoint)?;
        let body = self.to_form_body();
        request.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        request.set_content_length(body.len());
        request.body = Some(body);
        debug!(service = self.service, source = self.source, "built login request");
        Ok(request)
    }
}

/// A CAPTCHA the server wants answered before it issues a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaChallenge {
    pub token: String,
    /// Absolute URL of the challenge image
    pub url: String,
}

/// Value of the first `Auth=` line of a login response.
pub fn login_token_from_body(body: &str) -> Option<String> {
    body.lines()
        .find_map(|line| line.strip_prefix("Auth="))
        .map(str::to_owned)
}

/// CAPTCHA challenge carried by a login response.
///
/// Returns `None` unless the body has an `Error=CaptchaRequired` line plus
/// both `CaptchaToken=` and `CaptchaUrl=` lines. The image URL is
/// `base_url` followed by the server's relative `CaptchaUrl` value.
pub fn captcha_challenge_from_body(body: &str, base_url: &str) -> Option<CaptchaChallenge> {
    let mut required = false;
    let mut token = None;
    let mut url = None;
    for line in body.lines() {
        if line.starts_with("Error=CaptchaRequired") {
            required = true;
        } else if let Some(value) = line.strip_prefix("CaptchaToken=") {
            token = Some(value.to_owned());
        } else if let Some(value) = line.strip_prefix("CaptchaUrl=") {
            url = Some(format!("{base_url}{value}"));
        }
    }
    if !required {
        return None;
    }
    Some(CaptchaChallenge {
        token: token?,
        url: url?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CAPTCHA_BASE_URL;

    const SUCCESS_BODY: &str = "SID=DQAAAGgA\nLSID=DQAAAGsA\nAuth=DQAAAGgAdk3fA5N\n";
    const CAPTCHA_BODY: &str = "Url=http://www.google.com/login/captcha\n\
        Error=CaptchaRequired\n\
        CaptchaToken=DQAAAGgA\n\
        CaptchaUrl=Captcha?ctoken=HiteT4b0Bk5Xg18_AcVoP6-yFkHPibe7O9EqxeiI7lUSN\n";

    #[test]
    fn extracts_auth_line() {
        assert_eq!(
            login_token_from_body(SUCCESS_BODY).as_deref(),
            Some("DQAAAGgAdk3fA5N")
        );
        let cred = LoginCredential::from_response_body(SUCCESS_BODY).unwrap();
        assert_eq!(cred.value, "DQAAAGgAdk3fA5N");
    }

    #[test]
    fn missing_auth_line_is_none() {
        assert!(login_token_from_body("Error=BadAuthentication\n").is_none());
        assert!(LoginCredential::from_response_body("").is_none());
    }

    #[test]
    fn apply_sets_google_login_header() {
        let mut request = HttpRequest::parse("GET", "http://a.com/feeds").unwrap();
        LoginCredential::new("abc").apply_to(&mut request).unwrap();
        assert_eq!(request.authorization(), Some("GoogleLogin auth=abc"));
    }

    #[test]
    fn parses_captcha_challenge() {
        let challenge = captcha_challenge_from_body(CAPTCHA_BODY, CAPTCHA_BASE_URL).unwrap();
        assert_eq!(challenge.token, "DQAAAGgA");
        assert_eq!(
            challenge.url,
            "http://www.google.com/accounts/Captcha?ctoken=HiteT4b0Bk5Xg18_AcVoP6-yFkHPibe7O9EqxeiI7lUSN"
        );
    }

    #[test]
    fn no_captcha_without_error_line() {
        let body = "CaptchaToken=abc\nCaptchaUrl=Captcha?x\n";
        assert!(captcha_challenge_from_body(body, CAPTCHA_BASE_URL).is_none());
        assert!(captcha_challenge_from_body(SUCCESS_BODY, CAPTCHA_BASE_URL).is_none());
    }

    #[test]
    fn form_body_contains_fields() {
        let body = LoginRequest::new("user@example.com", "p@ss word", "cl", "acme-app-1")
            .to_form_body();
        assert_eq!(
            body,
            "Email=user%40example.com&Passwd=p%40ss+word&accountType=HOSTED_OR_GOOGLE&service=cl&source=acme-app-1"
        );
    }

    #[test]
    fn form_body_includes_captcha_answer() {
        let body = LoginRequest::new("u@x.com", "pw", "cl", "src")
            .with_captcha_answer(CaptchaAnswer {
                token: "DQAAAGgA",
                response: "brinmar",
            })
            .to_form_body();
        assert!(body.ends_with("&logintoken=DQAAAGgA&logincaptcha=brinmar"), "{body}");
    }

    #[test]
    fn login_http_request_is_form_post() {
        let request = LoginRequest::new("u@x.com", "pw", "cl", "src")
            .to_http_request("https://www.google.com/accounts/ClientLogin")
            .unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
        let body = request.body.as_deref().unwrap();
        assert_eq!(
            request
                .headers
                .get(reqwest::header::CONTENT_LENGTH)
                .unwrap()
                .to_str()
                .unwrap(),
            body.len().to_string()
        );
    }
}
