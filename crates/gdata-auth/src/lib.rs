//! Authorization credentials for Google Data style web APIs
//!
//! Three schemes, one per [`Credential`] variant:
//! - login tokens (`GoogleLogin auth=...`) from email/password login
//! - delegated tokens (`AuthSub token=...`) from a browser redirect
//! - OAuth 1.0 HMAC-SHA1 signed requests with a request/authorize/access
//!   token lifecycle
//!
//! Everything except [`exchange`] is synchronous and does no I/O. Building
//! and applying credentials works on [`HttpRequest`] values; the exchange
//! helpers send those requests with `reqwest`.
//!
//! OAuth flow:
//! 1. `OAuthCredential::new(consumer)` creates an empty request token
//! 2. `exchange::fetch_request_token()` fills token and secret
//! 3. User approves at `OAuthCredential::authorization_url()`
//! 4. `OAuthCredential::authorize(redirect_url)` records the verifier
//! 5. `exchange::fetch_access_token()` upgrades to an access token
//! 6. `Credential::apply_to()` signs each data request

pub mod authsub;
pub mod blob;
pub mod constants;
pub mod credential;
pub mod encoding;
pub mod error;
pub mod exchange;
pub mod login;
pub mod oauth;
pub mod request;

pub use authsub::{AuthSubOptions, DelegatedCredential, authorization_url, session_token_from_body};
pub use blob::{dump_all, from_blob, load_all, to_blob};
pub use credential::Credential;
pub use error::{Error, Result};
pub use exchange::LoginOutcome;
pub use login::{
    CaptchaAnswer, CaptchaChallenge, LoginCredential, LoginRequest, captcha_challenge_from_body,
    login_token_from_body,
};
pub use oauth::{Consumer, OAuthCredential, OAuthState, SignatureMethod, SigningContext, TokenState};
pub use request::HttpRequest;
