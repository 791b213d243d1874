//! OAuth 1.0 request signing and token lifecycle
//!
//! - [`base_string`] - canonical signature base string
//! - [`signer`] - HMAC-SHA1 signatures
//! - [`header`] - `Authorization: OAuth ...` values
//! - [`context`] - injected nonce and timestamp
//! - [`response`] - token info from endpoint bodies and redirects
//! - [`token`] - the credential and its state machine

pub mod base_string;
pub mod context;
pub mod header;
pub mod response;
pub mod signer;
pub mod token;

pub use base_string::{OAuthParams, build_base_string, normalized_request_url};
pub use context::SigningContext;
pub use header::build_auth_header;
pub use response::{RedirectInfo, TokenInfo, token_info_from_body, token_info_from_url};
pub use signer::{SignatureMethod, sign, sign_with};
pub use token::{AuthorizationUrlOptions, Consumer, OAuthCredential, OAuthState, TokenState};
