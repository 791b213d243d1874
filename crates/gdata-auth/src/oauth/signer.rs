//! OAuth 1.0 request signatures.
//!
//! `Signature = Base64(HMAC-SHA1(SigningKey, BaseString))` where
//!
//! ```text
//! SigningKey = enc(consumer_secret) + "&" + enc(token_secret)
//! ```
//!
//! and `enc` is the unreserved-set percent-encoding. Without a token secret
//! the key is `enc(consumer_secret) + "&"`. RSA-SHA1 is recognised so it can
//! be rejected explicitly; it is never computed.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::encoding::percent_encode;
use crate::error::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

/// Signature method advertised in `oauth_signature_method`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureMethod {
    #[default]
    HmacSha1,
    RsaSha1,
}

impl SignatureMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureMethod::HmacSha1 => "HMAC-SHA1",
            SignatureMethod::RsaSha1 => "RSA-SHA1",
        }
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "HMAC-SHA1" => Ok(SignatureMethod::HmacSha1),
            "RSA-SHA1" => Ok(SignatureMethod::RsaSha1),
            other => Err(Error::UnsupportedSignatureMethod(other.to_owned())),
        }
    }
}

/// Build the composite HMAC key from the consumer and token secrets.
#[must_use]
pub fn signing_key(consumer_secret: &str, token_secret: Option<&str>) -> String {
    match token_secret {
        Some(token_secret) => format!(
            "{}&{}",
            percent_encode(consumer_secret),
            percent_encode(token_secret)
        ),
        None => format!("{}&", percent_encode(consumer_secret)),
    }
}

/// Compute the HMAC-SHA1 signature of a base string, base64 encoded.
///
/// ```
/// use gdata_auth::oauth::signer::sign;
///
/// let sig = sign("GET&http%3A%2F%2Fa.com%2F&", "secret", None);
/// assert_eq!(sig, sign("GET&http%3A%2F%2Fa.com%2F&", "secret", None));
/// ```
#[must_use]
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: Option<&str>) -> String {
    let key = signing_key(consumer_secret, token_secret);
    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can accept any key length");
    mac.update(base_string.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Sign with an explicit method, failing for methods this crate cannot compute.
pub fn sign_with(
    method: SignatureMethod,
    base_string: &str,
    consumer_secret: &str,
    token_secret: Option<&str>,
) -> Result<String> {
    match method {
        SignatureMethod::HmacSha1 => Ok(sign(base_string, consumer_secret, token_secret)),
        SignatureMethod::RsaSha1 => Err(Error::UnsupportedSignatureMethod(
            method.as_str().to_owned(),
        )),
    }
}
