//! Signature base string construction for OAuth 1.0.
//!
//! ```text
//! UPPER(method) & enc(scheme://host[:port]/path) & enc(sorted k=v pairs joined by &)
//! ```
//!
//! Keys and values are encoded once when the pairs are built and the joined
//! parameter block is encoded again as a whole.

use std::collections::BTreeMap;

use url::Url;

use crate::encoding::percent_encode;
use crate::oauth::signer::SignatureMethod;
use crate::request::HttpRequest;

/// The `oauth_*` protocol parameters that take part in a signature.
#[derive(Debug, Clone)]
pub struct OAuthParams<'a> {
    pub consumer_key: &'a str,
    pub nonce: &'a str,
    pub signature_method: SignatureMethod,
    pub timestamp: u64,
    pub version: Option<&'a str>,
    pub callback: Option<&'a str>,
    pub token: Option<&'a str>,
    pub verifier: Option<&'a str>,
}

impl OAuthParams<'_> {
    /// Protocol parameters keyed by their wire names. Absent optionals are omitted.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("oauth_consumer_key".to_owned(), self.consumer_key.to_owned());
        params.insert("oauth_nonce".to_owned(), self.nonce.to_owned());
        params.insert(
            "oauth_signature_method".to_owned(),
            self.signature_method.as_str().to_owned(),
        );
        params.insert("oauth_timestamp".to_owned(), self.timestamp.to_string());
        let optional = [
            ("oauth_callback", self.callback),
            ("oauth_token", self.token),
            ("oauth_version", self.version),
            ("oauth_verifier", self.verifier),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.insert(key.to_owned(), value.to_owned());
            }
        }
        params
    }
}

/// Build the signature base string for a request.
///
/// Pure: the request is only read.
#[must_use]
pub fn build_base_string(request: &HttpRequest, params: &OAuthParams<'_>) -> String {
    let mut all_params = request.query_params();
    all_params.extend(params.to_map());

    let pairs = all_params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        request.method.to_ascii_uppercase(),
        percent_encode(&normalized_request_url(&request.url)),
        percent_encode(&pairs)
    )
}

/// `scheme://host[:port]/path` with lower-cased scheme and host, default
/// ports dropped, and the query removed.
#[must_use]
pub fn normalized_request_url(url: &Url) -> String {
    let scheme = url.scheme().to_ascii_lowercase();
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let port = match (scheme.as_str(), url.port()) {
        ("http", Some(80)) | ("https", Some(443)) => None,
        (_, port) => port,
    };
    let path = match url.path() {
        "" => "/".to_owned(),
        p if p.starts_with('/') => p.to_owned(),
        p => format!("/{p}"),
    };

    match port {
        Some(port) => format!("{scheme}://{host}:{port}{path}"),
        None => format!("{scheme}://{host}{path}"),
    }
}
