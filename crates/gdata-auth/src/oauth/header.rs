//! `Authorization: OAuth ...` header construction.

use crate::constants::OAUTH_AUTH_LABEL;
use crate::encoding::percent_encode;
use crate::oauth::base_string::OAuthParams;

/// Build the header value carrying the protocol parameters and signature.
///
/// Parameters appear in key order as `key="enc(value)"`, separated by `, `.
#[must_use]
pub fn build_auth_header(params: &OAuthParams<'_>, signature: &str) -> String {
    let mut fields = params.to_map();
    fields.insert("oauth_signature".to_owned(), signature.to_owned());

    let pairs = fields
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{OAUTH_AUTH_LABEL}{pairs}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::signer::SignatureMethod;

    #[test]
    fn header_lists_sorted_quoted_params() {
        let params = OAuthParams {
            consumer_key: "example.com",
            nonce: "123456789012345",
            signature_method: SignatureMethod::HmacSha1,
            timestamp: 1_700_000_000,
            version: Some("1.0"),
            callback: Some("http://a.com/cb"),
            token: None,
            verifier: None,
        };
        let header = build_auth_header(&params, "abc+/=");
        assert_eq!(
            header,
            "OAuth oauth_callback=\"http%3A%2F%2Fa.com%2Fcb\", \
             oauth_consumer_key=\"example.com\", \
             oauth_nonce=\"123456789012345\", \
             oauth_signature=\"abc%2B%2F%3D\", \
             oauth_signature_method=\"HMAC-SHA1\", \
             oauth_timestamp=\"1700000000\", \
             oauth_version=\"1.0\""
        );
    }
}
