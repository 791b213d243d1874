//! Percent-encoding shared by the signer and the blob codec
//!
//! Everything except the RFC 3986 unreserved characters is encoded, so `/`,
//! `:`, `|`, `,` and `&` never survive unescaped.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters left as-is: `A-Z a-z 0-9 - . _ ~`.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a string using the unreserved character set.
///
/// ```
/// use gdata_auth::encoding::percent_encode;
///
/// assert_eq!(percent_encode("http://a.com/x y"), "http%3A%2F%2Fa.com%2Fx%20y");
/// assert_eq!(percent_encode("a-b_c.d~e"), "a-b_c.d~e");
/// ```
#[must_use]
pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Decode a percent-encoded string. Invalid UTF-8 is replaced lossily.
#[must_use]
pub fn percent_decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Decode a percent-encoded string that may also carry `+` for a space.
///
/// [`percent_encode`] writes `+` as `%2B`, so a literal `+` in the input
/// can only come from form-style encoding.
#[must_use]
pub fn percent_decode_plus(value: &str) -> String {
    if value.contains('+') {
        percent_decode(&value.replace('+', " "))
    } else {
        percent_decode(value)
    }
}
