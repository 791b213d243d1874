//! Error types for credential, signing, and serialization operations

/// Errors from credential operations.
///
/// Parsing helpers that read server bodies return `Option` instead; these
/// variants cover the conditions that must not be silently swallowed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid blob format: {0}")]
    InvalidBlobFormat(String),

    #[error("credential cannot be serialized: {0}")]
    UnsupportedCredential(String),

    #[error("unsupported signature method: {0}")]
    UnsupportedSignatureMethod(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),
}

/// Result alias for credential operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let err = Error::InvalidBlobFormat("unknown tag `9z`".into());
        assert_eq!(err.to_string(), "invalid blob format: unknown tag `9z`");

        let err = Error::UnsupportedSignatureMethod("RSA-SHA1".into());
        assert!(err.to_string().contains("RSA-SHA1"));
    }
}
