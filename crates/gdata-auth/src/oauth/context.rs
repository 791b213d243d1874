//! Per-request nonce and timestamp.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngExt;

/// Number of decimal digits in a generated nonce.
const NONCE_DIGITS: usize = 15;

/// The time- and randomness-dependent inputs of one signature.
///
/// Signing functions take this explicitly so base strings and signatures
/// are reproducible in tests; production callers use [`SigningContext::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext {
    /// Seconds since the unix epoch
    pub timestamp: u64,
    pub nonce: String,
}

impl SigningContext {
    pub fn new(timestamp: u64, nonce: impl Into<String>) -> Self {
        Self {
            timestamp,
            nonce: nonce.into(),
        }
    }

    /// Current wall-clock time plus a fresh random nonce.
    ///
    /// Uses the thread-local RNG, so concurrent callers never share state.
    pub fn generate() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            timestamp,
            nonce: generate_nonce(),
        }
    }
}

/// Random decimal nonce.
pub fn generate_nonce() -> String {
    let mut rng = rand::rng();
    (0..NONCE_DIGITS)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_is_fifteen_digits() {
        let nonce = generate_nonce();
        assert_eq!(nonce.len(), NONCE_DIGITS);
        assert!(nonce.chars().all(|c| c.is_ascii_digit()), "{nonce}");
    }

    #[test]
    fn generated_contexts_differ() {
        let a = SigningContext::generate();
        let b = SigningContext::generate();
        assert_ne!(a.nonce, b.nonce, "two nonces must not collide");
        assert!(a.timestamp > 1_600_000_000);
    }
}
