//! Error types for store persistence

/// Errors from persistence operations.
///
/// In-memory store operations never fail; misses are `None` / `false`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] gdata_auth::Error),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("backend data error: {0}")]
    Parse(String),
}

/// Result alias for persistence operations.
pub type Result<T> = std::result::Result<T, Error>;
