//! Scope-indexed credential store with pluggable persistence
//!
//! [`TokenStore`] answers "which credential authorizes this URL" by scope
//! prefix. [`persist`] moves credentials and whole stores in and out of a
//! [`BlobBackend`] using the blob form from `gdata-auth`.

pub mod backend;
pub mod error;
pub mod persist;
pub mod store;

pub use backend::{BlobBackend, FileBackend, MemoryBackend};
pub use error::{Error, Result};
pub use persist::{
    SaveReport, delete_credential, load_credential, load_store, save_credential, save_store,
};
pub use store::{Lookup, SCOPE_ALL, TokenStore};
