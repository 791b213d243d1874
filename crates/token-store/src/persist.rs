//! Saving credentials and whole stores through a [`BlobBackend`]
//!
//! Key layout:
//! - `gd_auth_token<key>` holds a single named credential
//! - `scope:<scope>` holds the credential registered for one store scope
//!
//! Values are the blob form from [`gdata_auth::blob`]. OAuth credentials
//! have no blob form: saving one by name fails, and [`save_store`] skips
//! them and reports how many it skipped.

use std::collections::HashSet;

use gdata_auth::{Credential, from_blob, to_blob};
use tracing::{debug, info, warn};

use crate::backend::BlobBackend;
use crate::error::Result;
use crate::store::TokenStore;

/// Key prefix for single named credentials
pub const TOKEN_KEY_PREFIX: &str = "gd_auth_token";

/// Key prefix for store entries
pub const SCOPE_KEY_PREFIX: &str = "scope:";

fn token_key(key: &str) -> String {
    format!("{TOKEN_KEY_PREFIX}{key}")
}

/// Store `credential` under `key`.
pub async fn save_credential(
    backend: &dyn BlobBackend,
    key: &str,
    credential: &Credential,
) -> Result<()> {
    let blob = to_blob(credential)?;
    backend.save(&token_key(key), &blob).await?;
    debug!(key, kind = credential.kind(), "saved credential");
    Ok(())
}

/// Credential stored under `key`, if any.
pub async fn load_credential(backend: &dyn BlobBackend, key: &str) -> Result<Option<Credential>> {
    match backend.load(&token_key(key)).await? {
        Some(blob) => Ok(Some(from_blob(&blob)?)),
        None => Ok(None),
    }
}

/// Returns whether a credential was stored under `key`.
pub async fn delete_credential(backend: &dyn BlobBackend, key: &str) -> Result<bool> {
    let deleted = backend.delete(&token_key(key)).await?;
    debug!(key, deleted, "deleted credential");
    Ok(deleted)
}

/// Outcome of [`save_store`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Scopes written
    pub saved: usize,
    /// Scopes whose credential has no blob form
    pub skipped: usize,
    /// Scope keys removed because the store no longer holds them
    pub removed: usize,
}

/// Write one blob per store scope and drop scope keys the store no longer
/// holds.
pub async fn save_store(backend: &dyn BlobBackend, store: &TokenStore) -> Result<SaveReport> {
    let mut report = SaveReport::default();
    let mut written = HashSet::new();

    for (scope, credential) in store.entries() {
        if matches!(credential, Credential::OAuth(_)) {
            warn!(scope, "skipping OAuth credential, it has no blob form");
            report.skipped += 1;
            continue;
        }
        let key = format!("{SCOPE_KEY_PREFIX}{scope}");
        backend.save(&key, &to_blob(&credential)?).await?;
        written.insert(key);
        report.saved += 1;
    }

    for key in backend.keys().await? {
        if key.starts_with(SCOPE_KEY_PREFIX) && !written.contains(&key) {
            backend.delete(&key).await?;
            report.removed += 1;
        }
    }

    info!(
        saved = report.saved,
        skipped = report.skipped,
        removed = report.removed,
        "saved token store"
    );
    Ok(report)
}

/// Rebuild a store from the scope keys in `backend`.
pub async fn load_store(backend: &dyn BlobBackend) -> Result<TokenStore> {
    let store = TokenStore::new();
    for key in backend.keys().await? {
        let Some(scope) = key.strip_prefix(SCOPE_KEY_PREFIX) else {
            continue;
        };
        let Some(blob) = backend.load(&key).await? else {
            continue;
        };
        store.add(from_blob(&blob)?, &[scope]);
    }
    info!(scopes = store.len(), "loaded token store");
    Ok(store)
}
