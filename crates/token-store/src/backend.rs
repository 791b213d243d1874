//! Key/value backends holding credential blobs
//!
//! [`BlobBackend`] is the persistence seam: the store only needs `save`,
//! `load`, `delete` and `keys` over string values. Two implementations:
//! - [`MemoryBackend`] keeps everything in process (tests, short-lived tools)
//! - [`FileBackend`] mirrors a JSON object file, rewritten atomically on
//!   every change

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Boxed future returned by [`BlobBackend`] methods.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// String key/value persistence.
///
/// Uses `Pin<Box<dyn Future>>` return types so backends can be held as
/// `Arc<dyn BlobBackend>`.
pub trait BlobBackend: Send + Sync {
    /// Insert or replace `key`.
    fn save<'a>(&'a self, key: &'a str, value: &'a str) -> BackendFuture<'a, ()>;

    fn load<'a>(&'a self, key: &'a str) -> BackendFuture<'a, Option<String>>;

    /// Returns whether the key existed.
    fn delete<'a>(&'a self, key: &'a str) -> BackendFuture<'a, bool>;

    fn keys(&self) -> BackendFuture<'_, Vec<String>>;
}

/// In-process backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobBackend for MemoryBackend {
    fn save<'a>(&'a self, key: &'a str, value: &'a str) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            self.values
                .lock()
                .await
                .insert(key.to_owned(), value.to_owned());
            Ok(())
        })
    }

    fn load<'a>(&'a self, key: &'a str) -> BackendFuture<'a, Option<String>> {
        Box::pin(async move { Ok(self.values.lock().await.get(key).cloned()) })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move { Ok(self.values.lock().await.remove(key).is_some()) })
    }

    fn keys(&self) -> BackendFuture<'_, Vec<String>> {
        Box::pin(async move { Ok(self.values.lock().await.keys().cloned().collect()) })
    }
}

/// Backend persisted as a JSON object file.
///
/// The file is the source of truth across runs; in process, a tokio Mutex
/// guards the in-memory copy and serializes writes so two saves never race
/// on the temp file.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileBackend {
    /// Open the file at `path`.
    ///
    /// A missing file is created as `{}`.
    pub async fn open(path: PathBuf) -> Result<Self> {
        let values = if tokio::fs::try_exists(&path)
            .await
            .map_err(|e| Error::Io(format!("checking token file: {e}")))?
        {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading token file: {e}")))?;
            let values: BTreeMap<String, String> = serde_json::from_str(&contents)
                .map_err(|e| Error::Parse(format!("parsing token file: {e}")))?;
            info!(path = %path.display(), keys = values.len(), "loaded token file");
            values
        } else {
            info!(path = %path.display(), "token file not found, starting empty");
            let values = BTreeMap::new();
            write_atomic(&path, &values).await?;
            values
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlobBackend for FileBackend {
    fn save<'a>(&'a self, key: &'a str, value: &'a str) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            let mut values = self.values.lock().await;
            values.insert(key.to_owned(), value.to_owned());
            write_atomic(&self.path, &values).await
        })
    }

    fn load<'a>(&'a self, key: &'a str) -> BackendFuture<'a, Option<String>> {
        Box::pin(async move { Ok(self.values.lock().await.get(key).cloned()) })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            let mut values = self.values.lock().await;
            if values.remove(key).is_none() {
                return Ok(false);
            }
            write_atomic(&self.path, &values).await?;
            Ok(true)
        })
    }

    fn keys(&self) -> BackendFuture<'_, Vec<String>> {
        Box::pin(async move { Ok(self.values.lock().await.keys().cloned().collect()) })
    }
}

/// Write `values` to a temp file beside `path`, restrict it to 0600 on unix,
/// then rename it over `path`.
async fn write_atomic(path: &Path, values: &BTreeMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(values)
        .map_err(|e| Error::Parse(format!("serializing token file: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("token file path has no parent directory".into()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("tokens");
    let tmp_path = dir.join(format!(".{file_name}.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp token file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(|e| Error::Io(format!("setting token file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp token file: {e}")))?;

    debug!(path = %path.display(), keys = values.len(), "persisted token file");
    Ok(())
}
