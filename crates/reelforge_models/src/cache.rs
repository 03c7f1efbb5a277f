//! Content-addressed local cache for generated media.

use crate::HttpTransport;
use async_trait::async_trait;
use reelforge_error::{ReelforgeResult, StorageError, StorageErrorKind};
use reelforge_interface::MediaCache;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Downloads remote media into `{root}/{category}/{hash[0:2]}/{hash[2:4]}/{hash}.{ext}`.
///
/// Identical content lands on the same path, so repeated caching of the same
/// image is free after the download. Writes go through a temp file and a
/// rename so readers never observe a partial file.
#[derive(Debug, Clone)]
pub struct FileMediaCache {
    root: PathBuf,
    transport: HttpTransport,
}

impl FileMediaCache {
    /// Create a cache rooted at `root`, creating the directory if needed.
    #[instrument(skip(root, transport))]
    pub fn new(root: impl Into<PathBuf>, transport: HttpTransport) -> ReelforgeResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;
        info!(path = %root.display(), "Opened media cache");
        Ok(Self { root, transport })
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn compute_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    fn path_for(&self, category: &str, hash: &str, extension: Option<&str>) -> PathBuf {
        let file = match extension {
            Some(ext) => format!("{}.{}", hash, ext),
            None => hash.to_string(),
        };
        self.root
            .join(category)
            .join(&hash[0..2])
            .join(&hash[2..4])
            .join(file)
    }

    async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let temp = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
        tokio::fs::write(&temp, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp.display(),
                e
            )))
        })?;
        tokio::fs::rename(&temp, path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })
    }

    /// Store bytes already in memory, returning the cached path.
    pub async fn store(&self, data: &[u8], category: &str, extension: Option<&str>) -> ReelforgeResult<PathBuf> {
        let hash = Self::compute_hash(data);
        let path = self.path_for(category, &hash, extension);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(hash = %hash, path = %path.display(), "Media already cached");
            return Ok(path);
        }

        Self::write_atomic(&path, data).await?;
        debug!(hash = %hash, bytes = data.len(), path = %path.display(), "Cached media");
        Ok(path)
    }
}

/// File extension from the last URL path segment, ignoring query strings.
fn url_extension(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    let valid = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(ext)
}

#[async_trait]
impl MediaCache for FileMediaCache {
    #[instrument(skip(self))]
    async fn cache(&self, url: &str, category: &str) -> ReelforgeResult<String> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StorageError::new(StorageErrorKind::UnsupportedUrl(url.to_string())).into());
        }

        let data = self.transport.get_bytes(url).await.map_err(|e| {
            StorageError::new(StorageErrorKind::Download(e.kind.to_string()))
        })?;
        let path = self.store(&data, category, url_extension(url)).await?;
        Ok(path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RetryPolicy;
    use std::time::Duration;

    fn cache(root: &Path) -> FileMediaCache {
        let transport = HttpTransport::new(Duration::from_secs(5), RetryPolicy::none()).unwrap();
        FileMediaCache::new(root, transport).unwrap()
    }

    #[test]
    fn extracts_extension_from_url() {
        assert_eq!(url_extension("https://cdn.test/a/b/img.png?sig=1"), Some("png"));
        assert_eq!(url_extension("https://cdn.test/a/b/img"), None);
        assert_eq!(url_extension("https://cdn.test/a/b/img.tar.gz#frag"), Some("gz"));
    }

    #[tokio::test]
    async fn stores_by_content_hash() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());

        let first = cache.store(b"frame bytes", "images", Some("png")).await.unwrap();
        let second = cache.store(b"frame bytes", "images", Some("png")).await.unwrap();
        assert_eq!(first, second);

        let hash = FileMediaCache::compute_hash(b"frame bytes");
        let expected = dir
            .path()
            .join("images")
            .join(&hash[0..2])
            .join(&hash[2..4])
            .join(format!("{}.png", hash));
        assert_eq!(first, expected);
        assert_eq!(std::fs::read(&first).unwrap(), b"frame bytes");
    }

    #[tokio::test]
    async fn rejects_non_http_urls() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path());
        assert!(cache.cache("data:image/png;base64,AAAA", "images").await.is_err());
    }
}
