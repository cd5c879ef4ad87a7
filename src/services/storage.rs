use async_trait::async_trait;
use std::io;
use std::path::PathBuf;

/// Blob persistence used by the media store. Keys are `/`-separated paths
/// relative to the store root, e.g. `events/1700000000000_photo.png`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn create_dir(&self, dir: &str) -> io::Result<()>;
    async fn write(&self, key: &str, data: &[u8]) -> io::Result<()>;
    async fn remove(&self, key: &str) -> io::Result<()>;
    async fn exists(&self, key: &str) -> io::Result<bool>;
    /// File names directly under `dir`. A missing directory lists as empty.
    async fn list(&self, dir: &str) -> io::Result<Vec<String>>;
}

/// Blobs as plain files under a root directory.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        key.split('/').fold(self.root.clone(), |p, part| p.join(part))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn create_dir(&self, dir: &str) -> io::Result<()> {
        tokio::fs::create_dir_all(self.path_for(dir)).await
    }

    async fn write(&self, key: &str, data: &[u8]) -> io::Result<()> {
        tokio::fs::write(self.path_for(key), data).await
    }

    async fn remove(&self, key: &str) -> io::Result<()> {
        tokio::fs::remove_file(self.path_for(key)).await
    }

    async fn exists(&self, key: &str) -> io::Result<bool> {
        tokio::fs::try_exists(self.path_for(key)).await
    }

    async fn list(&self, dir: &str) -> io::Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(self.path_for(dir)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
