use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::key::ObjectKey;
use super::traits::{BoxReader, ObjectStore, StoredObject};

/// Filesystem-backed object store.
///
/// Objects live at `{base_path}/{key}`; writes go through a temp file and
/// a rename so a reader never observes a half-written object. URLs are
/// `{public_url}/{key}` and are expected to be served by the API's file
/// route.
pub struct FilesystemObjectStore {
    base_path: PathBuf,
    public_url: String,
    max_size: u64,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store.
    pub async fn new(
        base_path: PathBuf,
        public_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }

    fn object_path(&self, key: &ObjectKey) -> PathBuf {
        let mut path = self.base_path.clone();
        for segment in key.segments() {
            path.push(segment);
        }
        path
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put(
        &self,
        key: &ObjectKey,
        data: &[u8],
        _content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let object_path = self.object_path(key);
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &object_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(StoredObject {
            key: key.clone(),
            url: self.url_for(key),
        })
    }

    async fn get_stream(&self, key: &ObjectKey) -> Result<BoxReader, StorageError> {
        let file = fs::File::open(self.object_path(key))
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
                _ => StorageError::Io(e),
            })?;
        Ok(Box::new(file))
    }

    fn url_for(&self, key: &ObjectKey) -> String {
        format!("{}/{}", self.public_url, key)
    }
}
