use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::key::ObjectKey;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Location of an object after a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: ObjectKey,
    /// Publicly retrievable URL for the object.
    pub url: String,
}

/// Key-addressed object storage: store bytes under a key, return a URL.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `key` and return its retrievable location.
    async fn put(
        &self,
        key: &ObjectKey,
        data: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;

    /// Retrieve an object as a streaming async reader.
    async fn get_stream(&self, key: &ObjectKey) -> Result<BoxReader, StorageError>;

    /// The URL an object stored under `key` is served from.
    fn url_for(&self, key: &ObjectKey) -> String;
}
