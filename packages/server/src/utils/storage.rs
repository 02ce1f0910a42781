use std::sync::Arc;

use common::storage::filesystem::FilesystemObjectStore;
use common::storage::{ObjectStore, StorageError};

use crate::config::{AppConfig, StorageBackend};

/// Build the object store selected by `storage.backend`.
pub async fn build_object_store(config: &AppConfig) -> Result<Arc<dyn ObjectStore>, StorageError> {
    let max_size = config
        .limits
        .max_image_bytes
        .max(config.limits.max_document_bytes)
        .max(config.limits.max_proof_bytes);

    match config.storage.backend {
        StorageBackend::Filesystem => {
            let store = FilesystemObjectStore::new(
                config.storage.data_dir.clone(),
                config.files_base_url(),
                max_size,
            )
            .await?;
            tracing::info!(path = %config.storage.data_dir.display(), "Using filesystem object store");
            Ok(Arc::new(store))
        }
        #[cfg(feature = "s3")]
        StorageBackend::S3 => {
            let settings = config.storage.s3.as_ref().ok_or_else(|| {
                StorageError::Backend("storage.backend is s3 but [storage.s3] is missing".into())
            })?;
            let store = common::storage::s3::S3ObjectStore::new(settings, max_size)?;
            tracing::info!(bucket = %settings.bucket, "Using S3 object store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "s3"))]
        StorageBackend::S3 => Err(StorageError::Backend(
            "storage.backend is s3 but the server was built without the `s3` feature".into(),
        )),
    }
}
