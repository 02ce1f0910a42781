use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

use super::error::StorageError;
use super::key::ObjectKey;
use super::traits::{BoxReader, ObjectStore, StoredObject};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...).
    pub endpoint: Option<String>,
    /// Base URL objects are publicly readable from.
    pub public_url: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    #[serde(default)]
    pub path_style: bool,
}

/// S3-backed object store.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    public_url: String,
    max_size: u64,
}

impl S3ObjectStore {
    pub fn new(settings: &S3Settings, max_size: u64) -> Result<Self, StorageError> {
        let region = match &settings.endpoint {
            Some(endpoint) => Region::Custom {
                region: settings.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => settings
                .region
                .parse()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };
        let credentials = Credentials::new(
            settings.access_key.as_deref(),
            settings.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&settings.bucket, region, credentials)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        if settings.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            public_url: settings.public_url.trim_end_matches('/').to_string(),
            max_size,
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        key: &ObjectKey,
        data: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let response = self
            .bucket
            .put_object_with_content_type(key.as_str(), data, content_type)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        if !(200..300).contains(&response.status_code()) {
            return Err(StorageError::Backend(format!(
                "put {key} returned status {}",
                response.status_code()
            )));
        }

        Ok(StoredObject {
            key: key.clone(),
            url: self.url_for(key),
        })
    }

    async fn get_stream(&self, key: &ObjectKey) -> Result<BoxReader, StorageError> {
        let response = self
            .bucket
            .get_object(key.as_str())
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        match response.status_code() {
            200 => Ok(Box::new(std::io::Cursor::new(response.bytes().to_vec()))),
            404 => Err(StorageError::NotFound(key.to_string())),
            code => Err(StorageError::Backend(format!(
                "get {key} returned status {code}"
            ))),
        }
    }

    fn url_for(&self, key: &ObjectKey) -> String {
        format!("{}/{}", self.public_url, key)
    }
}
