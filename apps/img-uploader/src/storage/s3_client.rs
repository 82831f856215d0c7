//! S3-compatible storage client
//!
//! Wraps the AWS SDK for S3-compatible storage access.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::ProvideErrorMetadata,
    primitives::ByteStream,
    types::ObjectCannedAcl,
    Client,
};
use bytes::Bytes;

use crate::config::StorageConfig;
use crate::error::StorageError;

use super::types::{ObjectMetadata, MIME_TYPE_METADATA_KEY};
use super::ObjectStore;

/// S3-compatible storage client
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Client {
    /// Create a new S3 client from configuration
    pub async fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "img-uploader",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint)
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO and other S3-compatible services
            .build();

        let client = Client::from_conf(s3_config);

        // Test connection by checking if bucket exists
        let bucket = config.bucket.clone();
        match client.head_bucket().bucket(&bucket).send().await {
            Ok(_) => {
                tracing::info!("Connected to S3 bucket: {}", bucket);
            }
            Err(e) => {
                tracing::warn!(
                    "Could not verify bucket {}: {}. Will attempt operations anyway.",
                    bucket,
                    e
                );
            }
        }

        Ok(Self {
            client,
            bucket,
            public_base_url: public_base_url(config),
        })
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public URL of an object
    pub fn media_link(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    /// Get object metadata (HEAD request)
    pub async fn head_object(&self, key: &str) -> Result<ObjectMetadata, StorageError> {
        let response = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let not_found = e
                    .as_service_error()
                    .map(|se| se.is_not_found())
                    .unwrap_or(false);
                if not_found {
                    StorageError::ObjectNotFound(key.to_string())
                } else {
                    StorageError::SdkError(format!("Failed to head object {}: {}", key, e))
                }
            })?;

        // The declared MIME type travels in user metadata; fall back to the
        // Content-Type header for objects written by other tools.
        let content_type = response
            .metadata()
            .and_then(|m| m.get(MIME_TYPE_METADATA_KEY))
            .cloned()
            .or_else(|| response.content_type().map(|s| s.to_string()));

        Ok(ObjectMetadata {
            size: response.content_length().unwrap_or(0),
            content_type,
            media_link: self.media_link(key),
        })
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.head_object(key).await {
            Ok(_) => Ok(true),
            Err(StorageError::ObjectNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, key: &str, data: Bytes, mime_type: &str) -> Result<(), StorageError> {
        // PutObject is single-shot: it only returns once S3 has persisted the body.
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(mime_type)
            .metadata(MIME_TYPE_METADATA_KEY, mime_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::SdkError(format!("Failed to put object {}: {}", key, e)))?;

        Ok(())
    }

    async fn make_public(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .put_object_acl()
            .bucket(&self.bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| {
                let code = e.as_service_error().and_then(|se| se.code());
                if code == Some("AccessDenied") {
                    StorageError::AccessDenied(key.to_string())
                } else {
                    StorageError::SdkError(format!("Failed to make object {} public: {}", key, e))
                }
            })?;

        Ok(())
    }

    async fn get_metadata(&self, key: &str) -> Result<ObjectMetadata, StorageError> {
        self.head_object(key).await
    }
}

/// Base URL for public object links.
///
/// Without an explicit CDN/public URL this is the path-style bucket URL.
fn public_base_url(config: &StorageConfig) -> String {
    let base = match &config.public_base_url {
        Some(url) => url.clone(),
        None => format!("{}/{}", config.endpoint.trim_end_matches('/'), config.bucket),
    };
    base.trim_end_matches('/').to_string()
}
