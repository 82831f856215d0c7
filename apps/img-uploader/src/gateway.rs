//! Dedup store gateway
//!
//! Implements the write-once protocol on top of an [`ObjectStore`]:
//! check for the content identifier, write only if absent, then publish.
//! A submission is only successful once the object is publicly readable.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::addressor::ContentIdentifier;
use crate::error::StorageError;
use crate::storage::ObjectStore;

/// Failures of the dedup protocol, one per step
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Storage unavailable while looking up {id}: {source}")]
    StorageUnavailable {
        id: ContentIdentifier,
        #[source]
        source: StorageError,
    },

    #[error("Failed to write {id}: {source}")]
    StorageWriteFailed {
        id: ContentIdentifier,
        #[source]
        source: StorageError,
    },

    #[error("Failed to make {id} public: {source}")]
    StorageVisibilityFailed {
        id: ContentIdentifier,
        #[source]
        source: StorageError,
    },

    #[error("Image not found: {0}")]
    NotFound(ContentIdentifier),
}

impl GatewayError {
    /// Short name of the failing step, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StorageUnavailable { .. } => "storage_unavailable",
            Self::StorageWriteFailed { .. } => "storage_write_failed",
            Self::StorageVisibilityFailed { .. } => "storage_visibility_failed",
            Self::NotFound(_) => "not_found",
        }
    }

    pub fn content_id(&self) -> &ContentIdentifier {
        match self {
            Self::StorageUnavailable { id, .. }
            | Self::StorageWriteFailed { id, .. }
            | Self::StorageVisibilityFailed { id, .. }
            | Self::NotFound(id) => id,
        }
    }
}

/// Outcome of a successful submission
///
/// The identifier doubles as the locator: the public page lives at
/// `/{id}` and is derived from it by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: ContentIdentifier,
    /// False when the object was already stored and nothing was written
    pub created: bool,
}

/// Where a stored image can be fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Locator {
    pub id: ContentIdentifier,
    pub media_link: String,
    pub content_type: Option<String>,
    /// Stored size in bytes
    pub size: i64,
}

/// Gateway between request handlers and the backing object store
#[derive(Clone)]
pub struct DedupGateway {
    store: Arc<dyn ObjectStore>,
}

impl DedupGateway {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Store `payload` under `id` unless it is already present.
    ///
    /// An existing object is left untouched, including its MIME type: the
    /// first writer's metadata wins.
    pub async fn submit(
        &self,
        id: &ContentIdentifier,
        payload: Bytes,
        mime_type: &str,
    ) -> Result<Submission, GatewayError> {
        let exists = self
            .store
            .exists(id.as_str())
            .await
            .map_err(|source| GatewayError::StorageUnavailable {
                id: id.clone(),
                source,
            })?;

        if exists {
            tracing::debug!(content_id = %id, "Image already stored, skipping write");
            return Ok(Submission {
                id: id.clone(),
                created: false,
            });
        }

        let size = payload.len();
        self.store
            .write(id.as_str(), payload, mime_type)
            .await
            .map_err(|source| GatewayError::StorageWriteFailed {
                id: id.clone(),
                source,
            })?;

        self.store
            .make_public(id.as_str())
            .await
            .map_err(|source| GatewayError::StorageVisibilityFailed {
                id: id.clone(),
                source,
            })?;

        tracing::info!(
            content_id = %id,
            mime_type = %mime_type,
            size = size,
            "Stored new image"
        );

        Ok(Submission {
            id: id.clone(),
            created: true,
        })
    }

    /// Look up where the image stored under `id` can be fetched from
    pub async fn resolve(&self, id: &ContentIdentifier) -> Result<Locator, GatewayError> {
        let metadata = self
            .store
            .get_metadata(id.as_str())
            .await
            .map_err(|source| match source {
                StorageError::ObjectNotFound(_) => GatewayError::NotFound(id.clone()),
                source => GatewayError::StorageUnavailable {
                    id: id.clone(),
                    source,
                },
            })?;

        tracing::debug!(content_id = %id, size = metadata.size, "Resolved image");

        Ok(Locator {
            id: id.clone(),
            media_link: metadata.media_link,
            content_type: metadata.content_type,
            size: metadata.size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addressor::identify;
    use crate::storage::{InMemoryStore, ObjectMetadata};
    use async_trait::async_trait;

    /// Which step a [`FaultyStore`] should fail
    #[derive(Clone, Copy, PartialEq)]
    enum Fault {
        Exists,
        Write,
        MakePublic,
        Metadata,
    }

    /// Wraps the memory store and fails one step
    struct FaultyStore {
        inner: InMemoryStore,
        fault: Fault,
    }

    impl FaultyStore {
        fn new(fault: Fault) -> Self {
            Self {
                inner: InMemoryStore::new(),
                fault,
            }
        }

        fn fail(&self, step: Fault) -> Result<(), StorageError> {
            if self.fault == step {
                Err(StorageError::SdkError("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ObjectStore for FaultyStore {
        async fn exists(&self, key: &str) -> Result<bool, StorageError> {
            self.fail(Fault::Exists)?;
            self.inner.exists(key).await
        }

        async fn write(&self, key: &str, data: Bytes, mime_type: &str) -> Result<(), StorageError> {
            self.fail(Fault::Write)?;
            self.inner.write(key, data, mime_type).await
        }

        async fn make_public(&self, key: &str) -> Result<(), StorageError> {
            self.fail(Fault::MakePublic)?;
            self.inner.make_public(key).await
        }

        async fn get_metadata(&self, key: &str) -> Result<ObjectMetadata, StorageError> {
            self.fail(Fault::Metadata)?;
            self.inner.get_metadata(key).await
        }
    }

    fn gateway() -> (DedupGateway, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (DedupGateway::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_hello_scenario() {
        let (gateway, store) = gateway();
        let payload = Bytes::from_static(b"hello");
        let id = identify(&payload);
        assert_eq!(id.as_str(), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");

        let first = gateway.submit(&id, payload.clone(), "image/png").await.unwrap();
        assert!(first.created);
        assert_eq!(store.write_count(), 1);
        assert!(store.is_public(id.as_str()).await);

        // Same bytes declared with another type: no write, first type kept
        let second = gateway.submit(&id, payload, "image/jpeg").await.unwrap();
        assert!(!second.created);
        assert_eq!(second.id, id);
        assert_eq!(store.write_count(), 1);

        let locator = gateway.resolve(&id).await.unwrap();
        assert_eq!(locator.id, id);
        assert_eq!(locator.content_type.as_deref(), Some("image/png"));
        assert_eq!(locator.size, 5);
        assert_eq!(
            locator.media_link,
            format!("memory://objects/{}", id.as_str())
        );
    }

    #[tokio::test]
    async fn test_submit_is_idempotent() {
        let (gateway, store) = gateway();
        let payload = Bytes::from(vec![7u8; 1024]);
        let id = identify(&payload);

        for _ in 0..3 {
            gateway.submit(&id, payload.clone(), "image/webp").await.unwrap();
        }

        assert_eq!(store.write_count(), 1);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.data(id.as_str()).await, Some(payload));
    }

    #[tokio::test]
    async fn test_distinct_payloads_stored_separately() {
        let (gateway, store) = gateway();
        let a = Bytes::from_static(b"first image");
        let b = Bytes::from_static(b"second image");

        gateway.submit(&identify(&a), a, "image/png").await.unwrap();
        gateway.submit(&identify(&b), b, "image/gif").await.unwrap();

        assert_eq!(store.write_count(), 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_first_submissions() {
        let (gateway, store) = gateway();
        let payload = Bytes::from_static(b"racing upload");
        let id = identify(&payload);

        let (a, b) = tokio::join!(
            gateway.submit(&id, payload.clone(), "image/png"),
            gateway.submit(&id, payload.clone(), "image/png"),
        );
        a.unwrap();
        b.unwrap();

        // Both may have seen the key as absent; the stored bytes are identical either way
        assert!((1..=2).contains(&store.write_count()));
        assert_eq!(store.data(id.as_str()).await, Some(payload));
        assert!(gateway.resolve(&id).await.is_ok());
    }

    #[tokio::test]
    async fn test_resolve_unknown_is_not_found() {
        let (gateway, _store) = gateway();
        let id = identify(b"never uploaded");

        let err = gateway.resolve(&id).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(ref missing) if *missing == id));
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_visibility_failure_fails_submission() {
        let store = Arc::new(FaultyStore::new(Fault::MakePublic));
        let gateway = DedupGateway::new(store.clone());
        let payload = Bytes::from_static(b"private forever");
        let id = identify(&payload);

        let err = gateway.submit(&id, payload, "image/png").await.unwrap_err();
        assert!(matches!(err, GatewayError::StorageVisibilityFailed { .. }));
        assert_eq!(err.content_id(), &id);

        // The write itself went through but the object never became public
        assert_eq!(store.inner.write_count(), 1);
        assert!(!store.inner.is_public(id.as_str()).await);
    }

    #[tokio::test]
    async fn test_exists_failure_is_unavailable() {
        let store = Arc::new(FaultyStore::new(Fault::Exists));
        let gateway = DedupGateway::new(store.clone());
        let payload = Bytes::from_static(b"unreachable");
        let id = identify(&payload);

        let err = gateway.submit(&id, payload, "image/png").await.unwrap_err();
        assert!(matches!(err, GatewayError::StorageUnavailable { .. }));
        assert_eq!(store.inner.write_count(), 0);
    }

    #[tokio::test]
    async fn test_write_failure() {
        let store = Arc::new(FaultyStore::new(Fault::Write));
        let gateway = DedupGateway::new(store.clone());
        let payload = Bytes::from_static(b"disk full");
        let id = identify(&payload);

        let err = gateway.submit(&id, payload, "image/png").await.unwrap_err();
        assert!(matches!(err, GatewayError::StorageWriteFailed { .. }));
        assert_eq!(err.kind(), "storage_write_failed");
        assert!(store.inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_resolve_store_failure_is_unavailable() {
        let store = Arc::new(FaultyStore::new(Fault::Metadata));
        let gateway = DedupGateway::new(store);
        let id = identify(b"anything");

        let err = gateway.resolve(&id).await.unwrap_err();
        assert!(matches!(err, GatewayError::StorageUnavailable { .. }));
    }
}
