//! In-memory object store
//!
//! Backs local development (`STORAGE_BACKEND=memory`) and tests. Counts
//! write calls so deduplication can be observed from the outside.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::error::StorageError;

use super::types::ObjectMetadata;
use super::ObjectStore;

/// Default base for media links handed out by the memory store
pub const DEFAULT_MEMORY_BASE_URL: &str = "memory://objects";

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Bytes,
    mime_type: String,
    public: bool,
}

/// Object store holding everything in a process-local map
pub struct InMemoryStore {
    objects: RwLock<HashMap<String, MemoryObject>>,
    writes: AtomicUsize,
    base_url: String,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_MEMORY_BASE_URL)
    }

    /// Create a store whose media links are rooted at `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            objects: RwLock::new(HashMap::new()),
            writes: AtomicUsize::new(0),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Number of `write` calls received so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Stored bytes for `key`, if any
    pub async fn data(&self, key: &str) -> Option<Bytes> {
        self.objects.read().await.get(key).map(|o| o.data.clone())
    }

    /// Whether `key` exists and has been made public
    pub async fn is_public(&self, key: &str) -> bool {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.public)
            .unwrap_or(false)
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn write(&self, key: &str, data: Bytes, mime_type: &str) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        // Last write wins, like a bucket receiving two racing uploads.
        let mut objects = self.objects.write().await;
        objects.insert(
            key.to_string(),
            MemoryObject {
                data,
                mime_type: mime_type.to_string(),
                public: false,
            },
        );

        tracing::debug!(key = %key, "Stored object in memory");
        Ok(())
    }

    async fn make_public(&self, key: &str) -> Result<(), StorageError> {
        let mut objects = self.objects.write().await;
        match objects.get_mut(key) {
            Some(object) => {
                object.public = true;
                Ok(())
            }
            None => Err(StorageError::ObjectNotFound(key.to_string())),
        }
    }

    async fn get_metadata(&self, key: &str) -> Result<ObjectMetadata, StorageError> {
        let objects = self.objects.read().await;
        let object = objects
            .get(key)
            .ok_or_else(|| StorageError::ObjectNotFound(key.to_string()))?;

        Ok(ObjectMetadata {
            size: object.data.len() as i64,
            content_type: Some(object.mime_type.clone()),
            media_link: format!("{}/{}", self.base_url, key),
        })
    }
}
