//! Storage module for S3-compatible backends
//!
//! The dedup gateway only talks to [`ObjectStore`]; any backend that can
//! answer existence, write, publish and describe calls on a flat key space
//! is interchangeable.

mod memory;
mod s3_client;
mod types;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageError;

pub use memory::InMemoryStore;
pub use s3_client::S3Client;
pub use types::*;

/// Object store capability consumed by the dedup gateway
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check whether an object exists under `key`
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Write `data` under `key` in one shot, recording `mime_type`.
    ///
    /// Must only return once the object is durable.
    async fn write(&self, key: &str, data: Bytes, mime_type: &str) -> Result<(), StorageError>;

    /// Make the object under `key` publicly readable
    async fn make_public(&self, key: &str) -> Result<(), StorageError>;

    /// Fetch the object's metadata. Absence is [`StorageError::ObjectNotFound`].
    async fn get_metadata(&self, key: &str) -> Result<ObjectMetadata, StorageError>;
}
