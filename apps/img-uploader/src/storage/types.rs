//! Storage types

/// User metadata key under which the declared MIME type is recorded
pub const MIME_TYPE_METADATA_KEY: &str = "mimetype";

/// Metadata about a storage object
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    pub size: i64,
    pub content_type: Option<String>,
    /// URL from which the object can be fetched once public
    pub media_link: String,
}
