//! Content addressing
//!
//! Every stored image is named by the SHA-1 digest of its bytes, so two
//! uploads of the same file always land on the same key.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use thiserror::Error;

/// Length of a hex-encoded SHA-1 digest
pub const IDENTIFIER_LEN: usize = 40;

/// Lowercase hex SHA-1 digest of an upload's bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentIdentifier(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("expected {IDENTIFIER_LEN} characters, got {0}")]
    InvalidLength(usize),

    #[error("not a lowercase hex digest: {0}")]
    InvalidCharacters(String),
}

impl ContentIdentifier {
    /// Parse an identifier supplied by a client (e.g. a URL path segment)
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        if value.len() != IDENTIFIER_LEN {
            return Err(IdentifierError::InvalidLength(value.len()));
        }

        if !value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(IdentifierError::InvalidCharacters(value.to_string()));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path under which the stored image is rendered
    pub fn path(&self) -> String {
        format!("/{}", self.0)
    }
}

impl fmt::Display for ContentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the content identifier for a payload
pub fn identify(payload: &[u8]) -> ContentIdentifier {
    let mut hasher = Sha1::new();
    hasher.update(payload);
    ContentIdentifier(hex::encode(hasher.finalize()))
}
