//! Configuration management for the image upload server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Default cap on upload request bodies: 10MB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageBackend,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served as static assets
    pub public_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageBackend {
    S3(StorageConfig),
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Base URL for public object links (CDN or custom domain)
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Unknown STORAGE_BACKEND {0:?} (expected \"s3\" or \"memory\")")]
    UnknownStorageBackend(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                public_dir: PathBuf::from("public"),
            },
            storage: StorageBackend::Memory,
            upload: UploadConfig {
                max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::MissingVar(name));

        let backend = lookup("STORAGE_BACKEND").unwrap_or_else(|| "s3".to_string());
        let storage = match backend.to_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "s3" => StorageBackend::S3(StorageConfig {
                endpoint: required("S3_ENDPOINT")?,
                bucket: required("S3_BUCKET")?,
                access_key: required("S3_ACCESS_KEY")?,
                secret_key: required("S3_SECRET_KEY")?,
                region: lookup("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                public_base_url: lookup("PUBLIC_BASE_URL"),
            }),
            _ => return Err(ConfigError::UnknownStorageBackend(backend)),
        };

        Ok(Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: lookup("PORT")
                    .or_else(|| lookup("SERVER_PORT"))
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3000),
                public_dir: lookup("PUBLIC_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("public")),
            },
            storage,
            upload: UploadConfig {
                max_bytes: lookup("MAX_UPLOAD_BYTES")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
        })
    }

    /// Socket address string to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
