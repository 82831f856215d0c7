//! img-uploader
//!
//! A content-addressed image store: uploads are named by the SHA-1 of their
//! bytes, written once to an object store and served back from a stable URL.
//!
//! # Modules
//!
//! - `addressor`: content identifiers
//! - `gateway`: write-once dedup protocol over an object store
//! - `storage`: object store capability and its S3 / in-memory backends
//! - `routes`: HTTP surface

pub mod addressor;
pub mod config;
pub mod error;
pub mod gateway;
pub mod routes;
pub mod state;
pub mod storage;
