use std::io;

use thiserror::Error;

use crate::types::SourceName;

/// Error type for catalog fetch, parse, cache, and configuration failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not parse records for '{source_name}' from {path}: {reason}")]
    Parse {
        source_name: SourceName,
        path: String,
        reason: String,
    },
    #[error("remote fetch for '{source_name}' failed at {url}: {reason}")]
    Transport {
        source_name: SourceName,
        url: String,
        reason: String,
    },
    #[error("remote page for '{source_name}' at {url} could not be decoded: {reason}")]
    Decode {
        source_name: SourceName,
        url: String,
        reason: String,
    },
    #[error("caching '{source_name}' to {path} failed: {reason}")]
    CacheWrite {
        source_name: SourceName,
        path: String,
        reason: String,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}
