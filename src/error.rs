// src/error.rs

//! Error types for bundle handling
//!
//! The first five variants are the failure kinds of the install pipeline.
//! Each is terminal for the invocation that raised it. Checksum mismatches
//! and version verdicts are not errors; they are returned as data.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Bundle could not be opened, decoded, or written out
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// `blank.info` is missing or unreadable
    #[error("Reading bundle information failed: {0}")]
    InfoRead(String),

    /// `blank.manifest` is missing or unreadable
    #[error("Reading bundle manifest failed: {0}")]
    ManifestRead(String),

    /// A package file with the same name already sits in the cache directory
    #[error("{0} exists in cache directory")]
    CopyConflict(String),

    /// Package name unknown to the backend
    #[error("Package not found: {0}")]
    Lookup(String),

    #[error("Not a bundle: {0}")]
    InvalidBundle(String),

    #[error("Cannot derive package name and version from '{0}'")]
    InvalidName(String),

    #[error("Package backend error: {0}")]
    Backend(String),

    #[error("Bundle build failed: {0}")]
    Build(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
