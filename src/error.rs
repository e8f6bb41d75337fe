//! Error types for packcrypt

use thiserror::Error;

/// Main error type for packcrypt operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Pack manifest not found: {0}")]
    ManifestMissing(String),

    #[error("Invalid pack manifest: {0}")]
    InvalidPackManifest(String),

    #[error("Cannot find {0}, the pack does not seem to be encrypted")]
    NotEncrypted(String),

    #[error("Entry not found: {0}")]
    EntryMissing(String),

    #[error("Invalid key length for {path} (expected 32, got {length})")]
    InvalidKeyLength { path: String, length: usize },

    #[error("Failed to decode {path} ({reason}), check the master key")]
    ContentsDecode { path: String, reason: String },

    #[error("Not an encrypted contents file: {0}")]
    InvalidContentsHeader(String),

    #[error("Content id is too long for the contents header: {0} bytes")]
    ContentIdTooLong(usize),

    #[error("Cipher error: {0}")]
    Cipher(String),
}

impl Error {
    /// Whether the error only affects a single entry and the walk can go on
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::EntryMissing(_) | Error::InvalidKeyLength { .. })
    }
}

/// Result type alias for packcrypt operations
pub type Result<T> = std::result::Result<T, Error>;
