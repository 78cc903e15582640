use std::io;
use thiserror::Error;

/// Result type for archive path operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Unified error type for all archive path operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    // Format errors
    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    // Member errors
    #[error("Member not found in archive: {0}")]
    MemberNotFound(String),

    #[error("Member is a directory: {0}")]
    IsADirectory(String),

    // Navigation errors
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid glob pattern: {0}")]
    InvalidPattern(String),

    // Text errors
    #[error("Unsupported text encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("Failed to decode {path} as {encoding}")]
    Decode { encoding: String, path: String },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<glob::PatternError> for ArchiveError {
    fn from(err: glob::PatternError) -> Self {
        ArchiveError::InvalidPattern(err.to_string())
    }
}

impl From<toml::de::Error> for ArchiveError {
    fn from(err: toml::de::Error) -> Self {
        ArchiveError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ArchiveError {
    fn from(err: toml::ser::Error) -> Self {
        ArchiveError::Config(err.to_string())
    }
}
