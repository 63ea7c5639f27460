//! Error types
//!
//! Defines domain-specific error types for each area of the server. Storage errors
//! carry only the path the client supplied, never the absolute location on disk.

use std::io;
use thiserror::Error;

/// Path resolution, listing and file operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The resolved location would lie outside the user's root
    #[error("Invalid path: {0}")]
    Containment(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    /// A file or folder name that is not a plain path segment
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("The root folder cannot be deleted")]
    RootNotRemovable,

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] io::Error),
}

impl StorageError {
    /// Maps an I/O failure on `client_path`, keeping "missing" distinct from other failures
    pub fn from_io(error: io::Error, client_path: &str) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(client_path.to_string()),
            _ => StorageError::Filesystem(error),
        }
    }
}

/// Session and OAuth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Access not allowed for {0}")]
    NotAllowed(String),

    /// The identity provider answered with an error
    #[error("{0}")]
    OAuth(String),

    #[error("OAuth request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to sign session token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Chat proxy errors
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Unknown model")]
    UnknownModel(String),

    #[error("{0} API key is not configured")]
    MissingApiKey(&'static str),

    #[error("Upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected upstream response: {0}")]
    Upstream(String),
}

/// Startup errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
