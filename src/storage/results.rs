//! Storage result types
//!
//! Defines the records returned by storage operations. They serialize directly into
//! the JSON bodies of the file API.

use serde::Serialize;

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    /// Relative to the user's root, `/`-separated
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
    /// Local time, `YYYY-MM-DD HH:MM`
    pub modified: String,
    pub is_stl: bool,
}

/// Who a listing was produced for
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub email: String,
    pub name: String,
    pub picture: String,
}

/// Result of a directory listing operation
#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    /// Echo of the client-supplied path
    pub path: String,
    pub items: Vec<Entry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

/// Confirmation of an upload, delete, or mkdir
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ActionResult {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            size: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}
