//! Error type shared by every step of the download chain.
//!
//! The controller converts any of these into a single user-facing message
//! (see `notify::error_message`); the CLI wraps them in anyhow.

use std::time::Duration;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Identifier missing/malformed in the page address, or no catalog entry/version.
    #[error("{0}")]
    NotFound(String),

    /// The catalog version has no package-binary asset.
    #[error("{0}")]
    AssetMissing(String),

    /// Non-2xx response from the catalog query or the file fetch.
    #[error("request to {url} failed with HTTP status {status}")]
    Http { url: String, status: u32 },

    /// The watched element never appeared within the bound.
    #[error("Element with selector \"{selector}\" not found within {timeout_ms}ms.")]
    Timeout { selector: String, timeout_ms: u128 },

    /// The watch handle was cancelled (or dropped) before an outcome.
    #[error("watch for selector \"{selector}\" was cancelled")]
    Cancelled { selector: String },

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),

    /// A node handle that does not belong to this document.
    #[error("node does not exist in this document")]
    UnknownNode,

    /// Inserting a node into itself or its own descendant.
    #[error("cannot insert a node into itself or its own descendant")]
    HierarchyRequest,

    #[error("transport error: {0}")]
    Transport(#[from] curl::Error),

    #[error("malformed catalog response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    TaskJoin(String),
}

impl Error {
    pub(crate) fn timeout(selector: &str, bound: Duration) -> Self {
        Error::Timeout {
            selector: selector.to_string(),
            timeout_ms: bound.as_millis(),
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u32> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
