//! Remote content service client interface.
//!
//! The content service addresses objects by path string and only offers
//! whole-object create, byte-range fetch, attribute and directory queries.
//! There is no unified "stat": [`ContentClient::get_attributes`] fails with
//! [`ClientError::BadRequest`] when the target is not a file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Read};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Failure reported by the remote content client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Distinguished bad-request signal (e.g. "not found as file").
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The service answered with a non-success status.
    #[error("rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Network or session failure.
    #[error("transport: {0}")]
    Transport(String),

    /// Failure reading a response body.
    #[error("body: {0}")]
    Io(#[from] io::Error),
}

impl ClientError {
    /// Create a BadRequest error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Create a Transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Returns true for the distinguished bad-request signal.
    pub fn is_bad_request(&self) -> bool {
        matches!(self, ClientError::BadRequest(_))
    }
}

/// Client result type.
pub type ClientResult<T> = Result<T, ClientError>;

/// Acknowledgment string returned by mutating requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack(pub String);

impl Ack {
    /// The service's success acknowledgment.
    pub fn ok() -> Self {
        Self("ok".to_string())
    }

    /// Returns true if the service acknowledged with "ok".
    pub fn is_ok(&self) -> bool {
        self.0 == "ok"
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attributes reported for a file object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Object length in bytes.
    pub content_length: u64,
    /// e.g. `bytes 0-3067/3067`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub created: SystemTime,
    pub modified: SystemTime,
}

/// Directory entry metadata as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub name: String,
    /// Creation time, seconds since the epoch.
    pub created_on: u64,
    /// Modification time, seconds since the epoch.
    pub modified_on: u64,
}

impl EntryInfo {
    /// Create entry info from second-resolution timestamps.
    pub fn new(name: impl Into<String>, created_on: u64, modified_on: u64) -> Self {
        Self {
            name: name.into(),
            created_on,
            modified_on,
        }
    }

    pub fn created(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.created_on)
    }

    pub fn modified(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.modified_on)
    }
}

/// One "get directory" response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryListing {
    /// The listed directory itself.
    pub info: EntryInfo,
    #[serde(default)]
    pub sub_directories: Vec<EntryInfo>,
    #[serde(default)]
    pub files: Vec<EntryInfo>,
}

/// Body of a fetch request.
pub struct FetchedObject {
    /// Length the service reported for this response.
    pub content_length: u64,
    pub body: Box<dyn Read + Send>,
}

impl FetchedObject {
    /// Wrap an in-memory body.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            content_length: data.len() as u64,
            body: Box::new(io::Cursor::new(data)),
        }
    }
}

impl fmt::Debug for FetchedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchedObject")
            .field("content_length", &self.content_length)
            .field("body", &"<stream>")
            .finish()
    }
}

/// Remote content service operations.
///
/// Every call is a blocking round trip. Paths are the normalized string
/// form of a [`VfsPath`](crate::VfsPath). Retries, authentication and
/// connection reuse belong to the implementation, not to callers.
pub trait ContentClient: Send + Sync {
    /// Create (or replace) a file with the whole object body.
    fn create_file(&self, path: &str, data: &[u8]) -> ClientResult<Ack>;

    /// Create a directory.
    fn create_directory(&self, path: &str) -> ClientResult<Ack>;

    /// Fetch up to `length` bytes starting at `offset`.
    ///
    /// Returns fewer bytes if the object ends first.
    fn fetch_range(&self, path: &str, offset: u64, length: u64) -> ClientResult<FetchedObject>;

    /// Fetch the whole object.
    fn fetch(&self, path: &str) -> ClientResult<FetchedObject>;

    /// Get file attributes. Fails with [`ClientError::BadRequest`] when the
    /// path is not a file.
    fn get_attributes(&self, path: &str) -> ClientResult<RemoteFile>;

    /// List a directory.
    fn list_directory(&self, path: &str) -> ClientResult<DirectoryListing>;

    /// Release the authenticated session (auth-token deletion).
    fn release_session(&self) -> ClientResult<Ack>;
}
