//! VFS error types.

use std::io;
use thiserror::Error;

use crate::client::ClientError;

/// VFS error type.
#[derive(Debug, Error)]
pub enum VfsError {
    /// Malformed argument (matcher syntax, mixed absolute/relative operands).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Name index outside the path's segment range.
    #[error("index {index} out of range for path with {count} names")]
    IndexOutOfRange { index: usize, count: usize },

    /// The remote content service rejected or failed a request.
    #[error("{op} '{path}' failed: {source}")]
    Remote {
        op: &'static str,
        path: String,
        #[source]
        source: ClientError,
    },

    /// Neither a file nor a directory exists at the path.
    #[error("not found: {0}")]
    NotFound(String),

    /// A filesystem with this identity is already open.
    #[error("filesystem already open: {0}")]
    AlreadyOpen(String),

    /// No open filesystem is registered for this identity.
    #[error("no open filesystem for: {0}")]
    FileSystemNotFound(String),

    /// The filesystem has been closed.
    #[error("filesystem is closed: {0}")]
    Closed(String),

    /// The channel has been closed.
    #[error("channel is closed: {0}")]
    ChannelClosed(String),

    /// The channel was not opened for reading.
    #[error("channel not open for reading: {0}")]
    NotReadable(String),

    /// The channel was not opened for writing.
    #[error("channel not open for writing: {0}")]
    NotWritable(String),

    /// The channel already committed its single whole-object create.
    #[error("object already written through this channel: {0}")]
    AlreadyWritten(String),

    /// Operation has no remote counterpart.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Malformed configuration.
    #[error("config: {0}")]
    Config(String),

    /// Local I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VfsError {
    /// Create an InvalidArgument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an AlreadyOpen error.
    pub fn already_open(identity: impl Into<String>) -> Self {
        Self::AlreadyOpen(identity.into())
    }

    /// Create a Closed error.
    pub fn closed(identity: impl Into<String>) -> Self {
        Self::Closed(identity.into())
    }

    /// Wrap a client failure for the given remote operation.
    pub fn remote(op: &'static str, path: impl Into<String>, source: ClientError) -> Self {
        Self::Remote {
            op,
            path: path.into(),
            source,
        }
    }

    /// Returns true for the "does not exist" signal used by existence checks.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound(_))
    }
}

/// Convert VfsError to std::io::Error for the `Read`/`Write`/`Seek` adapters.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::InvalidArgument(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            e @ VfsError::IndexOutOfRange { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
            }
            VfsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::FileSystemNotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::AlreadyOpen(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            VfsError::AlreadyWritten(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            e @ (VfsError::Closed(_) | VfsError::ChannelClosed(_)) => {
                io::Error::new(io::ErrorKind::BrokenPipe, e.to_string())
            }
            e @ (VfsError::NotReadable(_) | VfsError::NotWritable(_)) => {
                io::Error::new(io::ErrorKind::PermissionDenied, e.to_string())
            }
            VfsError::Config(msg) => io::Error::new(io::ErrorKind::InvalidData, msg),
            VfsError::Unsupported(op) => io::Error::new(io::ErrorKind::Unsupported, op),
            VfsError::Io(e) => e,
            e @ VfsError::Remote { .. } => io::Error::other(e),
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_keeps_source() {
        let err = VfsError::remote("get file", "/a.txt", ClientError::bad_request("Not Found"));
        assert_eq!(err.to_string(), "get file '/a.txt' failed: bad request: Not Found");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_conversion_kinds() {
        let io: io::Error = VfsError::not_found("/x").into();
        assert_eq!(io.kind(), io::ErrorKind::NotFound);

        let io: io::Error = VfsError::Unsupported("truncate").into();
        assert_eq!(io.kind(), io::ErrorKind::Unsupported);

        let io: io::Error = VfsError::IndexOutOfRange { index: 4, count: 3 }.into();
        assert_eq!(io.kind(), io::ErrorKind::InvalidInput);
    }
}
