//! # kumo-vfs
//!
//! Virtual filesystem over a remote HTTP-like content service.
//!
//! The service addresses objects by path string and offers whole-object
//! create, byte-range fetch, file attributes and directory listings. This
//! crate layers a path algebra, random-access channels and directory
//! traversal on top of it:
//!
//! - [`VfsPath`] - Pure path values: normalize, resolve, relativize
//! - [`PathMatcher`] - `glob:` / `regex:` predicates over paths
//! - [`RemoteChannel`] - Byte channel mapped to range fetches and creates
//! - [`AttributeResolver`] - File-then-directory attribute probing
//! - [`DirectoryLister`] - One-request directory listings
//! - [`RemoteFileSystem`] - Namespace and lifecycle for one endpoint
//! - [`FileSystemRegistry`] - At most one open filesystem per endpoint
//! - [`ContentClient`] - The remote service interface
//!
//! ## Design Decisions
//!
//! - **Synchronous**: every remote call blocks the calling thread. Timeouts
//!   and retries belong to the [`ContentClient`] implementation.
//! - **Paths are values**: a [`VfsPath`] holds no reference to its
//!   filesystem and is freely cloned and sent between threads.
//! - **Injected registry**: there is no process-wide filesystem table.

mod attrs;
pub mod backends;
mod channel;
mod client;
mod config;
mod error;
mod filesystem;
mod listing;
mod matcher;
mod path;
mod registry;
mod store;
mod types;

pub use attrs::AttributeResolver;
pub use backends::{MemoryContentService, ServiceOp};
pub use channel::{DEFAULT_READ_CHUNK, RemoteChannel};
pub use client::{
    Ack, ClientError, ClientResult, ContentClient, DirectoryListing, EntryInfo, FetchedObject,
    RemoteFile,
};
pub use config::FsConfig;
pub use error::{VfsError, VfsResult};
pub use filesystem::{Identity, RemoteFileSystem};
pub use listing::DirectoryLister;
pub use matcher::{PathMatcher, Syntax};
pub use path::{Names, SEPARATOR, VfsPath};
pub use registry::FileSystemRegistry;
pub use store::FileStore;
pub use types::{AttributeView, FileAttr, FileKind, OpenFlags};
