//! Remote-backed filesystem namespace.
//!
//! One [`RemoteFileSystem`] exists per endpoint identity. It owns the
//! client handle and the open/closed state, and hands out paths, matchers,
//! channels and listings for its namespace.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::attrs::AttributeResolver;
use crate::channel::{Owner, RemoteChannel};
use crate::client::ContentClient;
use crate::config::FsConfig;
use crate::error::{VfsError, VfsResult};
use crate::listing::DirectoryLister;
use crate::matcher::PathMatcher;
use crate::path::{SEPARATOR, VfsPath};
use crate::store::FileStore;
use crate::types::{AttributeView, FileAttr, OpenFlags};

/// Endpoint identity: a (scheme, host) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    scheme: String,
    host: String,
}

impl Identity {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into().to_ascii_lowercase(),
            host: host.into(),
        }
    }

    /// Parse `"scheme://host[/path]"`, ignoring any path.
    pub fn parse(uri: &str) -> VfsResult<Self> {
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| VfsError::invalid_argument(format!("'{uri}' is not a URI")))?;
        let host = rest.split(SEPARATOR).next().unwrap_or_default();
        if scheme.is_empty() || host.is_empty() {
            return Err(VfsError::invalid_argument(format!(
                "'{uri}' needs both a scheme and a host"
            )));
        }
        Ok(Self::new(scheme, host))
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)
    }
}

impl FromStr for Identity {
    type Err = VfsError;

    fn from_str(s: &str) -> VfsResult<Self> {
        Self::parse(s)
    }
}

struct Inner {
    identity: Identity,
    config: FsConfig,
    client: Arc<dyn ContentClient>,
    store: FileStore,
    attrs: AttributeResolver,
    lister: DirectoryLister,
    open: Arc<AtomicBool>,
}

/// Filesystem over one remote endpoint.
///
/// Cheap to clone; clones share the open/closed state. Path and matcher
/// construction work in any state. Everything that talks to the service
/// fails with [`VfsError::Closed`] once closed, including channels opened
/// earlier.
#[derive(Clone)]
pub struct RemoteFileSystem {
    inner: Arc<Inner>,
}

impl RemoteFileSystem {
    /// Open a filesystem outside any registry.
    pub fn new(identity: Identity, config: FsConfig, client: Arc<dyn ContentClient>) -> Self {
        let store = FileStore::new(&identity);
        Self {
            inner: Arc::new(Inner {
                attrs: AttributeResolver::new(client.clone()),
                lister: DirectoryLister::new(client.clone()),
                identity,
                config,
                client,
                store,
                open: Arc::new(AtomicBool::new(true)),
            }),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    pub fn config(&self) -> &FsConfig {
        &self.inner.config
    }

    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    pub fn is_read_only(&self) -> bool {
        false
    }

    pub fn separator(&self) -> char {
        SEPARATOR
    }

    /// Close the filesystem. Later calls are no-ops.
    ///
    /// The first close releases the remote session if configured to;
    /// a failed release is logged and the filesystem still closes.
    pub fn close(&self) {
        if !self.inner.open.swap(false, Ordering::AcqRel) {
            return;
        }
        tracing::info!(identity = %self.inner.identity, "filesystem closed");

        if self.inner.config.release_session_on_close {
            match self.inner.client.release_session() {
                Ok(ack) if ack.is_ok() => {}
                Ok(ack) => tracing::warn!(%ack, "session release not acknowledged"),
                Err(e) => tracing::warn!(error = %e, "session release failed"),
            }
        }
    }

    fn ensure_open(&self) -> VfsResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(VfsError::closed(self.inner.identity.to_string()))
        }
    }

    // ========================================================================
    // Pure namespace operations
    // ========================================================================

    /// Join `first` and `more` with the separator and parse the result.
    pub fn get_path(&self, first: &str, more: &[&str]) -> VfsPath {
        let mut full = first.to_string();
        for part in more {
            full.push(SEPARATOR);
            full.push_str(part);
        }
        VfsPath::parse_with(&full, SEPARATOR)
    }

    /// Compile a `"<syntax>:<pattern>"` matcher.
    pub fn path_matcher(&self, syntax_and_pattern: &str) -> VfsResult<PathMatcher> {
        PathMatcher::with_separator(syntax_and_pattern, SEPARATOR)
    }

    pub fn supported_attribute_views(&self) -> Vec<AttributeView> {
        vec![AttributeView::Basic]
    }

    /// `"<scheme>://<host>/<absolute path>"`.
    pub fn to_uri(&self, path: &VfsPath) -> String {
        format!("{}{}", self.inner.identity, path.to_real_path())
    }

    // ========================================================================
    // Stateful operations
    // ========================================================================

    /// The single root directory.
    pub fn root_directories(&self) -> VfsResult<Vec<VfsPath>> {
        self.ensure_open()?;
        Ok(vec![VfsPath::root_with(SEPARATOR)])
    }

    pub fn file_stores(&self) -> VfsResult<Vec<FileStore>> {
        self.ensure_open()?;
        Ok(vec![self.inner.store.clone()])
    }

    /// Open a channel on `path`, anchored at the root.
    pub fn new_channel(&self, path: &VfsPath, flags: OpenFlags) -> VfsResult<RemoteChannel> {
        self.ensure_open()?;
        let owner = Owner {
            identity: self.inner.identity.to_string(),
            open: self.inner.open.clone(),
        };
        Ok(
            RemoteChannel::new(self.inner.client.clone(), &path.to_real_path(), flags)
                .with_chunk_size(self.inner.config.read_chunk_size)
                .owned_by(owner),
        )
    }

    /// Create a directory.
    ///
    /// Returns whether the service acknowledged with "ok".
    #[tracing::instrument(skip_all, fields(path = %path), name = "fs.create_directory")]
    pub fn create_directory(&self, path: &VfsPath) -> VfsResult<bool> {
        self.ensure_open()?;
        let path = path.to_real_path();
        let ack = self
            .inner
            .client
            .create_directory(path.as_str())
            .map_err(|e| VfsError::remote("create directory", path.as_str(), e))?;
        if !ack.is_ok() {
            tracing::warn!(%ack, "create directory not acknowledged");
        }
        Ok(ack.is_ok())
    }

    /// Attributes through the named view.
    pub fn read_attributes(&self, path: &VfsPath, view: AttributeView) -> VfsResult<FileAttr> {
        self.ensure_open()?;
        match view {
            AttributeView::Basic => self.inner.attrs.resolve(&path.to_real_path()),
        }
    }

    /// Whether a file or directory exists at `path`.
    pub fn exists(&self, path: &VfsPath) -> VfsResult<bool> {
        match self.read_attributes(path, AttributeView::Basic) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Entries of `dir`: subdirectories first, then files.
    pub fn read_dir(&self, dir: &VfsPath) -> VfsResult<Vec<VfsPath>> {
        self.ensure_open()?;
        self.inner.lister.list(&dir.to_real_path())
    }

    /// Entries of `dir` accepted by `filter`.
    pub fn new_directory_stream<F>(&self, dir: &VfsPath, filter: F) -> VfsResult<Vec<VfsPath>>
    where
        F: FnMut(&VfsPath) -> bool,
    {
        self.ensure_open()?;
        self.inner.lister.list_filtered(&dir.to_real_path(), filter)
    }
}

impl fmt::Debug for RemoteFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFileSystem")
            .field("identity", &self.inner.identity)
            .field("open", &self.is_open())
            .finish()
    }
}
