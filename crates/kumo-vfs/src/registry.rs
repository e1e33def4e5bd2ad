//! Registry of open filesystems, keyed by endpoint identity.
//!
//! The registry is an ordinary value: whoever composes the system owns
//! one and passes it around, and tests build a fresh one per case.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::client::ContentClient;
use crate::config::FsConfig;
use crate::error::{VfsError, VfsResult};
use crate::filesystem::{Identity, RemoteFileSystem};
use crate::path::VfsPath;

/// At most one open filesystem per identity.
#[derive(Default)]
pub struct FileSystemRegistry {
    filesystems: Mutex<HashMap<Identity, RemoteFileSystem>>,
}

impl std::fmt::Debug for FileSystemRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystemRegistry")
            .field("filesystems", &"<locked>")
            .finish()
    }
}

impl FileSystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a filesystem for the identity in `uri` with default config.
    pub fn open(&self, uri: &str, client: Arc<dyn ContentClient>) -> VfsResult<RemoteFileSystem> {
        self.open_with_config(FsConfig::new(uri), client)
    }

    /// Open a filesystem for `config.endpoint`.
    ///
    /// Fails with [`VfsError::AlreadyOpen`] while an open filesystem holds
    /// the identity. A closed one is replaced.
    #[tracing::instrument(skip(self, config, client), fields(endpoint = %config.endpoint), name = "registry.open")]
    pub fn open_with_config(
        &self,
        config: FsConfig,
        client: Arc<dyn ContentClient>,
    ) -> VfsResult<RemoteFileSystem> {
        let identity = config.identity()?;
        let mut filesystems = self.filesystems.lock();

        if filesystems.get(&identity).is_some_and(RemoteFileSystem::is_open) {
            return Err(VfsError::already_open(identity.to_string()));
        }

        let fs = RemoteFileSystem::new(identity.clone(), config, client);
        filesystems.insert(identity, fs.clone());
        tracing::info!("filesystem opened");
        Ok(fs)
    }

    /// The open filesystem for the identity in `uri`.
    pub fn get(&self, uri: &str) -> VfsResult<RemoteFileSystem> {
        let identity = Identity::parse(uri)?;
        self.filesystems
            .lock()
            .get(&identity)
            .filter(|fs| fs.is_open())
            .cloned()
            .ok_or_else(|| VfsError::FileSystemNotFound(identity.to_string()))
    }

    /// The path named by a full URI, in its open filesystem.
    pub fn get_path(&self, uri: &str) -> VfsResult<VfsPath> {
        let fs = self.get(uri)?;
        Ok(fs.get_path(uri, &[]))
    }

    /// Identities of the currently open filesystems, sorted.
    pub fn open_identities(&self) -> Vec<Identity> {
        let mut ids: Vec<Identity> = self
            .filesystems
            .lock()
            .iter()
            .filter(|(_, fs)| fs.is_open())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}
