//! Attribute resolution by probing.
//!
//! The content service has no unified stat call. A path is probed as a
//! file first and only on the service's bad-request answer as a directory,
//! so the common file case costs one round trip.

use std::sync::Arc;

use crate::client::ContentClient;
use crate::error::{VfsError, VfsResult};
use crate::path::VfsPath;
use crate::types::FileAttr;

/// Resolves [`FileAttr`] for paths through a content client.
#[derive(Clone)]
pub struct AttributeResolver {
    client: Arc<dyn ContentClient>,
}

impl AttributeResolver {
    pub fn new(client: Arc<dyn ContentClient>) -> Self {
        Self { client }
    }

    /// File probe, then directory probe on a bad-request answer.
    ///
    /// A bad-request answer from both probes means nothing exists at the
    /// path. Any other client failure surfaces as [`VfsError::Remote`].
    #[tracing::instrument(skip_all, fields(path = %path), name = "attrs.resolve")]
    pub fn resolve(&self, path: &VfsPath) -> VfsResult<FileAttr> {
        let key = path.normalize();
        let key = key.as_str();

        match self.client.get_attributes(key) {
            Ok(file) => {
                return Ok(FileAttr::file(file.content_length, file.created, file.modified));
            }
            Err(e) if e.is_bad_request() => {
                tracing::debug!(path = key, "not a file, probing directory");
            }
            Err(e) => return Err(VfsError::remote("get file", key, e)),
        }

        match self.client.list_directory(key) {
            Ok(dir) => Ok(FileAttr::directory(dir.info.created(), dir.info.modified())),
            Err(e) if e.is_bad_request() => Err(VfsError::not_found(key)),
            Err(e) => Err(VfsError::remote("get directory", key, e)),
        }
    }
}
