//! Directory listing.

use std::sync::Arc;

use crate::client::ContentClient;
use crate::error::{VfsError, VfsResult};
use crate::path::VfsPath;

/// Lists directories through a content client.
#[derive(Clone)]
pub struct DirectoryLister {
    client: Arc<dyn ContentClient>,
}

impl DirectoryLister {
    pub fn new(client: Arc<dyn ContentClient>) -> Self {
        Self { client }
    }

    /// Full listing of `dir` from one request.
    ///
    /// Subdirectories come first, then files, each group in service order.
    /// Every entry is resolved against `dir`.
    #[tracing::instrument(skip_all, fields(path = %dir), name = "listing.list")]
    pub fn list(&self, dir: &VfsPath) -> VfsResult<Vec<VfsPath>> {
        let key = dir.normalize();
        let listing = self
            .client
            .list_directory(key.as_str())
            .map_err(|e| VfsError::remote("get directory", key.as_str(), e))?;

        let entries: Vec<VfsPath> = listing
            .sub_directories
            .iter()
            .chain(listing.files.iter())
            .map(|info| dir.resolve_str(&info.name))
            .collect();
        tracing::debug!(count = entries.len(), "listed");
        Ok(entries)
    }

    /// [`list`](Self::list) with a predicate applied afterwards.
    pub fn list_filtered<F>(&self, dir: &VfsPath, mut filter: F) -> VfsResult<Vec<VfsPath>>
    where
        F: FnMut(&VfsPath) -> bool,
    {
        let mut entries = self.list(dir)?;
        entries.retain(|p| filter(p));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MemoryContentService, ServiceOp};
    use crate::client::{
        Ack, ClientError, ClientResult, DirectoryListing, EntryInfo, FetchedObject, RemoteFile,
    };

    /// Answers every listing with a fixed, deliberately unsorted response.
    struct FixedListing;

    impl ContentClient for FixedListing {
        fn create_file(&self, _: &str, _: &[u8]) -> ClientResult<Ack> {
            Err(ClientError::transport("unused"))
        }
        fn create_directory(&self, _: &str) -> ClientResult<Ack> {
            Err(ClientError::transport("unused"))
        }
        fn fetch_range(&self, _: &str, _: u64, _: u64) -> ClientResult<FetchedObject> {
            Err(ClientError::transport("unused"))
        }
        fn fetch(&self, _: &str) -> ClientResult<FetchedObject> {
            Err(ClientError::transport("unused"))
        }
        fn get_attributes(&self, _: &str) -> ClientResult<RemoteFile> {
            Err(ClientError::transport("unused"))
        }
        fn list_directory(&self, _: &str) -> ClientResult<DirectoryListing> {
            Ok(DirectoryListing {
                info: EntryInfo::new("testdir", 1, 2),
                sub_directories: vec![EntryInfo::new("zeta", 1, 1), EntryInfo::new("alpha", 1, 1)],
                files: vec![EntryInfo::new("b.txt", 1, 1), EntryInfo::new("a.txt", 1, 1)],
            })
        }
        fn release_session(&self) -> ClientResult<Ack> {
            Ok(Ack::ok())
        }
    }

    #[test]
    fn test_directories_then_files_in_service_order() {
        let lister = DirectoryLister::new(Arc::new(FixedListing));
        let names: Vec<String> = lister
            .list(&VfsPath::parse("/testdir"))
            .unwrap()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(
            names,
            vec!["/testdir/zeta", "/testdir/alpha", "/testdir/b.txt", "/testdir/a.txt"]
        );
    }

    #[test]
    fn test_filter_is_post_pass() {
        let svc = Arc::new(
            MemoryContentService::new()
                .with_file("/d/a.txt", "a")
                .with_file("/d/b.rs", "b")
                .with_directory("/d/sub"),
        );
        let lister = DirectoryLister::new(svc.clone());
        let txt = lister
            .list_filtered(&VfsPath::parse("/d"), |p| p.ends_with_str(".txt"))
            .unwrap();

        assert_eq!(txt, vec![VfsPath::parse("/d/a.txt")]);
        assert_eq!(svc.request_count(ServiceOp::ListDirectory), 1);
    }

    #[test]
    fn test_list_missing_directory() {
        let lister = DirectoryLister::new(Arc::new(MemoryContentService::new()));
        assert!(matches!(
            lister.list(&VfsPath::parse("/nope")),
            Err(VfsError::Remote { op: "get directory", .. })
        ));
    }
}
