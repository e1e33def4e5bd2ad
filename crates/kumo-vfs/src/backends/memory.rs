//! In-memory content service.
//!
//! Implements [`ContentClient`] over a map of normalized path strings, with
//! the same quirks as the remote service: whole-object creates, clamped
//! range fetches, and a bad-request answer to file attribute probes on
//! anything that is not a file. Every call is recorded, and a failure can
//! be queued for the next call of a given operation.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use strum::{Display, EnumString};

use crate::client::{
    Ack, ClientError, ClientResult, ContentClient, DirectoryListing, EntryInfo, FetchedObject,
    RemoteFile,
};
use crate::path::VfsPath;

/// Service operations, for the request log and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ServiceOp {
    CreateFile,
    CreateDirectory,
    FetchRange,
    Fetch,
    GetAttributes,
    ListDirectory,
    ReleaseSession,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub op: ServiceOp,
    /// Path as passed by the caller; empty for session release.
    pub path: String,
}

#[derive(Debug, Clone)]
enum Entry {
    File {
        data: Vec<u8>,
        content_type: Option<String>,
        created: SystemTime,
        modified: SystemTime,
    },
    Directory {
        created_on: u64,
        modified_on: u64,
    },
}

/// In-memory content service.
///
/// Thread-safe via internal `parking_lot` locks. All data is lost when dropped.
#[derive(Debug)]
pub struct MemoryContentService {
    entries: RwLock<HashMap<String, Entry>>,
    requests: Mutex<Vec<Request>>,
    failures: Mutex<HashMap<ServiceOp, VecDeque<ClientError>>>,
    acks: Mutex<VecDeque<Ack>>,
}

impl Default for MemoryContentService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContentService {
    /// Create a service holding only the root directory.
    pub fn new() -> Self {
        let now = now_secs();
        let mut entries = HashMap::new();
        entries.insert(
            "/".to_string(),
            Entry::Directory {
                created_on: now,
                modified_on: now,
            },
        );
        Self {
            entries: RwLock::new(entries),
            requests: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            acks: Mutex::new(VecDeque::new()),
        }
    }

    /// Seed a file with explicit metadata, creating missing parents.
    ///
    /// Seeding is not recorded in the request log.
    pub fn insert_file(
        &self,
        path: &str,
        data: impl Into<Vec<u8>>,
        content_type: Option<&str>,
        created: SystemTime,
        modified: SystemTime,
    ) {
        let key = key(path);
        let mut entries = self.entries.write();
        ensure_parents(&mut entries, &key);
        entries.insert(
            key,
            Entry::File {
                data: data.into(),
                content_type: content_type.map(str::to_string),
                created,
                modified,
            },
        );
    }

    /// Seed a directory with explicit second-resolution times, creating
    /// missing parents.
    pub fn insert_directory(&self, path: &str, created_on: u64, modified_on: u64) {
        let key = key(path);
        let mut entries = self.entries.write();
        ensure_parents(&mut entries, &key);
        entries.insert(
            key,
            Entry::Directory {
                created_on,
                modified_on,
            },
        );
    }

    /// Seed a file stamped with the current time.
    pub fn with_file(self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        let now = SystemTime::now();
        self.insert_file(path, data, None, now, now);
        self
    }

    /// Seed a directory stamped with the current time.
    pub fn with_directory(self, path: &str) -> Self {
        let now = now_secs();
        self.insert_directory(path, now, now);
        self
    }

    /// Fail the next call of `op` with `error`. Queued failures are consumed
    /// in order.
    pub fn fail_next(&self, op: ServiceOp, error: ClientError) {
        self.failures.lock().entry(op).or_default().push_back(error);
    }

    /// Answer the next successful file create with `ack` instead of "ok".
    pub fn ack_next_create(&self, ack: Ack) {
        self.acks.lock().push_back(ack);
    }

    /// All calls so far, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// Number of recorded calls of `op`.
    pub fn request_count(&self, op: ServiceOp) -> usize {
        self.requests.lock().iter().filter(|r| r.op == op).count()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    /// Raw object bytes, bypassing the request log.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        match self.entries.read().get(&key(path)) {
            Some(Entry::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    fn begin(&self, op: ServiceOp, path: &str) -> ClientResult<()> {
        tracing::trace!(%op, path, "memory service request");
        self.requests.lock().push(Request {
            op,
            path: path.to_string(),
        });
        match self.failures.lock().get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn read_file(&self, path: &str) -> ClientResult<Vec<u8>> {
        match self.entries.read().get(&key(path)) {
            Some(Entry::File { data, .. }) => Ok(data.clone()),
            Some(Entry::Directory { .. }) => Err(ClientError::bad_request(format!(
                "'{path}' is a directory"
            ))),
            None => Err(ClientError::bad_request("Not Found")),
        }
    }
}

impl ContentClient for MemoryContentService {
    fn create_file(&self, path: &str, data: &[u8]) -> ClientResult<Ack> {
        self.begin(ServiceOp::CreateFile, path)?;
        let key = key(path);
        let mut entries = self.entries.write();

        require_parent_dir(&entries, &key)?;
        let now = SystemTime::now();
        let created = match entries.get(&key) {
            Some(Entry::Directory { .. }) => {
                return Err(ClientError::Rejected {
                    status: 409,
                    message: format!("'{key}' is a directory"),
                });
            }
            Some(Entry::File { created, .. }) => *created,
            None => now,
        };
        entries.insert(
            key,
            Entry::File {
                data: data.to_vec(),
                content_type: None,
                created,
                modified: now,
            },
        );
        drop(entries);

        Ok(self.acks.lock().pop_front().unwrap_or_else(Ack::ok))
    }

    fn create_directory(&self, path: &str) -> ClientResult<Ack> {
        self.begin(ServiceOp::CreateDirectory, path)?;
        let key = key(path);
        let mut entries = self.entries.write();

        require_parent_dir(&entries, &key)?;
        if entries.contains_key(&key) {
            return Err(ClientError::Rejected {
                status: 409,
                message: format!("'{key}' already exists"),
            });
        }
        let now = now_secs();
        entries.insert(
            key,
            Entry::Directory {
                created_on: now,
                modified_on: now,
            },
        );
        Ok(Ack::ok())
    }

    fn fetch_range(&self, path: &str, offset: u64, length: u64) -> ClientResult<FetchedObject> {
        self.begin(ServiceOp::FetchRange, path)?;
        let data = self.read_file(path)?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
        let len = usize::try_from(length).unwrap_or(usize::MAX);
        let end = start.saturating_add(len).min(data.len());
        Ok(FetchedObject::from_bytes(data[start..end].to_vec()))
    }

    fn fetch(&self, path: &str) -> ClientResult<FetchedObject> {
        self.begin(ServiceOp::Fetch, path)?;
        Ok(FetchedObject::from_bytes(self.read_file(path)?))
    }

    fn get_attributes(&self, path: &str) -> ClientResult<RemoteFile> {
        self.begin(ServiceOp::GetAttributes, path)?;
        match self.entries.read().get(&key(path)) {
            Some(Entry::File {
                data,
                content_type,
                created,
                modified,
            }) => {
                let len = data.len() as u64;
                Ok(RemoteFile {
                    content_length: len,
                    content_range: Some(format!("bytes 0-{len}/{len}")),
                    content_type: content_type.clone(),
                    created: *created,
                    modified: *modified,
                })
            }
            _ => Err(ClientError::bad_request("Not Found")),
        }
    }

    fn list_directory(&self, path: &str) -> ClientResult<DirectoryListing> {
        self.begin(ServiceOp::ListDirectory, path)?;
        let dir = key(path);
        let entries = self.entries.read();

        let info = match entries.get(&dir) {
            Some(Entry::Directory {
                created_on,
                modified_on,
            }) => EntryInfo::new(name_of(&dir), *created_on, *modified_on),
            _ => return Err(ClientError::bad_request("Not Found")),
        };

        let mut listing = DirectoryListing {
            info,
            sub_directories: Vec::new(),
            files: Vec::new(),
        };
        for (child, entry) in entries.iter() {
            if child == &dir || parent_key(child) != dir {
                continue;
            }
            match entry {
                Entry::Directory {
                    created_on,
                    modified_on,
                } => listing
                    .sub_directories
                    .push(EntryInfo::new(name_of(child), *created_on, *modified_on)),
                Entry::File {
                    created, modified, ..
                } => listing.files.push(EntryInfo::new(
                    name_of(child),
                    epoch_secs(*created),
                    epoch_secs(*modified),
                )),
            }
        }

        // HashMap order is arbitrary
        listing.sub_directories.sort_by(|a, b| a.name.cmp(&b.name));
        listing.files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listing)
    }

    fn release_session(&self) -> ClientResult<Ack> {
        self.begin(ServiceOp::ReleaseSession, "")?;
        Ok(Ack::ok())
    }
}

fn key(path: &str) -> String {
    VfsPath::parse(path).to_real_path().to_string()
}

fn parent_key(key: &str) -> String {
    VfsPath::parse(key)
        .parent()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "/".to_string())
}

fn name_of(key: &str) -> String {
    VfsPath::parse(key)
        .file_name()
        .map(|n| n.to_string())
        .unwrap_or_default()
}

fn ensure_parents(entries: &mut HashMap<String, Entry>, key: &str) {
    let now = now_secs();
    let mut current = VfsPath::parse("/");
    let path = VfsPath::parse(key);
    let count = path.name_count();
    for name in path.iter().take(count.saturating_sub(1)) {
        current = current.resolve(&name);
        entries
            .entry(current.to_string())
            .or_insert(Entry::Directory {
                created_on: now,
                modified_on: now,
            });
    }
}

fn require_parent_dir(entries: &HashMap<String, Entry>, key: &str) -> ClientResult<()> {
    let parent = parent_key(key);
    match entries.get(&parent) {
        Some(Entry::Directory { .. }) => Ok(()),
        _ => Err(ClientError::bad_request(format!(
            "parent directory '{parent}' not found"
        ))),
    }
}

fn epoch_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn now_secs() -> u64 {
    epoch_secs(SystemTime::now())
}

/// Milliseconds since the epoch as a `SystemTime`.
pub fn millis(ms: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(ms)
}
