//! Core VFS types.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use strum::{Display, EnumString};

/// Object kind as seen through the attribute probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FileKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl FileKind {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileKind::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileKind::Directory)
    }
}

/// Named attribute view.
///
/// Only `basic` is backed by the content service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum AttributeView {
    #[strum(serialize = "basic")]
    #[serde(rename = "basic")]
    Basic,
}

/// Basic file attributes.
///
/// The content service has no access time, so `accessed` mirrors
/// `modified`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttr {
    /// Size in bytes; zero for directories.
    pub size: u64,
    pub kind: FileKind,
    pub created: SystemTime,
    pub modified: SystemTime,
    pub accessed: SystemTime,
}

impl FileAttr {
    /// Attributes for a file object.
    pub fn file(size: u64, created: SystemTime, modified: SystemTime) -> Self {
        Self {
            size,
            kind: FileKind::File,
            created,
            modified,
            accessed: modified,
        }
    }

    /// Attributes for a directory.
    pub fn directory(created: SystemTime, modified: SystemTime) -> Self {
        Self {
            size: 0,
            kind: FileKind::Directory,
            created,
            modified,
            accessed: modified,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Always false: the service has no links or special files.
    pub fn is_symlink(&self) -> bool {
        false
    }

    /// Always false: the service has no links or special files.
    pub fn is_other(&self) -> bool {
        false
    }
}

/// Channel open flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenFlags {
    /// Read access requested.
    pub read: bool,
    /// Write access requested.
    pub write: bool,
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self {
            read: true,
            write: false,
        }
    }
}

impl OpenFlags {
    /// Read-only access.
    pub fn read() -> Self {
        Self::default()
    }

    /// Write-only access.
    pub fn write() -> Self {
        Self {
            read: false,
            write: true,
        }
    }

    /// Read and write access.
    pub fn read_write() -> Self {
        Self {
            read: true,
            write: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_file_kind() {
        assert!(FileKind::File.is_file());
        assert!(!FileKind::File.is_dir());
        assert!(FileKind::Directory.is_dir());
        assert_eq!(FileKind::Directory.to_string(), "directory");
    }

    #[test]
    fn test_file_attr_constructors() {
        let created = UNIX_EPOCH + Duration::from_secs(10);
        let modified = UNIX_EPOCH + Duration::from_secs(20);

        let file = FileAttr::file(3067, created, modified);
        assert!(file.is_file());
        assert_eq!(file.size, 3067);
        assert_eq!(file.accessed, modified);

        let dir = FileAttr::directory(created, modified);
        assert!(dir.is_dir());
        assert_eq!(dir.size, 0);
        assert!(!dir.is_symlink());
        assert!(!dir.is_other());
    }

    #[test]
    fn test_attribute_view_names() {
        assert_eq!(AttributeView::Basic.to_string(), "basic");
        assert_eq!(AttributeView::from_str("BASIC").unwrap(), AttributeView::Basic);
        assert!(AttributeView::from_str("posix").is_err());
    }

    #[test]
    fn test_open_flags() {
        let read = OpenFlags::read();
        assert!(read.read);
        assert!(!read.write);

        let write = OpenFlags::write();
        assert!(write.write);
        assert!(!write.read);

        assert_eq!(OpenFlags::read_write(), OpenFlags { read: true, write: true });
    }
}
