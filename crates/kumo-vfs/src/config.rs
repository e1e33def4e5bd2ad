//! Filesystem configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! endpoint = "safe://localhost"
//! release_session_on_close = true
//! read_chunk_size = 8192
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::channel::DEFAULT_READ_CHUNK;
use crate::error::{VfsError, VfsResult};
use crate::filesystem::Identity;

/// Configuration for one remote filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsConfig {
    /// `"<scheme>://<host>"`; any path component is ignored.
    pub endpoint: String,

    /// Release the remote session when the filesystem closes.
    #[serde(default = "default_release_session")]
    pub release_session_on_close: bool,

    /// Range request size for whole-object reads through a channel.
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
}

fn default_release_session() -> bool {
    true
}

fn default_read_chunk_size() -> usize {
    DEFAULT_READ_CHUNK
}

impl FsConfig {
    /// Config for `endpoint` with defaults for everything else.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            release_session_on_close: default_release_session(),
            read_chunk_size: default_read_chunk_size(),
        }
    }

    pub fn with_release_session_on_close(mut self, release: bool) -> Self {
        self.release_session_on_close = release;
        self
    }

    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// Parse from a TOML document.
    pub fn from_toml_str(s: &str) -> VfsResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| VfsError::Config(e.to_string()))?;
        if config.read_chunk_size == 0 {
            return Err(VfsError::Config("read_chunk_size must be positive".into()));
        }
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> VfsResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded filesystem config");
        Self::from_toml_str(&content)
    }

    /// Identity parsed from the endpoint.
    pub fn identity(&self) -> VfsResult<Identity> {
        Identity::parse(&self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = FsConfig::from_toml_str(r#"endpoint = "safe://localhost""#).unwrap();
        assert_eq!(config, FsConfig::new("safe://localhost"));
        assert!(config.release_session_on_close);
        assert_eq!(config.read_chunk_size, 8192);
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
endpoint = "safe://traktion0/ignored/path"
release_session_on_close = false
read_chunk_size = 1024
"#;
        let config = FsConfig::from_toml_str(toml).unwrap();
        assert!(!config.release_session_on_close);
        assert_eq!(config.read_chunk_size, 1024);
        assert_eq!(config.identity().unwrap().to_string(), "safe://traktion0");
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(FsConfig::from_toml_str("read_chunk_size = 1"), Err(VfsError::Config(_))));
        assert!(matches!(
            FsConfig::from_toml_str("endpoint = \"safe://h\"\nread_chunk_size = 0"),
            Err(VfsError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint = \"safe://localhost\"").unwrap();
        writeln!(file, "read_chunk_size = 64").unwrap();

        let config = FsConfig::load(file.path()).unwrap();
        assert_eq!(config.read_chunk_size, 64);
        assert!(matches!(
            FsConfig::load(file.path().with_extension("missing")),
            Err(VfsError::Io(_))
        ));
    }

    #[test]
    fn test_builders() {
        let config = FsConfig::new("safe://localhost")
            .with_release_session_on_close(false)
            .with_read_chunk_size(16);
        assert!(!config.release_session_on_close);
        assert_eq!(config.read_chunk_size, 16);
    }
}
