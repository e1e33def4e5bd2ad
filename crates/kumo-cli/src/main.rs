//! kumo command-line client.
//!
//! Runs filesystem commands against an in-memory content service,
//! optionally seeded from a local directory tree.
//!
//! Usage:
//!   kumo --seed ./site ls /
//!   kumo --seed ./site stat /index.html --json
//!   kumo --seed ./site find / 'glob:**/*.svg'
//!   kumo --config kumo.toml --seed ./site cat /notes/todo.txt

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::{EnvFilter, fmt};

use kumo_vfs::{
    AttributeView, FileAttr, FileSystemRegistry, FsConfig, MemoryContentService, OpenFlags,
    RemoteFileSystem, VfsPath,
};

/// Browse a remote filesystem.
#[derive(Parser, Debug)]
#[command(name = "kumo")]
#[command(about = "Command-line client for kumo remote filesystems")]
struct Args {
    /// TOML config file (endpoint, session release, read chunk size)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint when no config file is given
    #[arg(long, default_value = "safe://localhost")]
    endpoint: String,

    /// Local directory copied into the service before the command runs
    #[arg(long)]
    seed: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a directory
    Ls { path: String },

    /// Show file or directory attributes
    Stat {
        path: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a file
    Cat { path: String },

    /// Upload a local file as one object
    Put { local: PathBuf, remote: String },

    /// Create a directory
    Mkdir { path: String },

    /// Recursively list paths under a directory that match a pattern
    Find {
        dir: String,

        /// `glob:` or `regex:` pattern; a bare pattern is a glob
        pattern: String,
    },
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => FsConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => FsConfig::new(&args.endpoint),
    };

    let service = Arc::new(MemoryContentService::new());
    if let Some(dir) = &args.seed {
        let count = seed(&service, dir)?;
        tracing::info!(dir = %dir.display(), count, "seeded content service");
    }

    let registry = FileSystemRegistry::new();
    let fs = registry.open_with_config(config, service)?;

    let mut out = std::io::stdout().lock();
    let result = run(&fs, args.command, &mut out);
    fs.close();
    result
}

fn run(fs: &RemoteFileSystem, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Ls { path } => {
            for entry in fs.read_dir(&fs.get_path(&path, &[]))? {
                writeln!(out, "{entry}")?;
            }
        }
        Command::Stat { path, json } => {
            let path = fs.get_path(&path, &[]);
            let attr = fs.read_attributes(&path, AttributeView::Basic)?;
            if json {
                let value = serde_json::json!({
                    "path": path.as_str(),
                    "uri": fs.to_uri(&path),
                    "kind": attr.kind,
                    "size": attr.size,
                    "created": epoch_millis(attr.created),
                    "modified": epoch_millis(attr.modified),
                });
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
            } else {
                writeln!(out, "{}", describe(&path, &attr))?;
            }
        }
        Command::Cat { path } => {
            let mut channel = fs.new_channel(&fs.get_path(&path, &[]), OpenFlags::read())?;
            let mut data = Vec::new();
            channel.read_to_end(&mut data)?;
            out.write_all(&data)?;
        }
        Command::Put { local, remote } => {
            let data = std::fs::read(&local)
                .with_context(|| format!("Failed to read {}", local.display()))?;
            let remote = fs.get_path(&remote, &[]);
            let mut channel = fs.new_channel(&remote, OpenFlags::write())?;
            if channel.write(&data)? != data.len() {
                bail!("service did not acknowledge {remote}");
            }
            writeln!(out, "{} bytes -> {}", data.len(), fs.to_uri(&remote))?;
        }
        Command::Mkdir { path } => {
            let path = fs.get_path(&path, &[]);
            if !fs.create_directory(&path)? {
                bail!("service did not acknowledge {path}");
            }
        }
        Command::Find { dir, pattern } => {
            let pattern = if pattern.contains(':') {
                pattern
            } else {
                format!("glob:{pattern}")
            };
            let matcher = fs.path_matcher(&pattern)?;
            for path in walk(fs, &fs.get_path(&dir, &[]))? {
                if matcher.matches(&path) {
                    writeln!(out, "{path}")?;
                }
            }
        }
    }
    Ok(())
}

/// Depth-first listing of everything below `dir`.
fn walk(fs: &RemoteFileSystem, dir: &VfsPath) -> Result<Vec<VfsPath>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.clone()];
    while let Some(current) = pending.pop() {
        for entry in fs.read_dir(&current)? {
            if fs.read_attributes(&entry, AttributeView::Basic)?.is_dir() {
                pending.push(entry.clone());
            }
            found.push(entry);
        }
    }
    found.sort();
    Ok(found)
}

/// Copy a local tree into the service. Returns the number of files.
fn seed(service: &MemoryContentService, root: &Path) -> Result<usize> {
    let mut count = 0;
    let mut pending = vec![(root.to_path_buf(), VfsPath::parse("/"))];
    while let Some((local, remote)) = pending.pop() {
        let entries = std::fs::read_dir(&local)
            .with_context(|| format!("Failed to read directory {}", local.display()))?;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let target = remote.resolve_str(&name);
            let meta = entry.metadata()?;
            let modified = meta.modified().unwrap_or_else(|_| SystemTime::now());

            if meta.is_dir() {
                let secs = epoch_millis(modified) / 1000;
                service.insert_directory(target.as_str(), secs, secs);
                pending.push((entry.path(), target));
            } else if meta.is_file() {
                let data = std::fs::read(entry.path())
                    .with_context(|| format!("Failed to read {}", entry.path().display()))?;
                let created = meta.created().unwrap_or(modified);
                service.insert_file(target.as_str(), data, None, created, modified);
                count += 1;
            }
        }
    }
    Ok(count)
}

fn describe(path: &VfsPath, attr: &FileAttr) -> String {
    format!(
        "{path}\t{}\t{} bytes\tmodified {}",
        attr.kind,
        attr.size,
        epoch_millis(attr.modified) / 1000
    )
}

fn epoch_millis(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (tempfile::TempDir, RemoteFileSystem) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("docs/img")).unwrap();
        std::fs::write(dir.path().join("readme.txt"), "top").unwrap();
        std::fs::write(dir.path().join("docs/guide.txt"), "guide").unwrap();
        std::fs::write(dir.path().join("docs/img/logo.svg"), "<svg/>").unwrap();

        let service = Arc::new(MemoryContentService::new());
        assert_eq!(seed(&service, dir.path()).unwrap(), 3);
        let fs = RemoteFileSystem::new(
            "safe://localhost".parse().unwrap(),
            FsConfig::new("safe://localhost"),
            service,
        );
        (dir, fs)
    }

    fn output(fs: &RemoteFileSystem, command: Command) -> String {
        let mut out = Vec::new();
        run(fs, command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_ls_lists_directories_first() {
        let (_dir, fs) = seeded();
        let listing = output(&fs, Command::Ls { path: "/".into() });
        assert_eq!(listing, "/docs\n/readme.txt\n");
    }

    #[test]
    fn test_cat() {
        let (_dir, fs) = seeded();
        assert_eq!(output(&fs, Command::Cat { path: "/docs/guide.txt".into() }), "guide");
    }

    #[test]
    fn test_find_with_bare_glob() {
        let (_dir, fs) = seeded();
        let found = output(
            &fs,
            Command::Find {
                dir: "/".into(),
                pattern: "**/*.{svg,txt}".into(),
            },
        );
        assert_eq!(found, "/docs/guide.txt\n/docs/img/logo.svg\n/readme.txt\n");
    }

    #[test]
    fn test_stat_json() {
        let (_dir, fs) = seeded();
        let json = output(
            &fs,
            Command::Stat {
                path: "/docs/img".into(),
                json: true,
            },
        );
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "directory");
        assert_eq!(value["size"], 0);
        assert_eq!(value["uri"], "safe://localhost/docs/img");
    }

    #[test]
    fn test_put_and_mkdir() {
        let (dir, fs) = seeded();
        output(&fs, Command::Mkdir { path: "/uploads".into() });

        let local = dir.path().join("upload.bin");
        std::fs::write(&local, b"payload").unwrap();
        let msg = output(
            &fs,
            Command::Put {
                local,
                remote: "/uploads/upload.bin".into(),
            },
        );
        assert_eq!(msg, "7 bytes -> safe://localhost/uploads/upload.bin\n");
        assert_eq!(output(&fs, Command::Cat { path: "/uploads/upload.bin".into() }), "payload");
    }
}
