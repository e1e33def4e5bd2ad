//! End-to-end scenarios through the public API.
//!
//! Everything runs against the in-memory content service, through a
//! registry-opened filesystem, the same way a caller would wire it.

use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use kumo_vfs::backends::millis;
use kumo_vfs::{
    AttributeView, FileSystemRegistry, FsConfig, MemoryContentService, OpenFlags,
    RemoteFileSystem, ServiceOp, VfsError, VfsPath,
};

const ENDPOINT: &str = "safe://localhost";

const TEXT: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor\
incididunt ut labore et dolore magna aliqua.";

// ============================================================================
// Shared test setup
// ============================================================================

fn seeded_service() -> Arc<MemoryContentService> {
    let svc = MemoryContentService::new();
    svc.insert_file(
        "/testdir/testfile.txt",
        TEXT,
        Some("text/plain"),
        millis(1475573684523),
        millis(1475663064123),
    );
    svc.insert_file(
        "/testdir/image.svg",
        vec![b'<'; 3067],
        Some("image/svg+xml"),
        millis(1475573684523),
        millis(1475663064123),
    );
    svc.insert_directory("/testdir/testsubdir", 1475701203, 1475701221);
    Arc::new(svc)
}

fn open(registry: &FileSystemRegistry) -> (Arc<MemoryContentService>, RemoteFileSystem) {
    let svc = seeded_service();
    let fs = registry.open(ENDPOINT, svc.clone()).expect("open filesystem");
    (svc, fs)
}

fn path(registry: &FileSystemRegistry, rest: &str) -> VfsPath {
    registry
        .get_path(&format!("{ENDPOINT}/{rest}"))
        .expect("path in open filesystem")
}

// ============================================================================
// Path algebra
// ============================================================================

#[test]
fn test_normalize_relative_with_parent() {
    let p = VfsPath::parse("testdir/../testsubdir//testfile.txt");
    assert_eq!(p.normalize().as_str(), "testsubdir/testfile.txt");
}

#[test]
fn test_resolve_sibling_of_uri_path() {
    let registry = FileSystemRegistry::new();
    let _ = open(&registry);
    let base = path(&registry, "testdir/testsubdir/");
    let sibling = base.resolve_sibling(&VfsPath::parse("testsubdirsibling//testfile.txt"));
    assert_eq!(sibling.as_str(), "/testdir/testsubdirsibling/testfile.txt");
}

#[test]
fn test_relativize_uri_paths() {
    let registry = FileSystemRegistry::new();
    let _ = open(&registry);
    let base = path(&registry, "testdir/testsubdir/");
    let deeper = path(&registry, "testdir/testsubdir/testsubdir2/testfile.txt");
    assert_eq!(base.relativize(&deeper).unwrap().as_str(), "testsubdir2/testfile.txt");
}

#[test]
fn test_path_properties_over_samples() {
    let samples = [
        "/", "", "a", "/a/b/c", "a/./b/../c", "../..", "../a/../b", "/x/../../y", "./.", "a/b/..",
    ];
    let absolute = VfsPath::parse("/q/./r/../s");

    for s in samples {
        let p = VfsPath::parse(s);
        assert_eq!(p.normalize().normalize(), p.normalize(), "idempotence for {s:?}");
        if p.is_absolute() {
            assert_eq!(p.resolve(&absolute), absolute.normalize(), "absolute resolve for {s:?}");
        }
        for t in samples {
            let q = VfsPath::parse(t);
            let mixed = p.is_absolute() != q.is_absolute();
            assert_eq!(
                matches!(p.relativize(&q), Err(VfsError::InvalidArgument(_))),
                mixed,
                "relativize {s:?} against {t:?}"
            );
        }
    }
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn test_file_attributes_without_directory_probe() {
    let registry = FileSystemRegistry::new();
    let (svc, fs) = open(&registry);

    let attr = fs
        .read_attributes(&path(&registry, "testdir/image.svg"), AttributeView::Basic)
        .unwrap();

    assert!(attr.is_file());
    assert_eq!(attr.size, 3067);
    assert_eq!(attr.created, UNIX_EPOCH + Duration::from_millis(1475573684523));
    assert_eq!(attr.modified, UNIX_EPOCH + Duration::from_millis(1475663064123));
    assert_eq!(svc.request_count(ServiceOp::GetAttributes), 1);
    assert_eq!(svc.request_count(ServiceOp::ListDirectory), 0);
}

#[test]
fn test_directory_attributes_via_fallback() {
    let registry = FileSystemRegistry::new();
    let (svc, fs) = open(&registry);

    let attr = fs
        .read_attributes(&path(&registry, "testdir/testsubdir"), AttributeView::Basic)
        .unwrap();

    assert!(attr.is_dir());
    assert_eq!(attr.size, 0);
    assert_eq!(attr.created, UNIX_EPOCH + Duration::from_secs(1475701203));
    assert_eq!(attr.modified, UNIX_EPOCH + Duration::from_secs(1475701221));
    assert_eq!(svc.request_count(ServiceOp::ListDirectory), 1);
}

// ============================================================================
// Channels
// ============================================================================

#[test]
fn test_three_sequential_reads() {
    let registry = FileSystemRegistry::new();
    let (_svc, fs) = open(&registry);
    let mut ch = fs
        .new_channel(&path(&registry, "testdir/testfile.txt"), OpenFlags::read())
        .unwrap();

    let mut buf = [0u8; 48];
    let mut chunks = Vec::new();
    for _ in 0..3 {
        let n = ch.read(&mut buf).unwrap();
        chunks.push(String::from_utf8(buf[..n].to_vec()).unwrap());
    }

    assert_eq!(
        chunks,
        vec![
            "Lorem ipsum dolor sit amet, consectetur adipisci",
            "ng elit, sed do eiusmod temporincididunt ut labo",
            "re et dolore magna aliqua.",
        ]
    );
    assert_eq!(ch.position(), 122);
    assert_eq!(ch.size().unwrap(), 122);
}

#[test]
fn test_write_then_read_back() {
    let registry = FileSystemRegistry::new();
    let (_svc, fs) = open(&registry);
    let target = path(&registry, "testdir/testsubdir/new.txt");

    let mut writer = fs.new_channel(&target, OpenFlags::write()).unwrap();
    assert_eq!(writer.write(b"written once").unwrap(), 12);
    writer.close();

    let mut reader = fs.new_channel(&target, OpenFlags::read()).unwrap();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, b"written once");
    assert!(fs.exists(&target).unwrap());
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_listing_with_glob_filter() {
    let registry = FileSystemRegistry::new();
    let (_svc, fs) = open(&registry);
    let dir = path(&registry, "testdir");

    let all = fs.read_dir(&dir).unwrap();
    assert_eq!(all[0].as_str(), "/testdir/testsubdir");
    assert_eq!(all.len(), 3);

    let matcher = fs.path_matcher("glob:/testdir/*.{svg,png}").unwrap();
    let images = fs.new_directory_stream(&dir, |p| matcher.matches(p)).unwrap();
    assert_eq!(images, vec![VfsPath::parse("/testdir/image.svg")]);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_already_open_then_reopen() {
    let registry = FileSystemRegistry::new();
    let (svc, fs) = open(&registry);

    assert!(matches!(
        registry.open(ENDPOINT, seeded_service()),
        Err(VfsError::AlreadyOpen(_))
    ));

    fs.close();
    assert_eq!(svc.request_count(ServiceOp::ReleaseSession), 1);
    assert!(matches!(fs.root_directories(), Err(VfsError::Closed(_))));

    let reopened = registry.open(ENDPOINT, seeded_service()).unwrap();
    assert!(reopened.is_open());
}

#[test]
fn test_open_from_config() {
    let registry = FileSystemRegistry::new();
    let config = FsConfig::from_toml_str(
        r#"
endpoint = "safe://traktion0"
release_session_on_close = false
read_chunk_size = 16
"#,
    )
    .unwrap();
    let svc = seeded_service();
    let fs = registry.open_with_config(config, svc.clone()).unwrap();

    assert_eq!(fs.file_stores().unwrap()[0].name(), "safe://traktion0");

    let mut ch = fs
        .new_channel(&VfsPath::parse("/testdir/testfile.txt"), OpenFlags::read())
        .unwrap();
    let mut out = Vec::new();
    ch.read_to_end(&mut out).unwrap();
    // 122 bytes in 16-byte ranges, plus the empty read at the end
    assert_eq!(svc.request_count(ServiceOp::FetchRange), 9);

    fs.close();
    assert_eq!(svc.request_count(ServiceOp::ReleaseSession), 0);
}
