//! Random-access byte channel over one remote object.
//!
//! Reads map to byte-range fetches at the channel position. Writes are a
//! single whole-object create: the service has no partial or append
//! writes, so each channel commits at most one object body.

use std::io::{self, IoSlice, IoSliceMut, Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::client::{ClientError, ContentClient};
use crate::error::{VfsError, VfsResult};
use crate::path::VfsPath;
use crate::types::OpenFlags;

/// Default chunk size for [`RemoteChannel::read_to_end`].
pub const DEFAULT_READ_CHUNK: usize = 8192;

/// The filesystem a channel was issued by.
#[derive(Debug, Clone)]
pub(crate) struct Owner {
    pub(crate) identity: String,
    pub(crate) open: Arc<AtomicBool>,
}

/// Byte channel bound to one path.
///
/// Each channel owns its position; channels on the same path share nothing.
/// A channel issued by a filesystem stops working once that filesystem
/// closes.
pub struct RemoteChannel {
    client: Arc<dyn ContentClient>,
    path: VfsPath,
    flags: OpenFlags,
    position: u64,
    chunk_size: usize,
    open: bool,
    written: bool,
    owner: Option<Owner>,
}

impl RemoteChannel {
    /// Bind a channel to `path`, normalized.
    pub fn new(client: Arc<dyn ContentClient>, path: &VfsPath, flags: OpenFlags) -> Self {
        Self {
            client,
            path: path.normalize(),
            flags,
            position: 0,
            chunk_size: DEFAULT_READ_CHUNK,
            open: true,
            written: false,
            owner: None,
        }
    }

    /// Set the chunk size used by [`read_to_end`](Self::read_to_end).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub(crate) fn owned_by(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn path(&self) -> &VfsPath {
        &self.path
    }

    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    /// False once the channel or its filesystem is closed.
    pub fn is_open(&self) -> bool {
        self.open && self.owner_open()
    }

    fn owner_open(&self) -> bool {
        self.owner
            .as_ref()
            .is_none_or(|owner| owner.open.load(Ordering::Acquire))
    }

    /// Release local state. The remote object is already durable.
    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Move the position. Not checked against the object size; reads past
    /// the end return 0.
    pub fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    fn ensure_open(&self) -> VfsResult<()> {
        if !self.open {
            return Err(VfsError::ChannelClosed(self.path.to_string()));
        }
        match &self.owner {
            Some(owner) if !owner.open.load(Ordering::Acquire) => {
                Err(VfsError::closed(owner.identity.clone()))
            }
            _ => Ok(()),
        }
    }

    fn ensure_readable(&self) -> VfsResult<()> {
        self.ensure_open()?;
        if !self.flags.read {
            return Err(VfsError::NotReadable(self.path.to_string()));
        }
        Ok(())
    }

    fn ensure_writable(&self) -> VfsResult<()> {
        self.ensure_open()?;
        if !self.flags.write {
            return Err(VfsError::NotWritable(self.path.to_string()));
        }
        Ok(())
    }

    /// One range fetch into `buf`, filled from the front.
    fn fetch_into(&self, buf: &mut [u8], offset: u64) -> VfsResult<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let key = self.path.as_str();
        tracing::debug!(path = key, offset, len = buf.len(), "fetch range");

        let object = self
            .client
            .fetch_range(key, offset, buf.len() as u64)
            .map_err(|e| VfsError::remote("fetch", key, e))?;

        let mut body = object.body;
        let mut filled = 0;
        while filled < buf.len() {
            match body.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(VfsError::remote("fetch", key, ClientError::Io(e))),
            }
        }
        Ok(filled)
    }

    /// Read from the current position, advancing it by the bytes read.
    ///
    /// Returns 0 at or past the end of the object.
    pub fn read(&mut self, buf: &mut [u8]) -> VfsResult<usize> {
        self.ensure_readable()?;
        let n = self.fetch_into(buf, self.position)?;
        self.position += n as u64;
        Ok(n)
    }

    /// One independent range request per buffer, in order.
    pub fn read_vectored(&mut self, bufs: &mut [IoSliceMut<'_>]) -> VfsResult<usize> {
        let mut total = 0;
        for buf in bufs.iter_mut() {
            total += self.read(buf)?;
        }
        Ok(total)
    }

    /// Read at an explicit offset without moving the position.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> VfsResult<usize> {
        self.ensure_readable()?;
        self.fetch_into(buf, offset)
    }

    /// Read from the position to the end of the object in chunk-sized
    /// range requests.
    pub fn read_to_end(&mut self, out: &mut Vec<u8>) -> VfsResult<usize> {
        let mut chunk = vec![0u8; self.chunk_size];
        let mut total = 0;
        loop {
            let n = self.read(&mut chunk)?;
            if n == 0 {
                return Ok(total);
            }
            out.extend_from_slice(&chunk[..n]);
            total += n;
        }
    }

    /// Commit `buf` as the whole object body.
    ///
    /// Returns the buffer length on an "ok" acknowledgment and 0 on any
    /// other acknowledgment. A second write after a committed one fails.
    #[tracing::instrument(skip(self, buf), fields(path = %self.path, len = buf.len()), name = "channel.write")]
    pub fn write(&mut self, buf: &[u8]) -> VfsResult<usize> {
        self.ensure_writable()?;
        if self.written {
            return Err(VfsError::AlreadyWritten(self.path.to_string()));
        }

        let key = self.path.as_str();
        let ack = self
            .client
            .create_file(key, buf)
            .map_err(|e| VfsError::remote("create file", key, e))?;

        if !ack.is_ok() {
            tracing::warn!(%ack, "create not acknowledged");
            return Ok(0);
        }
        self.written = true;
        self.position += buf.len() as u64;
        Ok(buf.len())
    }

    /// Concatenate the buffers and commit them with one [`write`](Self::write).
    pub fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> VfsResult<usize> {
        let total = bufs
            .iter()
            .try_fold(0usize, |acc, b| acc.checked_add(b.len()))
            .ok_or_else(|| VfsError::invalid_argument("combined buffer size overflows"))?;

        let mut combined = Vec::with_capacity(total);
        for buf in bufs {
            combined.extend_from_slice(buf);
        }
        self.write(&combined)
    }

    /// Positional writes have no remote counterpart.
    pub fn write_at(&mut self, _buf: &[u8], _offset: u64) -> VfsResult<usize> {
        Err(VfsError::Unsupported("write_at"))
    }

    /// Object length as reported by the service.
    #[tracing::instrument(skip(self), fields(path = %self.path), name = "channel.size")]
    pub fn size(&self) -> VfsResult<u64> {
        self.ensure_open()?;
        let key = self.path.as_str();
        self.client
            .get_attributes(key)
            .map(|attrs| attrs.content_length)
            .map_err(|e| VfsError::remote("get file", key, e))
    }

    pub fn truncate(&mut self, _size: u64) -> VfsResult<()> {
        Err(VfsError::Unsupported("truncate"))
    }

    pub fn lock(&mut self) -> VfsResult<()> {
        Err(VfsError::Unsupported("lock"))
    }

    pub fn try_lock(&mut self) -> VfsResult<bool> {
        Err(VfsError::Unsupported("try_lock"))
    }

    pub fn transfer_to(&mut self, _position: u64, _count: u64, _target: &mut dyn Write) -> VfsResult<u64> {
        Err(VfsError::Unsupported("transfer_to"))
    }

    pub fn transfer_from(&mut self, _source: &mut dyn Read, _position: u64, _count: u64) -> VfsResult<u64> {
        Err(VfsError::Unsupported("transfer_from"))
    }

    /// No-op: a successful create is already durable.
    pub fn force(&self, _metadata: bool) -> VfsResult<()> {
        self.ensure_open()
    }
}

impl std::fmt::Debug for RemoteChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteChannel")
            .field("path", &self.path)
            .field("flags", &self.flags)
            .field("position", &self.position)
            .field("open", &self.open)
            .finish()
    }
}

impl Read for RemoteChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(RemoteChannel::read(self, buf)?)
    }

    fn read_vectored(&mut self, bufs: &mut [IoSliceMut<'_>]) -> io::Result<usize> {
        Ok(RemoteChannel::read_vectored(self, bufs)?)
    }
}

impl Write for RemoteChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(RemoteChannel::write(self, buf)?)
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        Ok(RemoteChannel::write_vectored(self, bufs)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(self.force(false)?)
    }
}

impl Seek for RemoteChannel {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => self.size()?.checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of object")
        })?;
        self.position = target;
        Ok(target)
    }
}
