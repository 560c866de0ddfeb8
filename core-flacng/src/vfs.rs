//! # Virtual File Handles
//!
//! The byte-stream abstraction the callback layer reads from. A handle may be
//! backed by a local file, a memory buffer or a network stream whose total
//! size is not known.

use bytes::Bytes;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Seekable byte stream consumed by the I/O callbacks.
///
/// All positions are absolute byte offsets from the start of the stream.
pub trait VirtualFile: Send {
    /// Read up to `buf.len()` bytes. `Ok(0)` means no more data.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Move the read position. Returns the new absolute position.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Current absolute read position.
    fn tell(&mut self) -> io::Result<u64>;

    /// Total stream size, or `None` for unbounded streams.
    fn size(&mut self) -> Option<u64>;

    /// Whether the read position is at the end of the stream.
    fn eof(&mut self) -> bool;
}

/// Resolves a `SeekFrom` against a position and an optional length.
fn resolve_seek(pos: SeekFrom, current: u64, len: Option<u64>) -> io::Result<u64> {
    let target = match pos {
        SeekFrom::Start(offset) => Some(offset),
        SeekFrom::Current(delta) => current.checked_add_signed(delta),
        SeekFrom::End(delta) => match len {
            Some(len) => len.checked_add_signed(delta),
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "cannot seek relative to the end of an unbounded stream",
                ))
            }
        },
    };

    target.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative position")
    })
}

// ============================================================================
// Memory-backed handle
// ============================================================================

/// Handle over an in-memory copy of the encoded stream.
///
/// Use [`MemoryFile::live`] to model a stream whose size is unknown to the
/// reader (e.g. an internet radio relay); such handles still hold their bytes
/// but report no size and refuse seeks past the buffered data.
#[derive(Debug, Clone)]
pub struct MemoryFile {
    data: Bytes,
    position: u64,
    report_size: bool,
}

impl MemoryFile {
    /// Create a handle with a known size.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            position: 0,
            report_size: true,
        }
    }

    /// Create a handle that reports an unknown size.
    pub fn live(data: impl Into<Bytes>) -> Self {
        Self {
            report_size: false,
            ..Self::new(data)
        }
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }
}

impl VirtualFile for MemoryFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let start = self.position.min(self.len()) as usize;
        let available = &self.data[start..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.position += count as u64;
        Ok(count)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.report_size.then(|| self.len());
        let target = resolve_seek(pos, self.position, len)?;

        if target > self.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("offset {} beyond end of buffer ({})", target, self.len()),
            ));
        }

        self.position = target;
        Ok(target)
    }

    fn tell(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }

    fn size(&mut self) -> Option<u64> {
        self.report_size.then(|| self.len())
    }

    fn eof(&mut self) -> bool {
        self.position >= self.len()
    }
}

// ============================================================================
// Filesystem-backed handle
// ============================================================================

/// Handle over a file on the local filesystem.
#[derive(Debug)]
pub struct LocalFile {
    file: File,
    len: u64,
    position: u64,
}

impl LocalFile {
    /// Open a file for reading.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        debug!("Opened {:?} ({} bytes)", path, len);

        Ok(Self {
            file,
            len,
            position: 0,
        })
    }
}

impl VirtualFile for LocalFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = self.file.read(buf)?;
        self.position += count as u64;
        Ok(count)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let position = self.file.seek(pos)?;
        self.position = position;
        Ok(position)
    }

    fn tell(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }

    fn size(&mut self) -> Option<u64> {
        Some(self.len)
    }

    fn eof(&mut self) -> bool {
        self.position >= self.len
    }
}
