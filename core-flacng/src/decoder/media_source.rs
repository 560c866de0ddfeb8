//! # Callback-backed Media Source
//!
//! Presents the Read/Seek/Tell/Length callbacks to symphonia as a
//! `MediaSource`, so the engine reaches the byte stream only through the
//! callback contract.

use crate::error::FlacError;
use crate::protocol::{LengthStatus, ReadStatus, SeekStatus, StreamDecoderCallbacks, TellStatus};
use parking_lot::Mutex;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;
use symphonia::core::io::MediaSource;

/// Callbacks plus the error of the last aborted I/O callback.
pub(crate) struct Shared<C> {
    pub(crate) callbacks: C,
    pending_abort: Option<FlacError>,
}

impl<C> Shared<C> {
    pub(crate) fn new(callbacks: C) -> Self {
        Self {
            callbacks,
            pending_abort: None,
        }
    }

    /// Park `error` for the engine and hand symphonia an `io::Error`.
    fn abort_with(&mut self, error: FlacError) -> io::Error {
        let io_error = io::Error::new(io::ErrorKind::Other, error.to_string());
        self.pending_abort = Some(error);
        io_error
    }

    /// Error of the callback that aborted the last I/O request, if any.
    pub(crate) fn take_abort(&mut self) -> Option<FlacError> {
        self.pending_abort.take()
    }
}

/// `MediaSource` whose I/O is served by [`StreamDecoderCallbacks`].
pub(crate) struct CallbackMediaSource<C> {
    shared: Arc<Mutex<Shared<C>>>,
}

impl<C> CallbackMediaSource<C> {
    pub(crate) fn new(shared: Arc<Mutex<Shared<C>>>) -> Self {
        Self { shared }
    }
}

impl<C: StreamDecoderCallbacks> Read for CallbackMediaSource<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut shared = self.shared.lock();
        match shared.callbacks.read(buf) {
            ReadStatus::Continue(read) => Ok(read),
            ReadStatus::EndOfStream => Ok(0),
            ReadStatus::Abort(e) => Err(shared.abort_with(e)),
        }
    }
}

impl<C: StreamDecoderCallbacks> Seek for CallbackMediaSource<C> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut shared = self.shared.lock();

        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => match shared.callbacks.tell() {
                TellStatus::Ok(current) => current.checked_add_signed(delta),
                TellStatus::Error(e) => return Err(shared.abort_with(e)),
            },
            SeekFrom::End(delta) => match shared.callbacks.length() {
                LengthStatus::Ok(length) => length.checked_add_signed(delta),
                LengthStatus::Unsupported => {
                    return Err(io::Error::new(
                        io::ErrorKind::Unsupported,
                        "stream length is unknown",
                    ))
                }
            },
        }
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative position"))?;

        match shared.callbacks.seek(target) {
            SeekStatus::Ok => Ok(target),
            SeekStatus::Error(e) => Err(shared.abort_with(e)),
        }
    }
}

impl<C: StreamDecoderCallbacks + Send> MediaSource for CallbackMediaSource<C> {
    fn is_seekable(&self) -> bool {
        matches!(self.shared.lock().callbacks.length(), LengthStatus::Ok(_))
    }

    fn byte_len(&self) -> Option<u64> {
        match self.shared.lock().callbacks.length() {
            LengthStatus::Ok(length) => Some(length),
            LengthStatus::Unsupported => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback_info::CallbackInfo;
    use crate::vfs::MemoryFile;

    fn source_over(file: MemoryFile) -> (CallbackMediaSource<CallbackInfo>, Arc<Mutex<Shared<CallbackInfo>>>) {
        let info = CallbackInfo::with_file(Box::new(file), 16);
        let shared = Arc::new(Mutex::new(Shared::new(info)));
        (CallbackMediaSource::new(shared.clone()), shared)
    }

    #[test]
    fn reads_through_callbacks() {
        let (mut source, _) = source_over(MemoryFile::new(vec![1u8, 2, 3, 4]));
        let mut buf = [0u8; 3];

        assert_eq!(source.read(&mut buf).unwrap(), 3);
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(source.read(&mut buf).unwrap(), 1);
        assert_eq!(source.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn relative_seeks_resolve_to_absolute() {
        let (mut source, _) = source_over(MemoryFile::new(vec![0u8; 100]));

        assert_eq!(source.seek(SeekFrom::Start(10)).unwrap(), 10);
        assert_eq!(source.seek(SeekFrom::Current(5)).unwrap(), 15);
        assert_eq!(source.seek(SeekFrom::End(-20)).unwrap(), 80);
        assert!(source.seek(SeekFrom::Current(-200)).is_err());
    }

    #[test]
    fn seek_failure_parks_the_error() {
        let (mut source, shared) = source_over(MemoryFile::new(vec![0u8; 8]));

        assert!(source.seek(SeekFrom::Start(64)).is_err());
        let parked = shared.lock().take_abort();
        assert!(matches!(parked, Some(FlacError::Seek { offset: 64, .. })));
        assert!(shared.lock().take_abort().is_none());
    }

    #[test]
    fn unbound_read_parks_fatal_error() {
        let shared = Arc::new(Mutex::new(Shared::new(CallbackInfo::new(16))));
        let mut source = CallbackMediaSource::new(shared.clone());

        let mut buf = [0u8; 4];
        assert!(source.read(&mut buf).is_err());
        assert!(shared.lock().take_abort().map_or(false, |e| e.is_fatal()));
    }

    #[test]
    fn live_streams_are_not_seekable() {
        let (source, _) = source_over(MemoryFile::live(vec![0u8; 8]));
        assert!(!source.is_seekable());
        assert_eq!(source.byte_len(), None);

        let (source, _) = source_over(MemoryFile::new(vec![0u8; 8]));
        assert!(source.is_seekable());
        assert_eq!(source.byte_len(), Some(8));
    }
}
