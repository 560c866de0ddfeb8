//! # Callback Context and Adapters
//!
//! [`CallbackInfo`] is the per-stream context threaded through every decoder
//! callback. It owns the bound [`VirtualFile`], the output buffer the frame
//! callback interleaves into, and the formats recorded along the way.
//!
//! ```text
//! VirtualFile → read → engine → write_frame → OutputBuffer → outer loop
//!                        └────→ metadata ───→ StreamFormat / bitrate
//! ```
//!
//! One context exists per open stream. The outer loop drains the output
//! buffer and resets it between decode steps; the callbacks only ever append.

use crate::error::FlacError;
use crate::format::{is_supported_bits_per_sample, FrameFormat, StreamFormat};
use crate::output_buffer::OutputBuffer;
use crate::protocol::{
    DecoderErrorStatus, FrameHeader, LengthStatus, MetadataBlock, ReadStatus, SeekStatus,
    StreamDecoderCallbacks, StreamInfo, TellStatus, WriteStatus,
};
use crate::vfs::VirtualFile;
use std::fmt;
use std::io::SeekFrom;
use tracing::{debug, error};

/// Shared state for one decode session.
pub struct CallbackInfo {
    file: Option<Box<dyn VirtualFile>>,
    output: OutputBuffer,

    /// Format of the last frame written to the output buffer
    pub frame: FrameFormat,

    /// Stream format from STREAMINFO
    pub stream: StreamFormat,

    /// Average bitrate in bits per second, 0 if unknown
    pub bitrate: u32,

    /// Set when STREAMINFO has been consumed. Cleared only by the outer loop.
    pub metadata_changed: bool,
}

impl CallbackInfo {
    /// Create a context with no file bound and an output buffer of
    /// `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            file: None,
            output: OutputBuffer::new(capacity),
            frame: FrameFormat::default(),
            stream: StreamFormat::default(),
            bitrate: 0,
            metadata_changed: false,
        }
    }

    /// Create a context reading from `file`.
    pub fn with_file(file: Box<dyn VirtualFile>, capacity: usize) -> Self {
        let mut info = Self::new(capacity);
        info.file = Some(file);
        info
    }

    /// Bind a file handle, returning the previously bound one.
    pub fn bind_file(&mut self, file: Box<dyn VirtualFile>) -> Option<Box<dyn VirtualFile>> {
        self.file.replace(file)
    }

    /// Release the bound file handle.
    pub fn unbind_file(&mut self) -> Option<Box<dyn VirtualFile>> {
        self.file.take()
    }

    /// Returns `true` if a file handle is bound.
    pub fn is_bound(&self) -> bool {
        self.file.is_some()
    }

    /// Decoded samples waiting for the outer loop.
    pub fn output(&self) -> &OutputBuffer {
        &self.output
    }

    /// Mutable access for the outer loop to drain or reset the buffer.
    pub fn output_mut(&mut self) -> &mut OutputBuffer {
        &mut self.output
    }

    fn apply_stream_info(&mut self, info: &StreamInfo) {
        self.stream.total_samples = info.total_samples;
        debug!("total_samples={}", info.total_samples);

        self.stream.bits_per_sample = info.bits_per_sample;
        debug!("bits_per_sample={}", info.bits_per_sample);

        self.stream.channels = info.channels;
        debug!("channels={}", info.channels);

        self.stream.sample_rate = info.sample_rate;
        debug!("sample_rate={}", info.sample_rate);

        let size = self.file.as_mut().and_then(|file| file.size());
        self.bitrate = average_bitrate(size, info.sample_rate, info.total_samples);
        debug!("bitrate={}", self.bitrate);

        self.metadata_changed = true;
    }
}

impl fmt::Debug for CallbackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackInfo")
            .field("bound", &self.is_bound())
            .field("output", &self.output)
            .field("frame", &self.frame)
            .field("stream", &self.stream)
            .field("bitrate", &self.bitrate)
            .field("metadata_changed", &self.metadata_changed)
            .finish()
    }
}

/// Average bitrate `8 * size * sample_rate / total_samples`, truncated.
///
/// Returns 0 when the byte size or the sample count is unknown. The product
/// is formed in 128 bits and the result saturates at `u32::MAX`.
pub fn average_bitrate(size: Option<u64>, sample_rate: u32, total_samples: u64) -> u32 {
    match size {
        Some(size) if total_samples > 0 => {
            let bits = 8u128 * size as u128 * sample_rate as u128;
            (bits / total_samples as u128).min(u32::MAX as u128) as u32
        }
        _ => 0,
    }
}

impl StreamDecoderCallbacks for CallbackInfo {
    fn read(&mut self, buffer: &mut [u8]) -> ReadStatus {
        let Some(file) = self.file.as_mut() else {
            error!("Trying to read data from an uninitialized file!");
            return ReadStatus::Abort(FlacError::FileNotBound);
        };

        if buffer.is_empty() {
            return ReadStatus::EndOfStream;
        }

        match file.read(buffer) {
            Err(e) => {
                error!("Error while reading from stream: {}", e);
                ReadStatus::Abort(FlacError::Read(e))
            }
            Ok(0) => {
                debug!("Stream reached EOF");
                ReadStatus::EndOfStream
            }
            Ok(read) => ReadStatus::Continue(read),
        }
    }

    fn seek(&mut self, offset: u64) -> SeekStatus {
        let Some(file) = self.file.as_mut() else {
            error!("Trying to seek an uninitialized file!");
            return SeekStatus::Error(FlacError::FileNotBound);
        };

        match file.seek(SeekFrom::Start(offset)) {
            Ok(_) => SeekStatus::Ok,
            Err(source) => {
                error!(offset, "Could not seek to {}: {}", offset, source);
                SeekStatus::Error(FlacError::Seek { offset, source })
            }
        }
    }

    fn tell(&mut self) -> TellStatus {
        let Some(file) = self.file.as_mut() else {
            error!("Trying to tell position of an uninitialized file!");
            return TellStatus::Error(FlacError::FileNotBound);
        };

        match file.tell() {
            Ok(offset) => {
                debug!("Current position: {}", offset);
                TellStatus::Ok(offset)
            }
            Err(e) => {
                error!("Could not tell current position: {}", e);
                TellStatus::Error(FlacError::Tell(e))
            }
        }
    }

    fn eof(&mut self) -> bool {
        match self.file.as_mut() {
            Some(file) => file.eof(),
            None => true,
        }
    }

    fn length(&mut self) -> LengthStatus {
        // A stream without a fixed size is not an error (think streaming audio)
        match self.file.as_mut().and_then(|file| file.size()) {
            Some(length) => {
                debug!("Stream length is {} bytes", length);
                LengthStatus::Ok(length)
            }
            None => {
                debug!("Stream length is unknown");
                LengthStatus::Unsupported
            }
        }
    }

    fn write_frame(&mut self, header: &FrameHeader, channels: &[&[i32]]) -> WriteStatus {
        let requested = header.total_samples();

        // The buffer is sized for the largest legal frame, so this is a sizing bug.
        if let Err(e) = self.output.reserve_exact(requested) {
            error!("BUG! Too much data decoded from stream: {}", e);
            return WriteStatus::Abort(e);
        }

        if !is_supported_bits_per_sample(header.bits_per_sample) {
            error!(
                "Unsupported bits per sample found in stream: {}!",
                header.bits_per_sample
            );
            return WriteStatus::Abort(FlacError::UnsupportedBitsPerSample(
                header.bits_per_sample,
            ));
        }

        let blocksize = header.blocksize as usize;
        let planes = &channels[..channels.len().min(header.channels as usize)];
        if planes.len() < header.channels as usize
            || planes.iter().any(|plane| plane.len() < blocksize)
        {
            error!(
                "Engine delivered {} channel buffers for a {}x{} frame",
                channels.len(),
                header.channels,
                blocksize
            );
            return WriteStatus::Abort(FlacError::Decoder(
                "frame buffers shorter than frame header".to_string(),
            ));
        }

        self.frame = FrameFormat {
            channels: header.channels,
            sample_rate: header.sample_rate,
            bits_per_sample: header.bits_per_sample,
        };

        for sample in 0..blocksize {
            for plane in planes {
                if let Err(e) = self.output.write_sample(plane[sample]) {
                    return WriteStatus::Abort(e);
                }
            }
        }

        WriteStatus::Continue
    }

    fn metadata(&mut self, block: &MetadataBlock) {
        if let MetadataBlock::StreamInfo(info) = block {
            self.apply_stream_info(info);
        }
    }

    fn error(&mut self, status: DecoderErrorStatus) {
        error!(
            code = status.code(),
            "FLAC decoder error callback was called: {}", status
        );
    }
}
