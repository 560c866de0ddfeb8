//! # Decoder Callback Protocol
//!
//! The fixed contract between a FLAC decoding engine and the code that feeds
//! it bytes and receives its output. The engine drives every call; the
//! implementor only reacts.
//!
//! Each callback returns a closed status type with one variant per outcome the
//! engine understands. Failure variants carry a [`FlacError`] so the outer
//! loop can branch on [`FlacError::category`] instead of parsing log text.

use crate::error::FlacError;
use std::fmt::{self, Display, Formatter};

// ============================================================================
// Callback Statuses
// ============================================================================

/// Outcome of a read request.
#[derive(Debug)]
pub enum ReadStatus {
    /// `n > 0` bytes were placed at the start of the buffer. Partial reads
    /// are valid; the engine asks again for the rest.
    Continue(usize),
    /// No bytes were obtained and none will follow.
    EndOfStream,
    /// Reading failed; the engine must stop.
    Abort(FlacError),
}

impl ReadStatus {
    /// Bytes obtained by this read (0 unless `Continue`).
    pub fn bytes_read(&self) -> usize {
        match self {
            ReadStatus::Continue(n) => *n,
            _ => 0,
        }
    }
}

/// Outcome of a seek request.
#[derive(Debug)]
pub enum SeekStatus {
    /// The file is positioned at the requested offset.
    Ok,
    /// The underlying seek failed.
    Error(FlacError),
}

/// Outcome of a position query.
#[derive(Debug)]
pub enum TellStatus {
    /// Current absolute byte offset.
    Ok(u64),
    /// Position could not be determined.
    Error(FlacError),
}

/// Outcome of a length query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthStatus {
    /// Total stream size in bytes.
    Ok(u64),
    /// Size is not known (e.g. a live stream). Not an error.
    Unsupported,
}

impl LengthStatus {
    /// Reported length; 0 when the size is unknown.
    pub fn length(&self) -> u64 {
        match self {
            LengthStatus::Ok(len) => *len,
            LengthStatus::Unsupported => 0,
        }
    }
}

/// Outcome of delivering one decoded frame.
#[derive(Debug)]
pub enum WriteStatus {
    /// Frame consumed; keep decoding.
    Continue,
    /// Frame rejected; the whole decode operation must stop.
    Abort(FlacError),
}

// ============================================================================
// Frames and Metadata
// ============================================================================

/// Header of a decoded frame as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Samples per channel in this frame
    pub blocksize: u32,
    /// Number of channels
    pub channels: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bits per sample
    pub bits_per_sample: u32,
}

impl FrameHeader {
    /// Total number of samples the frame carries across all channels.
    pub fn total_samples(&self) -> usize {
        self.blocksize as usize * self.channels as usize
    }
}

/// Contents of the STREAMINFO metadata block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamInfo {
    /// Minimum block size in samples (0 if not reported)
    pub min_blocksize: u32,
    /// Maximum block size in samples (0 if not reported)
    pub max_blocksize: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u32,
    /// Bits per sample
    pub bits_per_sample: u32,
    /// Samples per channel in the stream, 0 if unknown
    pub total_samples: u64,
    /// MD5 of the unencoded audio, if present
    pub md5: Option<[u8; 16]>,
}

/// A metadata block delivered by the engine.
///
/// Only STREAMINFO is interpreted by this layer; the other block kinds are
/// listed so implementors can match exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataBlock {
    StreamInfo(StreamInfo),
    Padding,
    Application,
    SeekTable,
    VorbisComment,
    CueSheet,
    Picture,
    /// Block type not known to this layer.
    Unknown(u8),
}

/// Error conditions the engine reports through the error callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderErrorStatus {
    LostSync,
    BadHeader,
    FrameCrcMismatch,
    UnparseableStream,
    BadMetadata,
    OutOfBounds,
}

impl DecoderErrorStatus {
    /// Numeric code used by libFLAC for the same condition.
    pub fn code(&self) -> u32 {
        match self {
            DecoderErrorStatus::LostSync => 0,
            DecoderErrorStatus::BadHeader => 1,
            DecoderErrorStatus::FrameCrcMismatch => 2,
            DecoderErrorStatus::UnparseableStream => 3,
            DecoderErrorStatus::BadMetadata => 4,
            DecoderErrorStatus::OutOfBounds => 5,
        }
    }
}

impl Display for DecoderErrorStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::LostSync => write!(f, "An error in the stream caused the decoder to lose synchronization."),
            Self::BadHeader => write!(f, "The decoder encountered a corrupted frame header."),
            Self::FrameCrcMismatch => write!(f, "The frame's data did not match the CRC in the footer."),
            Self::UnparseableStream => write!(f, "The decoder encountered reserved fields in use in the stream."),
            Self::BadMetadata => write!(f, "The decoder encountered a corrupted metadata block."),
            Self::OutOfBounds => write!(f, "The decoded samples exceeded the range offered by the stated bit depth."),
        }
    }
}

// ============================================================================
// Callback Trait
// ============================================================================

/// Callbacks a FLAC decoding engine invokes while decoding one stream.
///
/// Calls are synchronous and non-reentrant: they happen on the thread that
/// entered the engine, strictly nested inside that call.
pub trait StreamDecoderCallbacks {
    /// Fill `buffer` from the byte stream. An empty buffer is a degenerate
    /// request and yields [`ReadStatus::EndOfStream`].
    fn read(&mut self, buffer: &mut [u8]) -> ReadStatus;

    /// Position the byte stream at an absolute offset.
    fn seek(&mut self, offset: u64) -> SeekStatus;

    /// Report the current absolute byte offset.
    fn tell(&mut self) -> TellStatus;

    /// Whether the byte stream is exhausted.
    fn eof(&mut self) -> bool;

    /// Report the total stream size.
    fn length(&mut self) -> LengthStatus;

    /// Receive one decoded frame as planar channel buffers, each holding
    /// `header.blocksize` samples.
    fn write_frame(&mut self, header: &FrameHeader, channels: &[&[i32]]) -> WriteStatus;

    /// Receive a parsed metadata block.
    fn metadata(&mut self, block: &MetadataBlock);

    /// Receive a recoverable error the engine ran into.
    fn error(&mut self, status: DecoderErrorStatus);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_status_reports_zero_when_unknown() {
        assert_eq!(LengthStatus::Unsupported.length(), 0);
        assert_eq!(LengthStatus::Ok(512).length(), 512);
    }

    #[test]
    fn read_status_byte_count() {
        assert_eq!(ReadStatus::Continue(12).bytes_read(), 12);
        assert_eq!(ReadStatus::EndOfStream.bytes_read(), 0);
        assert_eq!(ReadStatus::Abort(FlacError::FileNotBound).bytes_read(), 0);
    }

    #[test]
    fn frame_header_sample_count() {
        let header = FrameHeader {
            blocksize: 4096,
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
        };
        assert_eq!(header.total_samples(), 8192);
    }

    #[test]
    fn decoder_error_codes_follow_libflac() {
        assert_eq!(DecoderErrorStatus::LostSync.code(), 0);
        assert_eq!(DecoderErrorStatus::FrameCrcMismatch.code(), 2);
        assert!(DecoderErrorStatus::BadHeader
            .to_string()
            .contains("corrupted frame header"));
    }
}
