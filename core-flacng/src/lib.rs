//! # FLAC Decoder Callback Layer
//!
//! Adapts a virtual file to the callback contract of a FLAC decoding engine
//! and collects the decoded audio for the playback loop.
//!
//! ## Overview
//!
//! This crate handles:
//! - The callback protocol between engine and client (`protocol`)
//! - Per-stream callback context and adapters (`callback_info`)
//! - Bounded output buffering of interleaved samples (`output_buffer`)
//! - Virtual file handles over memory and local files (`vfs`)
//! - A symphonia-backed engine and decode session (optional, feature-gated)
//!
//! ## Feature Flags
//!
//! - `decoder-flac` (default): engine driver and [`DecodeSession`]. Without
//!   it only the callback adapters are built.

pub mod callback_info;
pub mod config;
pub mod error;
pub mod format;
pub mod output_buffer;
pub mod protocol;
pub mod vfs;

#[cfg(feature = "decoder-flac")]
pub mod decoder;
#[cfg(feature = "decoder-flac")]
pub mod session;

pub use callback_info::{average_bitrate, CallbackInfo};
pub use config::DecoderConfig;
pub use error::{ErrorCategory, FlacError, Result};
pub use format::{
    is_supported_bits_per_sample, FrameFormat, StreamFormat, MAX_BLOCK_SIZE, MAX_CHANNELS,
    SUPPORTED_BITS_PER_SAMPLE,
};
pub use output_buffer::OutputBuffer;
pub use protocol::{
    DecoderErrorStatus, FrameHeader, LengthStatus, MetadataBlock, ReadStatus, SeekStatus,
    StreamDecoderCallbacks, StreamInfo, TellStatus, WriteStatus,
};
pub use vfs::{LocalFile, MemoryFile, VirtualFile};

#[cfg(feature = "decoder-flac")]
pub use decoder::{DecodeStep, FlacStreamDecoder};
#[cfg(feature = "decoder-flac")]
pub use session::{DecodeSession, PcmChunk};
