//! # FLAC Decoding Engine
//!
//! Symphonia-backed engine that drives [`StreamDecoderCallbacks`].
//!
//! ## Architecture
//!
//! The engine sees the byte stream only through the callbacks:
//!
//! ```text
//! CallbackInfo (Read/Seek/Tell/Length)
//!     → CallbackMediaSource → MediaSourceStream → FlacReader → FlacDecoder
//!     → CallbackInfo (WriteFrame → OutputBuffer)
//! ```
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use core_flacng::{CallbackInfo, DecodeStep, DecoderConfig, FlacStreamDecoder, LocalFile};
//!
//! # fn main() -> core_flacng::Result<()> {
//! let config = DecoderConfig::default();
//! let file = LocalFile::open("track.flac").map_err(core_flacng::FlacError::Read)?;
//! let info = CallbackInfo::with_file(Box::new(file), config.output_capacity);
//!
//! let mut decoder = FlacStreamDecoder::new(info, config);
//! decoder.process_until_end_of_metadata()?;
//!
//! while let DecodeStep::Frame(header) = decoder.process_single_frame()? {
//!     let samples = decoder.callbacks().output_mut().drain();
//!     assert_eq!(samples.len(), header.total_samples());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`StreamDecoderCallbacks`]: crate::protocol::StreamDecoderCallbacks

mod engine;
mod frame_header;
mod media_source;

pub use engine::{DecodeStep, FlacStreamDecoder};
