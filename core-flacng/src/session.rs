//! # Decode Session
//!
//! The outer loop around [`FlacStreamDecoder`]: one session per open stream.
//! Each step resets the output buffer, decodes a single frame and hands the
//! interleaved samples to the caller.

use crate::callback_info::CallbackInfo;
use crate::config::DecoderConfig;
use crate::decoder::{DecodeStep, FlacStreamDecoder};
use crate::error::{FlacError, Result};
use crate::format::{FrameFormat, StreamFormat};
use crate::vfs::VirtualFile;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Interleaved samples of one decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmChunk {
    /// Samples ordered channel-then-sample
    pub samples: Vec<i32>,
    /// Layout of `samples`
    pub format: FrameFormat,
}

impl PcmChunk {
    /// Samples per channel.
    pub fn frames(&self) -> usize {
        if self.format.channels == 0 {
            return 0;
        }
        self.samples.len() / self.format.channels as usize
    }

    /// Playback duration of the chunk.
    pub fn duration(&self) -> Duration {
        if self.format.sample_rate == 0 {
            return Duration::ZERO;
        }
        let nanos = self.frames() as u128 * 1_000_000_000 / self.format.sample_rate as u128;
        Duration::from_nanos(nanos as u64)
    }
}

/// A FLAC stream opened for decoding.
pub struct DecodeSession {
    decoder: FlacStreamDecoder<CallbackInfo>,
}

impl DecodeSession {
    /// Bind `file`, read its metadata and get ready to decode.
    #[instrument(skip(file, config))]
    pub fn open(file: Box<dyn VirtualFile>, config: DecoderConfig) -> Result<Self> {
        config.validate().map_err(FlacError::Config)?;

        let info = CallbackInfo::with_file(file, config.output_capacity);
        let mut decoder = FlacStreamDecoder::new(info, config);
        decoder.process_until_end_of_metadata()?;

        {
            let info = decoder.callbacks();
            info!(
                "Opened FLAC stream: {}Hz, {} channels, {} bits, {} samples, {} bps",
                info.stream.sample_rate,
                info.stream.channels,
                info.stream.bits_per_sample,
                info.stream.total_samples,
                info.bitrate
            );
        }

        Ok(Self { decoder })
    }

    /// Stream format taken from STREAMINFO.
    pub fn stream_format(&self) -> StreamFormat {
        self.decoder.callbacks().stream
    }

    /// Average bitrate in bits per second, 0 if unknown.
    pub fn bitrate(&self) -> u32 {
        self.decoder.callbacks().bitrate
    }

    /// Returns whether new stream metadata arrived since the last call, and
    /// clears the flag.
    pub fn take_metadata_changed(&mut self) -> bool {
        std::mem::take(&mut self.decoder.callbacks().metadata_changed)
    }

    /// Decode the next frame. Returns `None` at end of stream.
    pub fn next_chunk(&mut self) -> Result<Option<PcmChunk>> {
        self.decoder.callbacks().output_mut().reset();

        match self.decoder.process_single_frame()? {
            DecodeStep::EndOfStream => {
                debug!("End of stream");
                Ok(None)
            }
            DecodeStep::Frame(_) => {
                let mut info = self.decoder.callbacks();
                let format = info.frame;
                if !info.stream.matches(&format) {
                    warn!(
                        "Frame format {:?} differs from stream format {:?}",
                        format, info.stream
                    );
                }

                let samples = info.output_mut().drain();
                Ok(Some(PcmChunk { samples, format }))
            }
        }
    }

    /// Continue decoding at `sample` (per channel).
    pub fn seek(&mut self, sample: u64) -> Result<()> {
        self.decoder.callbacks().output_mut().reset();
        self.decoder.seek_absolute(sample)
    }

    /// Close the session and release the file handle.
    pub fn close(self) -> Result<Option<Box<dyn VirtualFile>>> {
        let mut info = self.decoder.into_callbacks()?;
        Ok(info.unbind_file())
    }
}
