//! # Stream and Frame Formats
//!
//! Format descriptors recorded by the callback layer: the stream-wide format
//! taken from STREAMINFO, and the format of the most recently written frame.

use serde::{Deserialize, Serialize};

/// Largest block size a FLAC frame may declare.
pub const MAX_BLOCK_SIZE: usize = 65535;

/// Largest channel count a FLAC stream may declare.
pub const MAX_CHANNELS: usize = 8;

/// Bit depths the output path can carry.
pub const SUPPORTED_BITS_PER_SAMPLE: [u32; 4] = [8, 16, 24, 32];

/// Returns `true` if samples of this bit depth can be written to the output.
pub fn is_supported_bits_per_sample(bits_per_sample: u32) -> bool {
    SUPPORTED_BITS_PER_SAMPLE.contains(&bits_per_sample)
}

/// Stream-wide format, populated from STREAMINFO.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFormat {
    /// Number of channels (1 = mono, 2 = stereo, ...)
    pub channels: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bits per sample of the encoded audio
    pub bits_per_sample: u32,
    /// Samples per channel in the whole stream, 0 if unknown
    pub total_samples: u64,
}

impl StreamFormat {
    /// Returns `true` once STREAMINFO has been consumed.
    pub fn is_known(&self) -> bool {
        self.channels > 0 && self.sample_rate > 0
    }

    /// Whether a frame with this format matches the stream format.
    pub fn matches(&self, frame: &FrameFormat) -> bool {
        self.channels == frame.channels
            && self.sample_rate == frame.sample_rate
            && self.bits_per_sample == frame.bits_per_sample
    }
}

/// Format of the last frame written to the output buffer.
///
/// This also describes the layout of the current buffer content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameFormat {
    /// Number of channels in the frame
    pub channels: u32,
    /// Sample rate declared by the frame header
    pub sample_rate: u32,
    /// Bits per sample declared by the frame header
    pub bits_per_sample: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_depths() {
        for bits in [8, 16, 24, 32] {
            assert!(is_supported_bits_per_sample(bits));
        }
        for bits in [0, 4, 12, 20, 31, 33] {
            assert!(!is_supported_bits_per_sample(bits));
        }
    }

    #[test]
    fn stream_format_matching() {
        let stream = StreamFormat {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            total_samples: 1000,
        };
        assert!(stream.is_known());

        let mut frame = FrameFormat {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
        };
        assert!(stream.matches(&frame));

        frame.sample_rate = 48000;
        assert!(!stream.matches(&frame));

        assert!(!StreamFormat::default().is_known());
    }
}
