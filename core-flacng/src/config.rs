//! # Decoder Configuration
//!
//! Configuration for a FLAC decode session.

use crate::format::{MAX_BLOCK_SIZE, MAX_CHANNELS};
use serde::{Deserialize, Serialize};

/// Decode session configuration.
///
/// Controls output buffer sizing and how tolerant the engine is of damaged
/// streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Output buffer capacity in samples (all channels).
    ///
    /// The frame-write callback refuses frames that do not fit, so this must
    /// hold the largest frame the stream can produce.
    ///
    /// Default: `MAX_BLOCK_SIZE * MAX_CHANNELS`, enough for any legal frame.
    #[serde(default = "default_output_capacity")]
    pub output_capacity: usize,

    /// Verify decoded audio against the STREAMINFO MD5 at end of stream.
    ///
    /// Default: false.
    #[serde(default)]
    pub verify_md5: bool,

    /// Number of consecutive undecodable frames before giving up.
    ///
    /// Default: 10.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            output_capacity: default_output_capacity(),
            verify_md5: false,
            max_consecutive_errors: default_max_consecutive_errors(),
        }
    }
}

impl DecoderConfig {
    /// Size the output buffer for a known stream layout.
    pub fn for_stream(max_blocksize: u32, channels: u32) -> Self {
        Self {
            output_capacity: Self::capacity_for(max_blocksize, channels),
            ..Default::default()
        }
    }

    /// Samples needed to hold one frame of `max_blocksize` x `channels`.
    pub fn capacity_for(max_blocksize: u32, channels: u32) -> usize {
        max_blocksize as usize * channels as usize
    }

    /// Enable or disable MD5 verification.
    pub fn with_md5_verification(mut self, verify: bool) -> Self {
        self.verify_md5 = verify;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.output_capacity == 0 {
            return Err("output_capacity must be > 0".to_string());
        }

        if self.output_capacity < MAX_CHANNELS {
            return Err(format!(
                "output_capacity must hold at least one sample of {} channels",
                MAX_CHANNELS
            ));
        }

        if self.max_consecutive_errors == 0 {
            return Err("max_consecutive_errors must be > 0".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_output_capacity() -> usize {
    MAX_BLOCK_SIZE * MAX_CHANNELS
}

fn default_max_consecutive_errors() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecoderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.output_capacity, 65535 * 8);
        assert!(!config.verify_md5);
        assert_eq!(config.max_consecutive_errors, 10);
    }

    #[test]
    fn test_config_validation() {
        let mut config = DecoderConfig::default();

        config.output_capacity = 0;
        assert!(config.validate().is_err());

        config.output_capacity = 4;
        assert!(config.validate().is_err());
        config.output_capacity = 4096;
        assert!(config.validate().is_ok());

        config.max_consecutive_errors = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stream_sized_config() {
        let config = DecoderConfig::for_stream(4608, 2).with_md5_verification(true);
        assert_eq!(config.output_capacity, 9216);
        assert!(config.verify_md5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: DecoderConfig = serde_json::from_str(r#"{ "verify_md5": true }"#).unwrap();
        assert!(config.verify_md5);
        assert_eq!(config.output_capacity, 65535 * 8);
        assert_eq!(config.max_consecutive_errors, 10);

        let json = serde_json::to_string(&config).unwrap();
        let back: DecoderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
