//! # FLAC Adapter Error Types
//!
//! Error types for the decoder callback layer, grouped by how the outer
//! playback loop is expected to react to them.

use std::io;
use thiserror::Error;

/// Errors that can occur while adapting a virtual file to the FLAC engine.
#[derive(Error, Debug)]
pub enum FlacError {
    // ========================================================================
    // Adapter Bugs
    // ========================================================================
    /// A read was attempted before a file handle was bound.
    #[error("Trying to read data from an uninitialized file")]
    FileNotBound,

    /// The engine decoded more samples than the output buffer can hold.
    #[error("Too much data decoded from stream: {requested} samples, {free} free")]
    OutputOverflow {
        /// Samples the frame needs
        requested: usize,
        /// Samples left in the output buffer
        free: usize,
    },

    // ========================================================================
    // Stream I/O Errors
    // ========================================================================
    /// Reading from the virtual file failed.
    #[error("Error while reading from stream: {0}")]
    Read(#[source] io::Error),

    /// Seeking the virtual file failed.
    #[error("Could not seek to {offset}: {source}")]
    Seek {
        /// Absolute byte offset that was requested
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// The virtual file could not report its position.
    #[error("Could not tell current position: {0}")]
    Tell(#[source] io::Error),

    // ========================================================================
    // Format Errors
    // ========================================================================
    /// Frame uses a bit depth the output path cannot carry.
    #[error("Unsupported bits per sample found in stream: {0}")]
    UnsupportedBitsPerSample(u32),

    /// The byte stream is not a usable FLAC stream.
    #[error("Invalid FLAC stream: {0}")]
    InvalidStream(String),

    // ========================================================================
    // Decoder Errors
    // ========================================================================
    /// The decoding engine failed.
    #[error("Decoder error: {0}")]
    Decoder(String),

    /// A frame was requested before metadata processing.
    #[error("Decoder not initialized")]
    NotInitialized,

    /// A callback aborted the decode and its error was already consumed.
    #[error("Decoding aborted by callback")]
    Aborted,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Decoder configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse grouping of [`FlacError`] for control flow in the outer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Caller bug; unrecoverable for the current stream.
    Fatal,
    /// Failure of the underlying virtual file.
    StreamIo,
    /// Stream data the layer cannot represent.
    Format,
    /// Failure reported by the decoding engine.
    Decoder,
    /// Invalid configuration.
    Config,
}

impl FlacError {
    /// Returns the category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            FlacError::FileNotBound | FlacError::OutputOverflow { .. } => ErrorCategory::Fatal,
            FlacError::Read(_) | FlacError::Seek { .. } | FlacError::Tell(_) => {
                ErrorCategory::StreamIo
            }
            FlacError::UnsupportedBitsPerSample(_) | FlacError::InvalidStream(_) => {
                ErrorCategory::Format
            }
            FlacError::Decoder(_) | FlacError::NotInitialized | FlacError::Aborted => {
                ErrorCategory::Decoder
            }
            FlacError::Config(_) => ErrorCategory::Config,
        }
    }

    /// Returns `true` if this error indicates a bug in the caller.
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Fatal
    }

    /// Returns `true` if this error came from the virtual file.
    pub fn is_stream_io(&self) -> bool {
        self.category() == ErrorCategory::StreamIo
    }

    /// Returns `true` if this error is related to unsupported stream data.
    pub fn is_format_error(&self) -> bool {
        self.category() == ErrorCategory::Format
    }
}

/// Result type for FLAC adapter operations.
pub type Result<T> = std::result::Result<T, FlacError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert!(FlacError::FileNotBound.is_fatal());
        assert!(FlacError::OutputOverflow {
            requested: 10,
            free: 2
        }
        .is_fatal());

        let seek = FlacError::Seek {
            offset: 42,
            source: io::Error::new(io::ErrorKind::InvalidInput, "past end"),
        };
        assert!(seek.is_stream_io());
        assert!(!seek.is_fatal());

        assert!(FlacError::UnsupportedBitsPerSample(20).is_format_error());
        assert_eq!(
            FlacError::Decoder("bad".into()).category(),
            ErrorCategory::Decoder
        );
        assert_eq!(FlacError::Config("x".into()).category(), ErrorCategory::Config);
    }

    #[test]
    fn messages_carry_context() {
        let seek = FlacError::Seek {
            offset: 1234,
            source: io::Error::new(io::ErrorKind::Other, "nope"),
        };
        assert_eq!(seek.to_string(), "Could not seek to 1234: nope");

        let overflow = FlacError::OutputOverflow {
            requested: 8,
            free: 3,
        };
        assert!(overflow.to_string().contains("8 samples, 3 free"));
    }
}
