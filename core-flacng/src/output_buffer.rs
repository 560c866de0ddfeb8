//! # Output Buffer for Decoded Samples
//!
//! Fixed-capacity flat buffer the frame-write callback interleaves into and
//! the outer playback loop drains after every decode step.
//!
//! ## Design
//!
//! - **Capacity**: fixed at creation, never grows
//! - **Overflow policy**: writes past capacity are rejected, never truncated
//!   or wrapped
//! - **Accounting**: `used() + free() == capacity()` at all times
//!
//! ## Usage
//!
//! ```rust
//! use core_flacng::OutputBuffer;
//!
//! let mut buffer = OutputBuffer::new(4);
//! buffer.write_sample(10).unwrap();
//! buffer.write_sample(-10).unwrap();
//! assert_eq!(buffer.samples(), &[10, -10]);
//! assert_eq!(buffer.free(), 2);
//!
//! // Outer loop: take the samples and start over.
//! let drained = buffer.drain();
//! assert_eq!(drained, vec![10, -10]);
//! assert_eq!(buffer.used(), 0);
//! ```

use crate::error::{FlacError, Result};

/// Bounded writer for interleaved decoded samples.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    buffer: Vec<i32>,
    capacity: usize,
}

impl OutputBuffer {
    /// Create an empty buffer holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one sample at the write cursor.
    ///
    /// Fails with [`FlacError::OutputOverflow`] when the buffer is full; the
    /// buffer is left untouched in that case.
    pub fn write_sample(&mut self, value: i32) -> Result<()> {
        if self.free() == 0 {
            return Err(FlacError::OutputOverflow {
                requested: 1,
                free: 0,
            });
        }

        self.buffer.push(value);
        Ok(())
    }

    /// Ensure `count` more samples fit, without writing anything.
    pub fn reserve_exact(&self, count: usize) -> Result<()> {
        if count > self.free() {
            return Err(FlacError::OutputOverflow {
                requested: count,
                free: self.free(),
            });
        }
        Ok(())
    }

    /// Samples that can still be written.
    pub fn free(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    /// Alias of [`free`](Self::free) matching the writer vocabulary.
    pub fn remaining_capacity(&self) -> usize {
        self.free()
    }

    /// Samples written since the last reset.
    pub fn used(&self) -> usize {
        self.buffer.len()
    }

    /// Total capacity in samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples written since the last reset, in write order.
    pub fn samples(&self) -> &[i32] {
        &self.buffer
    }

    /// Returns `true` if no samples have been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns `true` if no more samples fit.
    pub fn is_full(&self) -> bool {
        self.free() == 0
    }

    /// Rewind the write cursor, restoring full capacity.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Take the written samples and reset the buffer.
    ///
    /// The returned vector is sized to the samples it holds; the buffer keeps
    /// its own allocation for the next frame.
    pub fn drain(&mut self) -> Vec<i32> {
        self.buffer.drain(..).collect()
    }
}
