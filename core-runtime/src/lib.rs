//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the FLAC decoding crates:
//! - Logging and tracing setup
//!
//! ## Overview
//!
//! Binaries and tests call [`logging::init_logging`] once at startup; library
//! crates only emit `tracing` events and never install a subscriber.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
