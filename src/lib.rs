//! Workspace facade crate.
//!
//! This crate exposes shared feature flags that map to the individual
//! workspace crates (`core-flacng`, `core-runtime`). Host applications can
//! depend on `flacng-workspace` and enable the documented features without
//! needing to wire each crate individually.

#[cfg(any(feature = "decoder-flac", feature = "callbacks-only"))]
pub use core_flacng as flacng;

#[cfg(feature = "logging")]
pub use core_runtime::logging;
