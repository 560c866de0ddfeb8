//! # FLAC Decode Example
//!
//! Decodes a FLAC file through a `DecodeSession` and prints what the outer
//! playback loop would see.
//!
//! Run with: `cargo run --example decode_file --package core-flacng -- <file.flac> [seek-sample]`

use core_flacng::{DecodeSession, DecoderConfig, FlacError, LocalFile, Result};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::env;
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("usage: decode_file <file.flac> [seek-sample]");
        std::process::exit(2);
    };
    let seek_to = args.get(2).and_then(|s| s.parse::<u64>().ok());

    let level = env::var("FLACNG_LOG")
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LogLevel::Info);
    if let Err(e) = init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(level),
    ) {
        eprintln!("logging disabled: {}", e);
    }

    let file = LocalFile::open(path).map_err(FlacError::Read)?;
    let mut session = DecodeSession::open(Box::new(file), DecoderConfig::default())?;

    let stream = session.stream_format();
    let name = Path::new(path).file_name().unwrap_or(OsStr::new(path));
    println!("File:        {}", name.to_string_lossy());
    println!("Channels:    {}", stream.channels);
    println!("Sample rate: {} Hz", stream.sample_rate);
    println!("Bit depth:   {} bits", stream.bits_per_sample);
    println!("Samples:     {}", stream.total_samples);
    match session.bitrate() {
        0 => println!("Bitrate:     unknown"),
        bitrate => println!("Bitrate:     {} kbps", bitrate / 1000),
    }

    if session.take_metadata_changed() {
        println!("(stream format published to the output)");
    }

    if let Some(sample) = seek_to {
        session.seek(sample)?;
        println!("Seeked to sample {}", sample);
    }

    let mut chunks = 0usize;
    let mut frames = 0usize;
    let mut duration = Duration::ZERO;
    let mut peak = 0i64;

    while let Some(chunk) = session.next_chunk()? {
        chunks += 1;
        frames += chunk.frames();
        duration += chunk.duration();
        if let Some(max) = chunk.samples.iter().map(|&s| (s as i64).abs()).max() {
            peak = peak.max(max);
        }
    }

    println!();
    println!("Decoded {} frames in {} chunks ({:.2}s)", frames, chunks, duration.as_secs_f64());
    println!("Peak sample magnitude: {}", peak);

    Ok(())
}
