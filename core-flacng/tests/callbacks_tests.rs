//! Tests for the callback adapters through the public API
//!
//! This test suite verifies:
//! - Read/Seek/Tell/Eof/Length over real and mocked virtual files
//! - Frame interleaving and output buffer accounting
//! - STREAMINFO handling and bitrate arithmetic
//! - Error categories surfaced to the outer loop

use core_flacng::{
    CallbackInfo, DecoderErrorStatus, ErrorCategory, FlacError, FrameFormat, FrameHeader,
    LengthStatus, LocalFile, MemoryFile, MetadataBlock, ReadStatus, SeekStatus,
    StreamDecoderCallbacks, StreamInfo, TellStatus, VirtualFile, WriteStatus,
};
use mockall::mock;
use std::io::{self, SeekFrom, Write};

mock! {
    pub Stream {}

    impl VirtualFile for Stream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;
        fn tell(&mut self) -> io::Result<u64>;
        fn size(&mut self) -> Option<u64>;
        fn eof(&mut self) -> bool;
    }
}

fn header(blocksize: u32, channels: u32, bits_per_sample: u32) -> FrameHeader {
    FrameHeader {
        blocksize,
        channels,
        sample_rate: 48000,
        bits_per_sample,
    }
}

fn streaminfo(sample_rate: u32, total_samples: u64) -> MetadataBlock {
    MetadataBlock::StreamInfo(StreamInfo {
        min_blocksize: 4096,
        max_blocksize: 4096,
        sample_rate,
        channels: 2,
        bits_per_sample: 16,
        total_samples,
        md5: None,
    })
}

// ============================================================================
// I/O Adapters
// ============================================================================

#[test]
fn test_reads_whole_memory_file_in_pieces() {
    let data: Vec<u8> = (0..=255).collect();
    let mut info = CallbackInfo::with_file(Box::new(MemoryFile::new(data.clone())), 64);

    let mut collected = Vec::new();
    let mut buf = [0u8; 100];
    loop {
        match info.read(&mut buf) {
            ReadStatus::Continue(n) => {
                assert!(n <= 100);
                collected.extend_from_slice(&buf[..n]);
            }
            ReadStatus::EndOfStream => break,
            ReadStatus::Abort(e) => panic!("unexpected abort: {}", e),
        }
    }

    assert_eq!(collected, data);
    assert!(info.eof());
}

#[test]
fn test_empty_read_skips_the_handle() {
    let mut stream = MockStream::new();
    stream.expect_read().never();

    let mut info = CallbackInfo::with_file(Box::new(stream), 64);
    assert!(matches!(info.read(&mut []), ReadStatus::EndOfStream));
}

#[test]
fn test_unbound_context_is_fatal() {
    let mut info = CallbackInfo::new(64);

    match info.read(&mut [0u8; 4]) {
        ReadStatus::Abort(e) => assert_eq!(e.category(), ErrorCategory::Fatal),
        other => panic!("expected abort, got {:?}", other),
    }
    assert!(info.eof());
    assert_eq!(info.length(), LengthStatus::Unsupported);
}

#[test]
fn test_failed_read_is_stream_io() {
    let mut stream = MockStream::new();
    stream
        .expect_read()
        .returning(|_| Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away")));

    let mut info = CallbackInfo::with_file(Box::new(stream), 64);
    match info.read(&mut [0u8; 16]) {
        ReadStatus::Abort(e) => {
            assert!(e.is_stream_io());
            assert!(e.to_string().contains("peer went away"));
        }
        other => panic!("expected abort, got {:?}", other),
    }
}

#[test]
fn test_seek_and_tell_round_trip_on_local_file() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&[7u8; 1000]).unwrap();
    tmp.flush().unwrap();

    let file = LocalFile::open(tmp.path()).unwrap();
    let mut info = CallbackInfo::with_file(Box::new(file), 64);

    assert!(matches!(info.seek(640), SeekStatus::Ok));
    assert!(matches!(info.tell(), TellStatus::Ok(640)));
    assert_eq!(info.length(), LengthStatus::Ok(1000));
    assert!(!info.eof());

    assert!(matches!(info.seek(1000), SeekStatus::Ok));
    assert!(info.eof());
}

#[test]
fn test_seek_failure_names_the_offset() {
    let mut info = CallbackInfo::with_file(Box::new(MemoryFile::new(vec![0u8; 10])), 64);

    match info.seek(4096) {
        SeekStatus::Error(e) => {
            assert!(e.is_stream_io());
            assert!(e.to_string().starts_with("Could not seek to 4096"));
        }
        SeekStatus::Ok => panic!("seek past the end succeeded"),
    }
}

#[test]
fn test_unknown_length_reports_zero() {
    let mut info = CallbackInfo::with_file(Box::new(MemoryFile::live(vec![0u8; 10])), 64);

    let status = info.length();
    assert_eq!(status, LengthStatus::Unsupported);
    assert_eq!(status.length(), 0);
}

// ============================================================================
// Frame Write Adapter
// ============================================================================

#[test]
fn test_interleaves_two_channels() {
    let mut info = CallbackInfo::new(64);
    let left = [1, 2, 3];
    let right = [-1, -2, -3];

    let free_before = info.output().free();
    let status = info.write_frame(&header(3, 2, 24), &[&left, &right]);

    assert!(matches!(status, WriteStatus::Continue));
    assert_eq!(info.output().samples(), &[1, -1, 2, -2, 3, -3]);
    assert_eq!(info.output().used(), 6);
    assert_eq!(info.output().free(), free_before - 6);
    assert_eq!(
        info.frame,
        FrameFormat {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 24,
        }
    );
}

#[test]
fn test_overflow_leaves_buffer_untouched() {
    let mut info = CallbackInfo::new(8);
    let plane = [9i32; 3];
    assert!(matches!(
        info.write_frame(&header(3, 2, 16), &[&plane, &plane]),
        WriteStatus::Continue
    ));

    let status = info.write_frame(&header(3, 1, 16), &[&plane]);
    match status {
        WriteStatus::Abort(e) => {
            assert!(e.is_fatal());
            assert!(matches!(
                e,
                FlacError::OutputOverflow {
                    requested: 3,
                    free: 2
                }
            ));
        }
        WriteStatus::Continue => panic!("overflowing frame was accepted"),
    }
    assert_eq!(info.output().used(), 6);
}

#[test]
fn test_all_supported_depths_are_accepted() {
    for bits in [8, 16, 24, 32] {
        let mut info = CallbackInfo::new(4);
        let plane = [0i32; 2];
        assert!(matches!(
            info.write_frame(&header(2, 1, bits), &[&plane]),
            WriteStatus::Continue
        ));
    }
}

#[test]
fn test_odd_depths_are_rejected_before_interleaving() {
    for bits in [4, 12, 20] {
        let mut info = CallbackInfo::new(16);
        let plane = [5i32; 4];

        match info.write_frame(&header(4, 1, bits), &[&plane]) {
            WriteStatus::Abort(e) => assert!(e.is_format_error()),
            WriteStatus::Continue => panic!("{} bits accepted", bits),
        }
        assert!(info.output().is_empty());
        assert_eq!(info.frame, FrameFormat::default());
    }
}

// ============================================================================
// Metadata and Error Adapters
// ============================================================================

#[test]
fn test_streaminfo_bitrate_reference_value() {
    let mut stream = MockStream::new();
    stream.expect_size().returning(|| Some(1_000_000));

    let mut info = CallbackInfo::with_file(Box::new(stream), 64);
    info.metadata(&streaminfo(44100, 1_000_000));

    assert_eq!(info.bitrate, 352_800);
    assert!(info.metadata_changed);
    assert_eq!(info.stream.sample_rate, 44100);
    assert_eq!(info.stream.total_samples, 1_000_000);
}

#[test]
fn test_unknown_total_samples_means_unknown_bitrate() {
    let mut info = CallbackInfo::with_file(Box::new(MemoryFile::new(vec![0u8; 4096])), 64);
    info.metadata(&streaminfo(44100, 0));

    assert_eq!(info.bitrate, 0);
    assert!(info.metadata_changed);
}

#[test]
fn test_metadata_flag_stays_set() {
    let mut info = CallbackInfo::with_file(Box::new(MemoryFile::new(vec![0u8; 4096])), 64);
    assert!(!info.metadata_changed);

    info.metadata(&MetadataBlock::VorbisComment);
    assert!(!info.metadata_changed);

    info.metadata(&streaminfo(48000, 48000));
    info.metadata(&MetadataBlock::Padding);
    info.error(DecoderErrorStatus::LostSync);
    assert!(info.metadata_changed);

    // Cleared only by the consumer.
    info.metadata_changed = false;
    info.metadata(&streaminfo(48000, 48000));
    assert!(info.metadata_changed);
}

#[test]
fn test_error_callback_changes_nothing() {
    let mut info = CallbackInfo::with_file(Box::new(MemoryFile::new(vec![1u8; 32])), 64);
    let before = format!("{:?}", info);

    for status in [
        DecoderErrorStatus::LostSync,
        DecoderErrorStatus::BadHeader,
        DecoderErrorStatus::FrameCrcMismatch,
        DecoderErrorStatus::UnparseableStream,
    ] {
        info.error(status);
    }

    assert_eq!(format!("{:?}", info), before);
}
