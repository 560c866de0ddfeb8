//! # Symphonia FLAC Engine
//!
//! Drives a [`StreamDecoderCallbacks`] implementation with symphonia's FLAC
//! demuxer and decoder, the way libFLAC's stream decoder drives its client.

use crate::config::DecoderConfig;
use crate::decoder::frame_header::read_frame_format;
use crate::decoder::media_source::{CallbackMediaSource, Shared};
use crate::error::{FlacError, Result};
use crate::protocol::{
    DecoderErrorStatus, FrameHeader, LengthStatus, MetadataBlock, StreamDecoderCallbacks,
    StreamInfo, WriteStatus,
};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::sync::Arc;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{CodecParameters, Decoder, DecoderOptions, VerificationCheck};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia_bundle_flac::{FlacDecoder, FlacReader};
use tracing::{debug, error, info, instrument, warn};

/// Result of one call to [`FlacStreamDecoder::process_single_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStep {
    /// A frame was delivered to `write_frame`.
    Frame(FrameHeader),
    /// The stream is exhausted.
    EndOfStream,
}

/// Demuxer and codec state, present once metadata has been processed.
struct EngineSession {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    bits_per_sample: u32,
    total_samples: u64,

    /// Timestamp the next frame should start at; a later one means frames
    /// were dropped by the demuxer.
    next_ts: u64,
}

/// FLAC stream decoder that talks to its byte stream and its output only
/// through callbacks.
///
/// ## State Management
///
/// - Metadata is processed lazily on the first frame request, or explicitly
///   via [`process_until_end_of_metadata`](Self::process_until_end_of_metadata)
/// - An `Abort` from any callback leaves the decoder aborted until the next
///   successful seek
/// - The callbacks are shared with the media source; borrow them between
///   decode calls with [`callbacks`](Self::callbacks)
pub struct FlacStreamDecoder<C> {
    shared: Arc<Mutex<Shared<C>>>,
    config: DecoderConfig,
    session: Option<EngineSession>,

    /// Leading samples to drop after an accurate seek
    skip_samples: u64,

    consecutive_errors: usize,
    end_of_stream: bool,
    aborted: bool,
}

impl<C> FlacStreamDecoder<C>
where
    C: StreamDecoderCallbacks + Send + 'static,
{
    /// Create a decoder around `callbacks`. No I/O happens until metadata is
    /// processed.
    pub fn new(callbacks: C, config: DecoderConfig) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared::new(callbacks))),
            config,
            session: None,
            skip_samples: 0,
            consecutive_errors: 0,
            end_of_stream: false,
            aborted: false,
        }
    }

    /// Borrow the callbacks. Must not be held across decode calls.
    pub fn callbacks(&self) -> MappedMutexGuard<'_, C> {
        MutexGuard::map(self.shared.lock(), |shared| &mut shared.callbacks)
    }

    /// Tear down the engine and return the callbacks.
    pub fn into_callbacks(mut self) -> Result<C> {
        // The media source inside the reader holds the other reference.
        self.session = None;
        match Arc::try_unwrap(self.shared) {
            Ok(shared) => Ok(shared.into_inner().callbacks),
            Err(_) => Err(FlacError::Decoder(
                "callbacks are still shared with the media source".to_string(),
            )),
        }
    }

    /// Returns `true` once the last frame has been delivered.
    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// Read the stream header and deliver STREAMINFO to the metadata callback.
    #[instrument(skip(self))]
    pub fn process_until_end_of_metadata(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        if self.aborted {
            return Err(FlacError::Aborted);
        }

        let source = CallbackMediaSource::new(self.shared.clone());
        let mss = MediaSourceStream::new(Box::new(source), MediaSourceStreamOptions::default());

        let reader = FlacReader::try_new(mss, &FormatOptions::default()).map_err(|e| {
            let err = map_engine_error(&self.shared, e);
            error!("Failed to open FLAC stream: {}", err);
            err
        })?;

        let track = reader
            .default_track()
            .ok_or_else(|| FlacError::InvalidStream("no audio track".to_string()))?;
        let track_id = track.id;
        let params = track.codec_params.clone();

        let stream_info = stream_info_from_params(&params)?;
        debug!(
            "STREAMINFO: {}Hz, {} channels, {} bits, {} samples",
            stream_info.sample_rate,
            stream_info.channels,
            stream_info.bits_per_sample,
            stream_info.total_samples
        );

        let options = DecoderOptions {
            verify: self.config.verify_md5,
        };
        let decoder = FlacDecoder::try_new(&params, &options).map_err(|e| {
            error!("Failed to create FLAC decoder: {}", e);
            FlacError::Decoder(format!("Failed to create codec decoder: {}", e))
        })?;

        self.shared
            .lock()
            .callbacks
            .metadata(&MetadataBlock::StreamInfo(stream_info));

        self.session = Some(EngineSession {
            reader: Box::new(reader),
            decoder: Box::new(decoder),
            track_id,
            bits_per_sample: stream_info.bits_per_sample,
            total_samples: stream_info.total_samples,
            next_ts: 0,
        });

        info!("FLAC decoder initialized");
        Ok(())
    }

    /// Decode the next frame and deliver it to the write callback.
    ///
    /// Undecodable frames are reported through the error callback and
    /// skipped, up to `max_consecutive_errors` in a row. Frames the demuxer
    /// dropped for a bad checksum are detected from the gap they leave in
    /// the sample numbering and count against the same budget.
    #[instrument(skip(self), level = "trace")]
    pub fn process_single_frame(&mut self) -> Result<DecodeStep> {
        if self.aborted {
            return Err(FlacError::Aborted);
        }
        if self.session.is_none() {
            self.process_until_end_of_metadata()?;
        }
        if self.end_of_stream {
            return Ok(DecodeStep::EndOfStream);
        }

        let session = self.session.as_mut().ok_or(FlacError::NotInitialized)?;

        loop {
            let packet = match session.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    if let Some(abort) = self.shared.lock().take_abort() {
                        self.aborted = true;
                        return Err(abort);
                    }
                    debug!("Stream reached EOF");
                    if session.total_samples > session.next_ts {
                        let missing = session.total_samples - session.next_ts;
                        report_lost_samples(&self.shared, missing);
                    }
                    if let Some(false) = session.decoder.finalize().verify_ok {
                        warn!("Decoded audio does not match the STREAMINFO MD5");
                    }
                    self.end_of_stream = true;
                    return Ok(DecodeStep::EndOfStream);
                }
                Err(SymphoniaError::DecodeError(msg)) => {
                    report_decode_error(&self.shared, msg);
                    self.consecutive_errors += 1;
                    check_error_budget(self.consecutive_errors, &self.config)?;
                    continue;
                }
                Err(e) => {
                    self.aborted = true;
                    return Err(map_engine_error(&self.shared, e));
                }
            };

            if packet.track_id() != session.track_id {
                continue;
            }

            // The demuxer drops frames failing their CRC and resyncs silently.
            if packet.ts() > session.next_ts {
                let missing = packet.ts() - session.next_ts;
                let lost = missing.div_ceil(packet.dur().max(1)) as usize;
                report_lost_samples(&self.shared, missing);
                self.consecutive_errors += lost;
                check_error_budget(self.consecutive_errors, &self.config)?;
            }
            session.next_ts = packet.ts() + packet.dur();

            let declared = read_frame_format(packet.buf()).unwrap_or_default();

            let decoded = match session.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(msg)) => {
                    report_decode_error(&self.shared, msg);
                    self.consecutive_errors += 1;
                    check_error_budget(self.consecutive_errors, &self.config)?;
                    continue;
                }
                Err(e) => {
                    self.aborted = true;
                    return Err(map_engine_error(&self.shared, e));
                }
            };

            let AudioBufferRef::S32(buf) = decoded else {
                self.aborted = true;
                return Err(FlacError::Decoder(
                    "FLAC decoder produced a non-32-bit sample buffer".to_string(),
                ));
            };

            let frames = buf.frames();
            let skip = self.skip_samples.min(frames as u64) as usize;
            self.skip_samples -= skip as u64;
            if skip == frames {
                continue;
            }

            let bits_per_sample = declared
                .bits_per_sample
                .unwrap_or(session.bits_per_sample);

            // Samples arrive scaled to 32 bits; restore the native width.
            let shift = 32 - bits_per_sample.clamp(1, 32);
            let spec = *buf.spec();
            let planes: Vec<Vec<i32>> = (0..spec.channels.count())
                .map(|ch| buf.chan(ch)[skip..].iter().map(|&s| s >> shift).collect())
                .collect();

            let header = FrameHeader {
                blocksize: (frames - skip) as u32,
                channels: planes.len() as u32,
                sample_rate: declared.sample_rate.unwrap_or(spec.rate),
                bits_per_sample,
            };

            let refs: Vec<&[i32]> = planes.iter().map(Vec::as_slice).collect();
            let status = self.shared.lock().callbacks.write_frame(&header, &refs);

            return match status {
                WriteStatus::Continue => {
                    self.consecutive_errors = 0;
                    Ok(DecodeStep::Frame(header))
                }
                WriteStatus::Abort(e) => {
                    self.aborted = true;
                    Err(e)
                }
            };
        }
    }

    /// Decode frames until the end of the stream.
    pub fn process_until_end_of_stream(&mut self) -> Result<()> {
        while let DecodeStep::Frame(_) = self.process_single_frame()? {}
        Ok(())
    }

    /// Position the decoder so the next frame starts at `sample`.
    ///
    /// Streams of unknown length cannot be sought. A successful seek clears a
    /// previous abort.
    #[instrument(skip(self))]
    pub fn seek_absolute(&mut self, sample: u64) -> Result<()> {
        if self.session.is_none() {
            self.aborted = false;
            self.process_until_end_of_metadata()?;
        }
        if self.shared.lock().callbacks.length() == LengthStatus::Unsupported {
            error!("Cannot seek to sample {} in a stream of unknown length", sample);
            return Err(FlacError::Decoder(format!(
                "Cannot seek to sample {}: stream length is unknown",
                sample
            )));
        }

        let session = self.session.as_mut().ok_or(FlacError::NotInitialized)?;

        let seeked = session
            .reader
            .seek(
                SeekMode::Accurate,
                SeekTo::TimeStamp {
                    ts: sample,
                    track_id: session.track_id,
                },
            )
            .map_err(|e| {
                let err = match self.shared.lock().take_abort() {
                    Some(abort) => abort,
                    None => FlacError::Decoder(format!("Seek to sample {} failed: {}", sample, e)),
                };
                error!("Seek to sample {} failed: {}", sample, err);
                err
            })?;

        session.decoder.reset();
        session.next_ts = seeked.actual_ts;
        self.skip_samples = seeked.required_ts.saturating_sub(seeked.actual_ts);
        self.consecutive_errors = 0;
        self.end_of_stream = false;
        self.aborted = false;

        debug!(
            "Seeked to sample {} (frame starts at {})",
            seeked.required_ts, seeked.actual_ts
        );
        Ok(())
    }
}

fn stream_info_from_params(params: &CodecParameters) -> Result<StreamInfo> {
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| FlacError::InvalidStream("missing sample rate".to_string()))?;
    let channels = params
        .channels
        .map(|channels| channels.count() as u32)
        .ok_or_else(|| FlacError::InvalidStream("missing channel layout".to_string()))?;
    let bits_per_sample = params
        .bits_per_sample
        .ok_or_else(|| FlacError::InvalidStream("missing bits per sample".to_string()))?;

    let md5 = match params.verification_check {
        Some(VerificationCheck::Md5(md5)) if md5 != [0u8; 16] => Some(md5),
        _ => None,
    };

    Ok(StreamInfo {
        min_blocksize: 0,
        max_blocksize: params.max_frames_per_packet.unwrap_or(0) as u32,
        sample_rate,
        channels,
        bits_per_sample,
        total_samples: params.n_frames.unwrap_or(0),
        md5,
    })
}

/// Prefer the error a callback aborted with over symphonia's wrapper of it.
fn map_engine_error<C>(shared: &Mutex<Shared<C>>, error: SymphoniaError) -> FlacError {
    if let Some(abort) = shared.lock().take_abort() {
        return abort;
    }

    match error {
        SymphoniaError::IoError(e) => FlacError::Read(e),
        SymphoniaError::DecodeError(msg) | SymphoniaError::Unsupported(msg) => {
            FlacError::InvalidStream(msg.to_string())
        }
        other => FlacError::Decoder(other.to_string()),
    }
}

fn report_lost_samples<C: StreamDecoderCallbacks>(shared: &Mutex<Shared<C>>, missing: u64) {
    warn!("Lost {} samples to frames that failed their checksum", missing);
    shared
        .lock()
        .callbacks
        .error(DecoderErrorStatus::FrameCrcMismatch);
}

fn report_decode_error<C: StreamDecoderCallbacks>(shared: &Mutex<Shared<C>>, msg: &str) {
    let status = error_status_for(msg);
    warn!("Skipping undecodable frame: {}", msg);
    shared.lock().callbacks.error(status);
}

fn check_error_budget(consecutive: usize, config: &DecoderConfig) -> Result<()> {
    if consecutive >= config.max_consecutive_errors {
        error!("Too many consecutive decode errors, giving up");
        return Err(FlacError::Decoder(format!(
            "Decoder failure after {} undecodable frames",
            consecutive
        )));
    }
    Ok(())
}

/// Classify a symphonia decode error message.
fn error_status_for(msg: &str) -> DecoderErrorStatus {
    let msg = msg.to_ascii_lowercase();
    if msg.contains("crc") {
        DecoderErrorStatus::FrameCrcMismatch
    } else if msg.contains("sync") {
        DecoderErrorStatus::LostSync
    } else if msg.contains("header") {
        DecoderErrorStatus::BadHeader
    } else if msg.contains("metadata") {
        DecoderErrorStatus::BadMetadata
    } else {
        DecoderErrorStatus::UnparseableStream
    }
}
