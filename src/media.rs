//! FFmpeg-backed [`FrameSource`].
//!
//! [`MediaFile`] opens a file, caches its [`SourceMetadata`], and keeps one
//! demuxer and one video decoder alive for the lifetime of the resource.
//! Seeking jumps to the nearest keyframe at or before the target and then
//! decodes forward until a frame at the target is available; only then is
//! the seek reported as complete.
//!
//! # Example
//!
//! ```no_run
//! use scenecut::{ExtractionConfig, FrameSampler, MediaFile, SamplingOptions};
//!
//! let media = MediaFile::open("reel.mp4")?;
//! let sampler = FrameSampler::new(SamplingOptions::new(1.0, 60, 0.8));
//! let sampled = sampler.sample(media, &ExtractionConfig::new())?;
//! println!("{} scenes over {:.1}s", sampled.scenes.len(), sampled.duration);
//! # Ok::<(), scenecut::ExtractionError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::log::Level,
};
use image::RgbImage;

use crate::{
    error::ExtractionError,
    metadata::SourceMetadata,
    source::FrameSource,
    utilities::{frame_to_rgb_buffer, pts_to_seconds, seconds_to_av_timestamp},
};

/// FFmpeg internal log verbosity.
///
/// This controls what FFmpeg itself prints to stderr. Rust-side diagnostics
/// go through the `log` crate and are configured separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// Print nothing.
    Quiet,
    /// Only unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Debugging output.
    Debug,
}

/// Set the FFmpeg internal log verbosity level.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    let level = match level {
        FfmpegLogLevel::Quiet => Level::Quiet,
        FfmpegLogLevel::Fatal => Level::Fatal,
        FfmpegLogLevel::Error => Level::Error,
        FfmpegLogLevel::Warning => Level::Warning,
        FfmpegLogLevel::Info => Level::Info,
        FfmpegLogLevel::Debug => Level::Debug,
    };
    ffmpeg_next::util::log::set_level(level);
}

/// Demuxer and decoder state; dropped on release.
struct DecodeState {
    input_context: Input,
    decoder: VideoDecoder,
    stream_index: usize,
    time_base: Rational,
    /// Presentation time of the first frame, subtracted from every PTS.
    start_seconds: f64,
    /// The frame at the last confirmed seek position.
    current_frame: Option<VideoFrame>,
}

/// A video file opened for sampling.
pub struct MediaFile {
    state: Option<DecodeState>,
    metadata: SourceMetadata,
    file_path: PathBuf,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("metadata", &self.metadata)
            .field("file_path", &self.file_path)
            .field("released", &self.state.is_none())
            .finish()
    }
}

impl MediaFile {
    /// Open a media file and prepare its best video stream for decoding.
    ///
    /// Initializes FFmpeg (idempotent), opens the container, locates the
    /// best video stream, and reads duration and native dimensions.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::FileOpen`] if the container cannot be opened.
    /// - [`ExtractionError::NoVideoStream`] if there is no video stream.
    /// - [`ExtractionError::UnsupportedCodec`] if no decoder is available.
    /// - [`ExtractionError::MetadataUnavailable`] if the duration or frame
    ///   size is unknown.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ExtractionError> {
        let file_path = path.as_ref().to_path_buf();

        log::debug!("Opening media file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| ExtractionError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&file_path).map_err(|error| ExtractionError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(ExtractionError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = stream.time_base();

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| ExtractionError::UnsupportedCodec(error.to_string()))?;

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            f64::from(frame_rate.numerator()) / f64::from(frame_rate.denominator())
        } else {
            0.0
        };

        let start_seconds = match stream.start_time() {
            pts if pts != i64::MIN => pts_to_seconds(pts, time_base),
            _ => 0.0,
        };

        // Prefer the container duration; fall back to the stream's own.
        let container_duration = input_context.duration();
        let duration = if container_duration > 0 {
            container_duration as f64 / 1_000_000.0
        } else if stream.duration() > 0 {
            pts_to_seconds(stream.duration(), time_base)
        } else {
            0.0
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = SourceMetadata {
            duration,
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            codec,
        };

        if metadata.width == 0 || metadata.height == 0 {
            return Err(ExtractionError::MetadataUnavailable(format!(
                "video stream reports {}x{} frames",
                metadata.width, metadata.height
            )));
        }

        log::debug!(
            "Opened {}: {:.3}s, {}x{} @ {:.2} fps [{}]",
            file_path.display(),
            metadata.duration,
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.codec,
        );

        Ok(Self {
            state: Some(DecodeState {
                input_context,
                decoder,
                stream_index,
                time_base,
                start_seconds,
                current_frame: None,
            }),
            metadata,
            file_path,
        })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Half a frame period, used as the tolerance for "at the target".
    fn seek_tolerance(&self) -> f64 {
        if self.metadata.frames_per_second > 0.0 {
            0.5 / self.metadata.frames_per_second
        } else {
            0.0
        }
    }
}

impl FrameSource for MediaFile {
    fn metadata(&self) -> Result<SourceMetadata, ExtractionError> {
        if self.metadata.duration > 0.0 && self.metadata.duration.is_finite() {
            Ok(self.metadata.clone())
        } else {
            Err(ExtractionError::MetadataUnavailable(format!(
                "unknown duration for {}",
                self.file_path.display()
            )))
        }
    }

    fn seek_to(&mut self, timestamp: f64) -> Result<(), ExtractionError> {
        let tolerance = self.seek_tolerance();
        let state = self
            .state
            .as_mut()
            .ok_or(ExtractionError::ResourceReleased)?;

        let target = seconds_to_av_timestamp(state.start_seconds + timestamp);
        state
            .input_context
            .seek(target, ..target)
            .map_err(|error| ExtractionError::Seek {
                timestamp,
                reason: error.to_string(),
            })?;
        state.decoder.flush();
        state.current_frame = None;

        let mut decoded_frame = VideoFrame::empty();

        for (stream, packet) in state.input_context.packets() {
            if stream.index() != state.stream_index {
                continue;
            }

            state.decoder.send_packet(&packet)?;

            while state.decoder.receive_frame(&mut decoded_frame).is_ok() {
                let seconds = decoded_frame
                    .timestamp()
                    .map(|pts| pts_to_seconds(pts, state.time_base) - state.start_seconds)
                    .unwrap_or(0.0);

                if seconds + tolerance >= timestamp {
                    log::debug!("Seek to {timestamp:.3}s confirmed at {seconds:.3}s");
                    state.current_frame = Some(decoded_frame);
                    return Ok(());
                }
            }
        }

        // End of stream: the last buffered frame is the closest we can get.
        state.decoder.send_eof()?;
        let mut last_frame = None;
        while state.decoder.receive_frame(&mut decoded_frame).is_ok() {
            last_frame = Some(decoded_frame.clone());
        }

        match last_frame {
            Some(frame) => {
                log::debug!("Seek to {timestamp:.3}s confirmed at end of stream");
                state.current_frame = Some(frame);
                Ok(())
            }
            None => Err(ExtractionError::Seek {
                timestamp,
                reason: "no frame decoded at or after the target".to_string(),
            }),
        }
    }

    fn capture_frame(&mut self) -> Result<RgbImage, ExtractionError> {
        let (width, height) = (self.metadata.width, self.metadata.height);
        let state = self
            .state
            .as_mut()
            .ok_or(ExtractionError::ResourceReleased)?;
        let frame = state.current_frame.as_ref().ok_or_else(|| {
            ExtractionError::Ffmpeg("capture requested before a confirmed seek".to_string())
        })?;

        let mut scaler = ScalingContext::get(
            frame.format(),
            frame.width(),
            frame.height(),
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;
        let mut rgb_frame = VideoFrame::empty();
        scaler.run(frame, &mut rgb_frame)?;

        let buffer = frame_to_rgb_buffer(&rgb_frame, width, height);
        RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            ExtractionError::Ffmpeg(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            log::debug!("Closed decoder for {}", self.file_path.display());
        }
    }
}
