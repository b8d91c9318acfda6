//! Interval-based frame sampling.
//!
//! [`SamplingPlan`] turns a duration and [`SamplingOptions`] into the list
//! of capture timestamps. When the desired cadence would exceed the frame
//! budget the interval is stretched to `duration / max_frames`, so the
//! whole source is still covered instead of truncating the tail.
//!
//! [`FrameSampler`] walks that plan against a single [`FrameSource`]:
//! seek, wait for the seek to be confirmed, capture, compress, repeat. The
//! loop is strictly sequential because the source has one playback
//! position.

use std::io::Cursor;

use image::{RgbImage, codecs::jpeg::JpegEncoder};

use crate::{
    configuration::{ExtractionConfig, SamplingOptions},
    error::ExtractionError,
    progress::{OperationType, ProgressTracker},
    scene::{Scene, Thumbnail},
    source::{FrameSource, MediaResource},
};

/// Capture schedule derived from a duration and sampling options.
///
/// # Example
///
/// ```
/// use scenecut::{SamplingOptions, SamplingPlan};
///
/// let plan = SamplingPlan::compute(90.0, &SamplingOptions::new(1.0, 60, 0.8)).unwrap();
/// assert_eq!(plan.total_frames, 60);
/// assert_eq!(plan.adjusted_interval, 1.5);
/// assert_eq!(plan.timestamps().last(), Some(88.5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingPlan {
    /// Source duration in seconds.
    pub duration: f64,
    /// Frames the requested interval alone would produce, `ceil(duration / interval)`.
    pub natural_count: u64,
    /// Spacing actually used between captures.
    pub adjusted_interval: f64,
    /// Number of captures scheduled, `min(natural_count, max_frames)`.
    pub total_frames: u32,
}

impl SamplingPlan {
    /// Compute the schedule for a source of `duration` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidOptions`] for out-of-range options
    /// and [`ExtractionError::MetadataUnavailable`] for a zero, negative, or
    /// non-finite duration.
    pub fn compute(duration: f64, options: &SamplingOptions) -> Result<Self, ExtractionError> {
        options.validate()?;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ExtractionError::MetadataUnavailable(format!(
                "duration must be positive, got {duration}"
            )));
        }

        let natural_count = (duration / options.interval_seconds).ceil() as u64;
        let max_frames = u64::from(options.max_frames);

        let (adjusted_interval, total_frames) = if natural_count > max_frames {
            (duration / f64::from(options.max_frames), options.max_frames)
        } else {
            // natural_count <= max_frames, which fits in u32.
            (options.interval_seconds, natural_count as u32)
        };

        Ok(Self {
            duration,
            natural_count,
            adjusted_interval,
            total_frames,
        })
    }

    /// Capture timestamps in order. Stops early if float rounding would
    /// place a timestamp at or past the end of the source.
    pub fn timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.total_frames)
            .map(|index| f64::from(index) * self.adjusted_interval)
            .take_while(|&timestamp| timestamp < self.duration)
    }
}

/// Result of a successful sampling run.
///
/// The caller owns [`resource`](SampledFrames::resource) and is responsible
/// for releasing it (dropping it is enough).
#[derive(Debug)]
pub struct SampledFrames {
    /// Captured scenes in capture order.
    pub scenes: Vec<Scene>,
    /// Source duration in seconds.
    pub duration: f64,
    /// The schedule that was executed.
    pub plan: SamplingPlan,
    /// The still-open media resource.
    pub resource: MediaResource,
}

/// Samples a [`FrameSource`] at regular intervals.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    options: SamplingOptions,
}

impl FrameSampler {
    /// Create a sampler with the given options.
    pub fn new(options: SamplingOptions) -> Self {
        Self { options }
    }

    /// The options this sampler was created with.
    pub fn options(&self) -> &SamplingOptions {
        &self.options
    }

    /// Sample `source` according to the options.
    ///
    /// The source is wrapped in a [`MediaResource`] immediately. On any
    /// error it is released before this method returns; on success it is
    /// handed to the caller inside [`SampledFrames`].
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::InvalidOptions`] / [`ExtractionError::MetadataUnavailable`]
    ///   before any frame is captured.
    /// - [`ExtractionError::Capture`] if a seek or capture fails mid-loop;
    ///   `frames_captured` reports how far the loop got.
    /// - [`ExtractionError::Encode`] if a frame cannot be compressed.
    /// - [`ExtractionError::Cancelled`] if the config's token is cancelled.
    pub fn sample<S>(
        &self,
        source: S,
        config: &ExtractionConfig,
    ) -> Result<SampledFrames, ExtractionError>
    where
        S: FrameSource + 'static,
    {
        self.sample_resource(MediaResource::new(source, "frame source"), config)
    }

    /// Like [`sample`](FrameSampler::sample), for a source that is already
    /// wrapped in a [`MediaResource`].
    ///
    /// # Errors
    ///
    /// See [`sample`](FrameSampler::sample).
    pub fn sample_resource(
        &self,
        mut resource: MediaResource,
        config: &ExtractionConfig,
    ) -> Result<SampledFrames, ExtractionError> {
        let source = resource.source_mut()?;
        let metadata = source.metadata()?;
        let plan = SamplingPlan::compute(metadata.duration, &self.options)?;
        let jpeg_quality = self.options.jpeg_quality();

        log::debug!(
            "Sampling {:.3}s every {:.3}s ({} frame(s), natural count {})",
            plan.duration,
            plan.adjusted_interval,
            plan.total_frames,
            plan.natural_count,
        );

        let timestamps: Vec<f64> = plan.timestamps().collect();
        let mut tracker = ProgressTracker::new(
            config.progress.clone(),
            OperationType::FrameExtraction,
            timestamps.len() as u64,
            config.batch_size,
        );
        let mut scenes = Vec::with_capacity(timestamps.len());

        for (index, timestamp) in timestamps.into_iter().enumerate() {
            let scene_number = index as u32 + 1;

            if config.is_cancelled() {
                return Err(ExtractionError::Cancelled {
                    frames_captured: scenes.len(),
                });
            }

            let capture_error = move |error: ExtractionError| ExtractionError::Capture {
                scene_number,
                timestamp,
                frames_captured: index,
                reason: error.to_string(),
            };

            source.seek_to(timestamp).map_err(capture_error)?;
            let raster = source.capture_frame().map_err(capture_error)?;
            let thumbnail = encode_thumbnail(&raster, jpeg_quality).map_err(|reason| {
                ExtractionError::Encode {
                    scene_number,
                    reason,
                }
            })?;

            log::debug!(
                "Captured scene {scene_number} at {timestamp:.3}s ({} bytes)",
                thumbnail.data.len()
            );

            scenes.push(Scene::new(scene_number, timestamp, thumbnail));
            tracker.advance(Some(scene_number), Some(timestamp));
        }

        log::info!(
            "Extracted {} scene(s) from {:.3}s of video",
            scenes.len(),
            plan.duration
        );

        Ok(SampledFrames {
            scenes,
            duration: plan.duration,
            plan,
            resource,
        })
    }
}

/// Compress a raster to JPEG at its own dimensions.
fn encode_thumbnail(raster: &RgbImage, quality: u8) -> Result<Thumbnail, String> {
    let mut data = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut data), quality);
        encoder
            .encode_image(raster)
            .map_err(|error| error.to_string())?;
    }

    Ok(Thumbnail {
        data,
        width: raster.width(),
        height: raster.height(),
    })
}
