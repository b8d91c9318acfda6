//! Sampling and extraction configuration.
//!
//! [`SamplingOptions`] describes *what* to sample: the desired cadence, the
//! hard frame budget, and the thumbnail quality. All three are required;
//! the core assumes no defaults.
//!
//! [`ExtractionConfig`] is a builder that threads progress callbacks and
//! cancellation tokens through the sampler without polluting every function
//! signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use scenecut::{
//!     CancellationToken, ExtractionConfig, ProgressCallback, ProgressInfo, SamplingOptions,
//! };
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {}/{}", info.operation, info.current, info.total);
//!     }
//! }
//!
//! let options = SamplingOptions::new(1.0, 60, 0.8);
//! let config = ExtractionConfig::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(CancellationToken::new())
//!     .with_batch_size(5);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::error::ExtractionError;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// What to sample from a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingOptions {
    /// Desired spacing between scenes, in seconds.
    pub interval_seconds: f64,
    /// Hard ceiling on the number of scenes.
    pub max_frames: u32,
    /// Thumbnail compression quality in `(0.0, 1.0]`.
    pub quality: f32,
}

impl SamplingOptions {
    /// Create sampling options. Call [`validate`](SamplingOptions::validate)
    /// (the sampler does) before relying on the values.
    pub fn new(interval_seconds: f64, max_frames: u32, quality: f32) -> Self {
        Self {
            interval_seconds,
            max_frames,
            quality,
        }
    }

    /// Check that every option is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidOptions`] for a non-positive or
    /// non-finite interval, a zero frame budget, or a quality outside
    /// `(0.0, 1.0]`.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        if !self.interval_seconds.is_finite() || self.interval_seconds <= 0.0 {
            return Err(ExtractionError::InvalidOptions(format!(
                "interval must be a positive number of seconds, got {}",
                self.interval_seconds
            )));
        }
        if self.max_frames == 0 {
            return Err(ExtractionError::InvalidOptions(
                "max_frames must be greater than zero".to_string(),
            ));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(ExtractionError::InvalidOptions(format!(
                "quality must be in (0.0, 1.0], got {}",
                self.quality
            )));
        }
        Ok(())
    }

    /// The JPEG quality (1–100) corresponding to [`quality`](SamplingOptions::quality).
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Operational settings for an extraction.
///
/// All fields have defaults: no progress callback, no cancellation, and a
/// progress report after every captured frame.
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
}

impl Debug for ExtractionConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractionConfig")
            .field("has_progress", &true)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled the sampler stops before its next seek
    /// and returns [`ExtractionError::Cancelled`].
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to at least 1.
    ///
    /// The final frame always reports regardless of the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
