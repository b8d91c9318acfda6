//! The seek-and-capture primitive and its scoped resource handle.
//!
//! A [`FrameSource`] exposes exactly one playback position at a time:
//! [`seek_to`](FrameSource::seek_to) blocks until the position is confirmed,
//! and only then may [`capture_frame`](FrameSource::capture_frame) read the
//! raster at that position. There is no way to capture two positions
//! concurrently from one source.
//!
//! [`MediaResource`] owns a boxed source for as long as a session needs it
//! and releases it exactly once, either explicitly or on drop.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use image::RgbImage;

use crate::error::ExtractionError;
use crate::metadata::SourceMetadata;

/// A single decode stream that can be positioned and read.
///
/// [`MediaFile`](crate::MediaFile) implements this over FFmpeg; tests and
/// other decoders can provide their own.
pub trait FrameSource: Send {
    /// Report duration and native dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::MetadataUnavailable`] when the stream
    /// cannot describe itself.
    fn metadata(&self) -> Result<SourceMetadata, ExtractionError>;

    /// Move the stream to `timestamp` seconds and return once the position
    /// is confirmed.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Seek`] if the position cannot be reached.
    fn seek_to(&mut self, timestamp: f64) -> Result<(), ExtractionError>;

    /// Read the raster at the current position, at native dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if no frame is available at the current position.
    fn capture_frame(&mut self) -> Result<RgbImage, ExtractionError>;

    /// Free decoder state. Called exactly once by [`MediaResource`].
    fn release(&mut self) {}
}

/// Scoped ownership of a [`FrameSource`].
///
/// Created by the sampler, handed to the session, and released when the
/// session is cleared or replaced. Release happens at most once; later
/// calls and the eventual drop are no-ops.
pub struct MediaResource {
    source: Option<Box<dyn FrameSource>>,
    label: String,
}

impl Debug for MediaResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaResource")
            .field("label", &self.label)
            .field("released", &self.is_released())
            .finish()
    }
}

impl MediaResource {
    /// Take ownership of `source`. `label` names it in log output.
    pub fn new(source: impl FrameSource + 'static, label: impl Into<String>) -> Self {
        let label = label.into();
        log::debug!("Acquired media resource: {label}");
        Self {
            source: Some(Box::new(source)),
            label,
        }
    }

    /// Whether the underlying source has been released.
    pub fn is_released(&self) -> bool {
        self.source.is_none()
    }

    /// The name this resource was acquired under.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Borrow the source for seeking and capturing.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::ResourceReleased`] after release.
    pub fn source_mut(&mut self) -> Result<&mut (dyn FrameSource + 'static), ExtractionError> {
        self.source
            .as_deref_mut()
            .ok_or(ExtractionError::ResourceReleased)
    }

    /// Release the source now instead of waiting for drop.
    pub fn release(mut self) {
        self.release_source();
    }

    fn release_source(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release();
            log::debug!("Released media resource: {}", self.label);
        }
    }
}

impl Drop for MediaResource {
    fn drop(&mut self) {
        self.release_source();
    }
}
