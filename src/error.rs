//! Error types for the `scenecut` crate.
//!
//! Each stage of the pipeline has its own error enum so callers can tell a
//! failed extraction apart from a failed export without string matching:
//!
//! - [`ExtractionError`]: the source could not be opened, decoded, or
//!   sampled. Fatal to the extraction attempt.
//! - [`AnalyzerError`]: one scene could not be analyzed. Isolated to that
//!   scene; never aborts a batch.
//! - [`SessionError`]: a session-level operation was invalid or the
//!   analysis batch itself failed.
//! - [`ExportError`]: writing a scene file, report, or archive failed.
//! - [`StoreError`]: persisting or loading a session failed.
//!
//! [`SceneCutError`] wraps all of them for callers that only need `?`.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;
use zip::result::ZipError;

use crate::session::ExtractionStatus;

/// Failure while opening a source or sampling frames from it.
///
/// No partial session is ever published for an extraction that returns one
/// of these.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractionError {
    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::MediaFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The video stream uses a codec no decoder is available for.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// Duration or frame dimensions could not be determined.
    #[error("Source metadata unavailable: {0}")]
    MetadataUnavailable(String),

    /// The sampling options are out of range.
    #[error("Invalid sampling options: {0}")]
    InvalidOptions(String),

    /// The decode stream could not be positioned at the requested time.
    #[error("Failed to seek to {timestamp:.3}s: {reason}")]
    Seek {
        /// Target position in seconds.
        timestamp: f64,
        /// Underlying reason the seek failed.
        reason: String,
    },

    /// A capture step failed part-way through the sampling loop.
    #[error(
        "Failed to capture scene {scene_number} at {timestamp:.3}s after {frames_captured} frame(s): {reason}"
    )]
    Capture {
        /// 1-based number of the scene being captured.
        scene_number: u32,
        /// Target position in seconds.
        timestamp: f64,
        /// How many frames were captured before the failure.
        frames_captured: usize,
        /// Underlying reason the capture failed.
        reason: String,
    },

    /// A captured raster could not be compressed.
    #[error("Failed to encode scene {scene_number}: {reason}")]
    Encode {
        /// 1-based number of the scene being encoded.
        scene_number: u32,
        /// Underlying encoder message.
        reason: String,
    },

    /// The extraction was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Extraction cancelled after {frames_captured} frame(s)")]
    Cancelled {
        /// How many frames were captured before cancellation was observed.
        frames_captured: usize,
    },

    /// The media resource was used after it had been released.
    #[error("Media resource has already been released")]
    ResourceReleased,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),
}

impl From<FfmpegError> for ExtractionError {
    fn from(error: FfmpegError) -> Self {
        ExtractionError::Ffmpeg(error.to_string())
    }
}

/// Failure reported by a [`SceneAnalyzer`](crate::SceneAnalyzer) for one scene.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum AnalyzerError {
    /// The analyzer ran but reported a failure.
    #[error("Analyzer failed: {0}")]
    Failed(String),

    /// The analyzer answered with something that is not a scene analysis.
    #[error("Invalid analyzer response: {0}")]
    InvalidResponse(String),

    /// The analyzer did not answer within the caller-side time limit.
    #[error("Analyzer timed out after {0:?}")]
    TimedOut(Duration),

    /// The analyzer could not be reached or set up.
    #[error("Analyzer unavailable: {0}")]
    Unavailable(String),
}

/// Invalid session operation, or a failure of the analysis batch itself.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    /// There is no active session to operate on.
    #[error("No active session")]
    NoActiveSession,

    /// Analysis requires a completed extraction.
    #[error("Analysis requires an extracted session (extraction status is {0})")]
    NotExtracted(ExtractionStatus),

    /// An analysis batch is already running for the active session.
    #[error("Analysis is already in progress")]
    AnalysisInProgress,

    /// The batch orchestration failed outside any single scene.
    #[error("Session analysis failed: {reason}")]
    AnalysisFailed {
        /// What went wrong.
        reason: String,
    },
}

/// Failure while writing a scene file, report, or archive.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    /// An I/O error occurred while writing output.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// The ZIP archive could not be written.
    #[error("Archive error: {0}")]
    Archive(#[from] ZipError),

    /// The export was asked to write zero scenes.
    #[error("No scenes to export")]
    NothingToExport,

    /// A TSV report could not be parsed back.
    #[error("Malformed report at line {line}: {reason}")]
    MalformedReport {
        /// 1-based line number in the report.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },
}

/// Failure while persisting or loading a session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// An I/O error occurred in the store's backing directory.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// A session record could not be serialized or parsed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No session with the given identifier exists.
    #[error("Session {0} not found")]
    SessionNotFound(String),
}

/// Union of every error the crate can return.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SceneCutError {
    /// See [`ExtractionError`].
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// See [`AnalyzerError`].
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),

    /// See [`SessionError`].
    #[error(transparent)]
    Session(#[from] SessionError),

    /// See [`ExportError`].
    #[error(transparent)]
    Export(#[from] ExportError),

    /// See [`StoreError`].
    #[error(transparent)]
    Store(#[from] StoreError),
}
