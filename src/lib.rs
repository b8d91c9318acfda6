//! # scenecut
//!
//! Sample a video into still scenes, describe them with an external
//! analyzer, and export the results.
//!
//! `scenecut` captures frames at a fixed cadence under a hard frame budget,
//! compresses them to JPEG thumbnails, and keeps them in a session that an
//! analyzer can annotate scene by scene. Decoding is powered by FFmpeg via
//! the [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Extract Scenes
//!
//! ```no_run
//! use scenecut::{ExtractionConfig, MediaFile, SamplingOptions, SessionController, SourceFile};
//!
//! let mut controller = SessionController::new();
//! let session = controller
//!     .extract(
//!         SourceFile::from_path("input.mp4").unwrap(),
//!         MediaFile::open("input.mp4").unwrap(),
//!         &SamplingOptions::new(1.0, 60, 0.8),
//!         &ExtractionConfig::new(),
//!     )
//!     .unwrap();
//! println!("{} scenes", session.total_scenes());
//! ```
//!
//! ### Analyze and Export
//!
//! ```no_run
//! use scenecut::{CommandAnalyzer, ExportService, SessionController};
//!
//! # fn example(controller: &mut SessionController) -> Result<(), scenecut::SceneCutError> {
//! controller.run_analysis(&CommandAnalyzer::new("describe-frame"))?;
//!
//! if let Some(session) = controller.session() {
//!     ExportService::new().export_tsv(session.catalog(), "out", session.source().stem())?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Budgeted sampling**: the interval stretches to `duration / max_frames`
//!   when the requested cadence would exceed the budget
//! - **Frame-accurate capture**: seeks to the nearest keyframe, then decodes
//!   forward until the target time is reached
//! - **Isolated analyzer failures**: one failed scene never aborts a batch
//! - **Stale result protection**: results for a cleared or replaced session
//!   are discarded
//! - **Exports**: per-scene JPEG files, a BOM-prefixed TSV report, and a
//!   single ZIP archive
//! - **Persistence**: a JSON file store behind the [`SessionStore`] trait
//! - **Progress & cancellation**: callbacks and a [`CancellationToken`]
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `run_analysis_async` with bounded concurrency and per-scene timeouts via Tokio |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod analyzer;
#[cfg(feature = "async")]
pub mod async_analysis;
pub mod catalog;
pub mod configuration;
pub mod controller;
pub mod error;
pub mod export;
pub mod media;
pub mod metadata;
pub mod progress;
pub mod sampler;
pub mod scene;
pub mod session;
pub mod source;
pub mod store;
mod utilities;

pub use analyzer::{CommandAnalyzer, SceneAnalyzer};
#[cfg(feature = "async")]
pub use async_analysis::AsyncAnalysisOptions;
pub use catalog::SceneCatalog;
pub use configuration::{ExtractionConfig, SamplingOptions};
pub use controller::{AnalysisSummary, AnalysisTask, SessionController, TaskOutcome};
pub use error::{
    AnalyzerError, ExportError, ExtractionError, SceneCutError, SessionError, StoreError,
};
pub use export::{ExportService, TSV_HEADER, TsvRecord};
pub use media::{FfmpegLogLevel, MediaFile, set_ffmpeg_log_level};
pub use metadata::{SourceFile, SourceMetadata};
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use sampler::{FrameSampler, SampledFrames, SamplingPlan};
pub use scene::{Scene, SceneAnalysis, SceneId, SceneStatus, Thumbnail};
pub use session::{
    AnalysisProgress, AnalysisStatus, ExtractionSession, ExtractionStatus, SessionId,
};
pub use source::{FrameSource, MediaResource};
pub use store::{JsonFileStore, SESSION_LIST_LIMIT, SessionStore, StoredSessionSummary};
pub use utilities::format_timestamp;
