//! The lifecycle record of one extraction.
//!
//! An [`ExtractionSession`] exists only after a successful extraction. It
//! exclusively owns the [`MediaResource`] the scenes were captured from and
//! releases it when the session is closed or dropped.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    catalog::SceneCatalog, metadata::SourceFile, progress::percentage, sampler::SampledFrames,
    source::MediaResource,
};

/// Unique identifier of a session. Also serves as the generation tag that
/// in-flight analysis tasks are checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Extraction lifecycle. `Extracted` and `Error` are terminal; a new
/// extraction always creates a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    /// Nothing has been extracted.
    #[default]
    Idle,
    /// Sampling is running.
    Extracting,
    /// Sampling succeeded and a session exists.
    Extracted,
    /// Sampling failed.
    Error,
}

impl Display for ExtractionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            ExtractionStatus::Idle => "idle",
            ExtractionStatus::Extracting => "extracting",
            ExtractionStatus::Extracted => "extracted",
            ExtractionStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// Session-level analysis lifecycle, distinct from per-scene status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Analysis has not been started.
    #[default]
    Idle,
    /// A batch is running.
    Analyzing,
    /// Every scene settled, whether it succeeded or failed.
    Completed,
    /// The batch itself failed.
    Error,
}

impl Display for AnalysisStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            AnalysisStatus::Idle => "idle",
            AnalysisStatus::Analyzing => "analyzing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// Aggregate analysis progress.
///
/// `current` counts completed scenes only; failed scenes settle the batch
/// but do not advance it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisProgress {
    /// Scenes whose analysis completed.
    pub current: u64,
    /// Total scenes in the session.
    pub total: u64,
    /// `round(100 * current / total)`.
    pub percentage: u8,
}

impl AnalysisProgress {
    pub(crate) fn new(current: u64, total: u64) -> Self {
        Self {
            current,
            total,
            percentage: percentage(current, total),
        }
    }
}

/// Source metadata, ordered scenes, and status of one extraction.
#[derive(Debug)]
pub struct ExtractionSession {
    pub(crate) id: SessionId,
    pub(crate) source: SourceFile,
    pub(crate) duration: f64,
    pub(crate) resource: MediaResource,
    pub(crate) catalog: SceneCatalog,
    pub(crate) total_scenes: usize,
    pub(crate) extraction_status: ExtractionStatus,
    pub(crate) analysis_status: AnalysisStatus,
    pub(crate) analysis_progress: AnalysisProgress,
}

impl ExtractionSession {
    /// Build a session from a successful sampling run.
    pub fn new(source: SourceFile, sampled: SampledFrames) -> Self {
        let total_scenes = sampled.scenes.len();
        Self {
            id: SessionId::new(),
            source,
            duration: sampled.duration,
            resource: sampled.resource,
            catalog: SceneCatalog::new(sampled.scenes),
            total_scenes,
            extraction_status: ExtractionStatus::Extracted,
            analysis_status: AnalysisStatus::Idle,
            analysis_progress: AnalysisProgress::new(0, total_scenes as u64),
        }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The uploaded file this session was extracted from.
    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    /// Source duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// The scene catalog.
    pub fn catalog(&self) -> &SceneCatalog {
        &self.catalog
    }

    /// Mutable access for selection changes.
    pub fn catalog_mut(&mut self) -> &mut SceneCatalog {
        &mut self.catalog
    }

    /// Number of scenes, fixed at creation.
    pub fn total_scenes(&self) -> usize {
        self.total_scenes
    }

    /// Always [`ExtractionStatus::Extracted`] for a published session.
    pub fn extraction_status(&self) -> ExtractionStatus {
        self.extraction_status
    }

    /// Session-level analysis status.
    pub fn analysis_status(&self) -> AnalysisStatus {
        self.analysis_status
    }

    /// Aggregate analysis progress.
    pub fn analysis_progress(&self) -> AnalysisProgress {
        self.analysis_progress
    }

    /// The media resource the scenes were captured from.
    pub fn resource(&self) -> &MediaResource {
        &self.resource
    }

    /// Recompute progress from the catalog. `current` only ever grows
    /// because completed scenes never revert.
    pub(crate) fn refresh_progress(&mut self) {
        self.analysis_progress = AnalysisProgress::new(
            self.catalog.completed_count() as u64,
            self.total_scenes as u64,
        );
    }

    /// Release the media resource and discard the session.
    pub fn close(self) {
        log::debug!("Closing session {}", self.id);
        self.resource.release();
    }
}
