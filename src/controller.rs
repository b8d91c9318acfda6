//! Session lifecycle and analysis orchestration.
//!
//! [`SessionController`] holds at most one active [`ExtractionSession`]. It
//! runs extractions, hands out [`AnalysisTask`]s, and applies their results.
//!
//! Every task carries the id of the session it was dispatched for. Results
//! are applied only if that id still names the active session, so clearing
//! a session or starting a new extraction makes every outstanding result a
//! no-op without needing to cancel the analyzer.
//!
//! # Example
//!
//! ```no_run
//! use scenecut::{
//!     AnalyzerError, ExtractionConfig, MediaFile, SamplingOptions, SceneAnalysis,
//!     SessionController, SourceFile, Thumbnail,
//! };
//!
//! let mut controller = SessionController::new();
//! let media = MediaFile::open("reel.mp4")?;
//! controller.extract(
//!     SourceFile::from_path("reel.mp4")?,
//!     media,
//!     &SamplingOptions::new(1.0, 60, 0.8),
//!     &ExtractionConfig::new(),
//! )?;
//!
//! let analyzer = |_: &Thumbnail| -> Result<SceneAnalysis, AnalyzerError> {
//!     Ok(SceneAnalysis::new("a frame", ["tag"]))
//! };
//! let summary = controller.run_analysis(&analyzer)?;
//! println!("{} completed, {} failed", summary.completed, summary.failed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;

use crate::{
    analyzer::SceneAnalyzer,
    configuration::{ExtractionConfig, SamplingOptions},
    error::{AnalyzerError, ExtractionError, SessionError},
    metadata::SourceFile,
    progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker},
    sampler::FrameSampler,
    scene::{SceneAnalysis, SceneId, SceneStatus, Thumbnail},
    session::{AnalysisStatus, ExtractionSession, ExtractionStatus, SessionId},
    source::FrameSource,
};

/// One scene's worth of analyzer work, tagged with its session.
#[derive(Debug, Clone)]
pub struct AnalysisTask {
    /// Session the task was dispatched for.
    pub session_id: SessionId,
    /// Scene to update.
    pub scene_id: SceneId,
    /// 0-based position of the scene in the catalog.
    pub index: usize,
    /// 1-based scene number, for reporting.
    pub scene_number: u32,
    /// The frame to analyze.
    pub thumbnail: Thumbnail,
}

/// Whether a result was applied or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The active session was updated.
    Applied,
    /// The task belonged to a superseded session, or the batch was no
    /// longer running; nothing changed.
    Discarded,
}

/// Counts at the end of an analysis batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisSummary {
    /// Session that was analyzed.
    pub session_id: SessionId,
    /// Scenes with a completed analysis.
    pub completed: usize,
    /// Scenes whose analyzer call failed.
    pub failed: usize,
    /// Total scenes in the session.
    pub total: usize,
    /// Session-level status after the batch.
    pub status: AnalysisStatus,
}

/// Owns the active session and mediates between sampler, analyzer, and catalog.
pub struct SessionController {
    active: Option<ExtractionSession>,
    extraction_status: ExtractionStatus,
    progress: Arc<dyn ProgressCallback>,
    analysis_tracker: Option<ProgressTracker>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("active", &self.active.as_ref().map(ExtractionSession::id))
            .field("extraction_status", &self.extraction_status)
            .finish_non_exhaustive()
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    /// Create a controller with no session.
    pub fn new() -> Self {
        Self {
            active: None,
            extraction_status: ExtractionStatus::Idle,
            progress: Arc::new(NoOpProgress),
            analysis_tracker: None,
        }
    }

    /// Receive a progress notification after every applied analysis result.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// The active session, if any.
    pub fn session(&self) -> Option<&ExtractionSession> {
        self.active.as_ref()
    }

    /// Mutable access to the active session, e.g. to change selections.
    pub fn session_mut(&mut self) -> Option<&mut ExtractionSession> {
        self.active.as_mut()
    }

    /// Status of the most recent extraction attempt.
    pub fn extraction_status(&self) -> ExtractionStatus {
        self.extraction_status
    }

    /// Analysis status of the active session, `Idle` without one.
    pub fn analysis_status(&self) -> AnalysisStatus {
        self.active
            .as_ref()
            .map_or(AnalysisStatus::Idle, ExtractionSession::analysis_status)
    }

    /// Sample `source` into a new session, replacing any active one.
    ///
    /// The previous session is released before sampling starts. On failure
    /// no session is published and the extraction status becomes `Error`.
    ///
    /// # Errors
    ///
    /// Propagates the sampler's [`ExtractionError`].
    pub fn extract<S>(
        &mut self,
        file: SourceFile,
        source: S,
        options: &SamplingOptions,
        config: &ExtractionConfig,
    ) -> Result<&ExtractionSession, ExtractionError>
    where
        S: FrameSource + 'static,
    {
        self.clear();
        self.extraction_status = ExtractionStatus::Extracting;
        log::debug!("Extracting scenes from {}", file.name);

        match FrameSampler::new(*options).sample(source, config) {
            Ok(sampled) => {
                let session = ExtractionSession::new(file, sampled);
                log::info!(
                    "Session {} created with {} scene(s)",
                    session.id(),
                    session.total_scenes()
                );
                self.extraction_status = ExtractionStatus::Extracted;
                Ok(self.active.insert(session))
            }
            Err(error) => {
                log::warn!("Extraction of {} failed: {error}", file.name);
                self.extraction_status = ExtractionStatus::Error;
                Err(error)
            }
        }
    }

    /// Publish an already-built session, replacing any active one.
    pub fn adopt(&mut self, session: ExtractionSession) -> &ExtractionSession {
        self.clear();
        self.extraction_status = session.extraction_status();
        self.active.insert(session)
    }

    /// Release and drop the active session. Outstanding analysis results
    /// for it will be discarded.
    pub fn clear(&mut self) {
        if let Some(session) = self.active.take() {
            session.close();
        }
        self.analysis_tracker = None;
        self.extraction_status = ExtractionStatus::Idle;
    }

    /// Start an analysis batch and return the work to dispatch.
    ///
    /// Only scenes not yet completed get a task, so calling this again after
    /// a batch with failures retries just the failures. If nothing is left
    /// to analyze the session completes immediately.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NoActiveSession`] without a session.
    /// - [`SessionError::NotExtracted`] if extraction has not succeeded.
    /// - [`SessionError::AnalysisInProgress`] while a batch is running.
    pub fn begin_analysis(&mut self) -> Result<Vec<AnalysisTask>, SessionError> {
        let session = self
            .active
            .as_mut()
            .ok_or(SessionError::NoActiveSession)?;

        if session.extraction_status != ExtractionStatus::Extracted {
            return Err(SessionError::NotExtracted(session.extraction_status));
        }
        if session.analysis_status == AnalysisStatus::Analyzing {
            return Err(SessionError::AnalysisInProgress);
        }

        session.catalog.reset_incomplete();
        session.analysis_status = AnalysisStatus::Analyzing;
        session.refresh_progress();

        let tasks: Vec<AnalysisTask> = session
            .catalog
            .iter()
            .enumerate()
            .filter(|(_, scene)| scene.analysis_status != SceneStatus::Completed)
            .map(|(index, scene)| AnalysisTask {
                session_id: session.id,
                scene_id: scene.id,
                index,
                scene_number: scene.scene_number,
                thumbnail: scene.thumbnail.clone(),
            })
            .collect();

        log::info!(
            "Analyzing {} of {} scene(s) in session {}",
            tasks.len(),
            session.total_scenes,
            session.id
        );

        self.analysis_tracker = Some(
            ProgressTracker::new(
                self.progress.clone(),
                OperationType::SceneAnalysis,
                session.total_scenes as u64,
                1,
            )
            .with_session(session.id),
        );

        if tasks.is_empty() {
            session.analysis_status = AnalysisStatus::Completed;
            self.analysis_tracker = None;
        }

        Ok(tasks)
    }

    /// Mark a task's scene as in flight.
    pub fn mark_analyzing(&mut self, task: &AnalysisTask) -> TaskOutcome {
        match self.running_session(task.session_id) {
            Some(session) => {
                session.catalog.mark_analyzing(task.index);
                TaskOutcome::Applied
            }
            None => TaskOutcome::Discarded,
        }
    }

    /// Apply an analyzer result for `task`.
    ///
    /// A failure marks only the task's scene as failed. When the last scene
    /// settles, the session's analysis status becomes `Completed`, even if
    /// some scenes failed. Results for a superseded session, arriving
    /// after the batch stopped, or for a scene that already settled are
    /// discarded.
    pub fn complete_task(
        &mut self,
        task: &AnalysisTask,
        result: Result<SceneAnalysis, AnalyzerError>,
    ) -> TaskOutcome {
        let Some(session) = self.running_session(task.session_id) else {
            log::debug!(
                "Discarding result for scene {} of superseded session {}",
                task.scene_number,
                task.session_id
            );
            return TaskOutcome::Discarded;
        };

        let already_settled = session
            .catalog
            .get(&task.scene_id)
            .is_none_or(|scene| scene.analysis_status.is_settled());
        if already_settled {
            log::debug!(
                "Discarding duplicate result for settled scene {}",
                task.scene_number
            );
            return TaskOutcome::Discarded;
        }

        match result {
            Ok(analysis) => {
                session.catalog.apply_analysis(&task.scene_id, analysis);
            }
            Err(error) => {
                log::warn!("Analysis of scene {} failed: {error}", task.scene_number);
                session.catalog.mark_error(&task.scene_id);
            }
        }

        session.refresh_progress();
        let current = session.analysis_progress.current;
        let settled = session.catalog.all_settled();
        if settled {
            session.analysis_status = AnalysisStatus::Completed;
            log::info!(
                "Analysis of session {} completed ({} ok, {} failed)",
                session.id,
                session.catalog.completed_count(),
                session.catalog.failed_count()
            );
        }

        if let Some(tracker) = self.analysis_tracker.as_mut() {
            tracker.report_at(current, Some(task.scene_number));
        }
        if settled {
            self.analysis_tracker = None;
        }

        TaskOutcome::Applied
    }

    /// Fail the running batch for `session_id` as a whole.
    ///
    /// Returns the [`SessionError::AnalysisFailed`] to hand back to the
    /// caller. Has no effect on the session if it is no longer active.
    pub fn fail_analysis(&mut self, session_id: SessionId, reason: impl Into<String>) -> SessionError {
        let reason = reason.into();
        if let Some(session) = self.running_session(session_id) {
            log::warn!("Analysis of session {session_id} failed: {reason}");
            session.analysis_status = AnalysisStatus::Error;
            self.analysis_tracker = None;
        }
        SessionError::AnalysisFailed { reason }
    }

    /// Analyze every pending scene, one at a time, with `analyzer`.
    ///
    /// # Errors
    ///
    /// - Any error from [`begin_analysis`](SessionController::begin_analysis).
    /// - [`SessionError::AnalysisFailed`] if the analyzer's
    ///   [`prepare`](SceneAnalyzer::prepare) fails; the session's analysis
    ///   status becomes `Error`.
    pub fn run_analysis<A>(&mut self, analyzer: &A) -> Result<AnalysisSummary, SessionError>
    where
        A: SceneAnalyzer + ?Sized,
    {
        let tasks = self.begin_analysis()?;
        let Some(session_id) = self.session().map(ExtractionSession::id) else {
            return Err(SessionError::NoActiveSession);
        };

        if !tasks.is_empty() {
            if let Err(error) = analyzer.prepare() {
                return Err(self.fail_analysis(session_id, error.to_string()));
            }
        }

        for task in &tasks {
            self.mark_analyzing(task);
            let result = analyzer.analyze(&task.thumbnail);
            self.complete_task(task, result);
        }

        self.summary()
    }

    /// Current counts for the active session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveSession`] without a session.
    pub fn summary(&self) -> Result<AnalysisSummary, SessionError> {
        let session = self.active.as_ref().ok_or(SessionError::NoActiveSession)?;
        Ok(AnalysisSummary {
            session_id: session.id,
            completed: session.catalog.completed_count(),
            failed: session.catalog.failed_count(),
            total: session.total_scenes,
            status: session.analysis_status,
        })
    }

    /// The active session, if it is `session_id` and currently analyzing.
    fn running_session(&mut self, session_id: SessionId) -> Option<&mut ExtractionSession> {
        self.active
            .as_mut()
            .filter(|session| session.id == session_id)
            .filter(|session| session.analysis_status == AnalysisStatus::Analyzing)
    }
}
