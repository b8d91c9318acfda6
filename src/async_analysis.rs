//! Async analysis driver.
//!
//! [`SessionController::run_analysis_async`] dispatches scenes to a
//! [`SceneAnalyzer`] with bounded concurrency. Each analyzer call runs on a
//! blocking thread via `tokio::task::spawn_blocking`, so slow or CPU-heavy
//! analyzers never stall the runtime, and is wrapped in a caller-side
//! timeout. Results are applied on the calling task, one at a time, so
//! per-scene transitions stay atomic and progress never goes backwards.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use scenecut::{AsyncAnalysisOptions, CommandAnalyzer, SessionController};
//!
//! # async fn example(controller: &mut SessionController) -> Result<(), scenecut::SessionError> {
//! let analyzer = Arc::new(CommandAnalyzer::new("describe-frame"));
//! let options = AsyncAnalysisOptions::new()
//!     .with_concurrency(4)
//!     .with_timeout(Duration::from_secs(30));
//!
//! let summary = controller.run_analysis_async(analyzer, &options).await?;
//! println!("{}/{} scenes described", summary.completed, summary.total);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::{
    analyzer::SceneAnalyzer,
    controller::{AnalysisSummary, AnalysisTask, SessionController},
    error::{AnalyzerError, SessionError},
    scene::SceneAnalysis,
    session::ExtractionSession,
};

/// Default number of analyzer calls in flight.
const DEFAULT_CONCURRENCY: usize = 4;

/// Default per-scene timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for [`SessionController::run_analysis_async`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsyncAnalysisOptions {
    concurrency: usize,
    timeout: Option<Duration>,
}

impl Default for AsyncAnalysisOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncAnalysisOptions {
    /// Four calls in flight, 60 second timeout per scene.
    pub fn new() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Maximum analyzer calls in flight. Clamped to at least 1.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fail a scene with [`AnalyzerError::TimedOut`] if its call takes
    /// longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Wait indefinitely for each analyzer call.
    #[must_use]
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Maximum analyzer calls in flight.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Per-scene timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

type TaskResult = (AnalysisTask, Result<SceneAnalysis, AnalyzerError>);

impl SessionController {
    /// Analyze every pending scene with up to
    /// [`concurrency`](AsyncAnalysisOptions::concurrency) calls in flight.
    ///
    /// Per-scene failures, including timeouts and analyzer panics, mark only
    /// that scene as failed.
    ///
    /// # Errors
    ///
    /// - Any error from [`begin_analysis`](SessionController::begin_analysis).
    /// - [`SessionError::AnalysisFailed`] if the analyzer's
    ///   [`prepare`](SceneAnalyzer::prepare) fails or a dispatch task is
    ///   lost; the session's analysis status becomes `Error`.
    pub async fn run_analysis_async<A>(
        &mut self,
        analyzer: Arc<A>,
        options: &AsyncAnalysisOptions,
    ) -> Result<AnalysisSummary, SessionError>
    where
        A: SceneAnalyzer + 'static,
    {
        let tasks = self.begin_analysis()?;
        let Some(session_id) = self.session().map(ExtractionSession::id) else {
            return Err(SessionError::NoActiveSession);
        };
        if tasks.is_empty() {
            return self.summary();
        }

        let preparing = Arc::clone(&analyzer);
        match tokio::task::spawn_blocking(move || preparing.prepare()).await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => return Err(self.fail_analysis(session_id, error.to_string())),
            Err(error) => return Err(self.fail_analysis(session_id, error.to_string())),
        }

        log::debug!(
            "Dispatching {} scene(s) with concurrency {}",
            tasks.len(),
            options.concurrency
        );

        let mut pending = tasks.into_iter();
        let mut in_flight: JoinSet<TaskResult> = JoinSet::new();

        for task in pending.by_ref().take(options.concurrency) {
            self.mark_analyzing(&task);
            in_flight.spawn(analyze_task(Arc::clone(&analyzer), task, options.timeout));
        }

        while let Some(joined) = in_flight.join_next().await {
            let (task, result) = match joined {
                Ok(done) => done,
                Err(error) => {
                    in_flight.abort_all();
                    return Err(self.fail_analysis(session_id, error.to_string()));
                }
            };
            self.complete_task(&task, result);

            if let Some(next) = pending.next() {
                self.mark_analyzing(&next);
                in_flight.spawn(analyze_task(Arc::clone(&analyzer), next, options.timeout));
            }
        }

        self.summary()
    }
}

/// Run one analyzer call on a blocking thread, bounded by `timeout`.
async fn analyze_task<A>(analyzer: Arc<A>, task: AnalysisTask, timeout: Option<Duration>) -> TaskResult
where
    A: SceneAnalyzer + 'static,
{
    let thumbnail = task.thumbnail.clone();
    let call = tokio::task::spawn_blocking(move || analyzer.analyze(&thumbnail));

    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(joined) => flatten(joined),
            Err(_) => Err(AnalyzerError::TimedOut(limit)),
        },
        None => flatten(call.await),
    };

    (task, result)
}

fn flatten(
    joined: Result<Result<SceneAnalysis, AnalyzerError>, tokio::task::JoinError>,
) -> Result<SceneAnalysis, AnalyzerError> {
    joined.unwrap_or_else(|error| Err(AnalyzerError::Failed(format!("analyzer task failed: {error}"))))
}
