//! Async analysis driver tests.

#![cfg(feature = "async")]

mod common;

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use scenecut::{
    AnalysisStatus, AnalyzerError, AsyncAnalysisOptions, SceneAnalysis, SceneAnalyzer,
    SceneStatus, SessionController, SessionError, Thumbnail,
};

use common::{analysis, extract_scenes};

/// Sleeps per call and records the peak number of concurrent calls.
#[derive(Default)]
struct SlowAnalyzer {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl SlowAnalyzer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

impl SceneAnalyzer for SlowAnalyzer {
    fn analyze(&self, _thumbnail: &Thumbnail) -> Result<SceneAnalysis, AnalyzerError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(analysis("slow", &["async"]))
    }
}

struct Unreachable;

impl SceneAnalyzer for Unreachable {
    fn prepare(&self) -> Result<(), AnalyzerError> {
        Err(AnalyzerError::Unavailable("offline".to_string()))
    }

    fn analyze(&self, _thumbnail: &Thumbnail) -> Result<SceneAnalysis, AnalyzerError> {
        Err(AnalyzerError::Failed("unreachable".to_string()))
    }
}

// ── Options ────────────────────────────────────────────────────────

#[test]
fn options_builder() {
    let options = AsyncAnalysisOptions::new()
        .with_concurrency(0)
        .with_timeout(Duration::from_secs(5));
    assert_eq!(options.concurrency(), 1);
    assert_eq!(options.timeout(), Some(Duration::from_secs(5)));
    assert_eq!(options.without_timeout().timeout(), None);
}

// ── Driver ─────────────────────────────────────────────────────────

#[tokio::test]
async fn analyzes_every_scene_with_bounded_concurrency() {
    let mut controller = SessionController::new();
    extract_scenes(&mut controller, 6);
    let analyzer = Arc::new(SlowAnalyzer::new(Duration::from_millis(20)));
    let options = AsyncAnalysisOptions::new().with_concurrency(2);

    let summary = controller
        .run_analysis_async(analyzer.clone(), &options)
        .await
        .unwrap();

    assert_eq!(summary.completed, 6);
    assert_eq!(summary.status, AnalysisStatus::Completed);
    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 6);
    assert!(analyzer.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(controller.session().unwrap().analysis_progress().current, 6);
}

#[tokio::test]
async fn slow_scenes_time_out_individually() {
    let mut controller = SessionController::new();
    extract_scenes(&mut controller, 2);
    let analyzer = Arc::new(SlowAnalyzer::new(Duration::from_millis(300)));
    let options = AsyncAnalysisOptions::new()
        .with_concurrency(2)
        .with_timeout(Duration::from_millis(20));

    let summary = controller.run_analysis_async(analyzer, &options).await.unwrap();

    assert_eq!(summary.status, AnalysisStatus::Completed);
    assert_eq!(summary.failed, 2);
    assert!(controller
        .session()
        .unwrap()
        .catalog()
        .iter()
        .all(|scene| scene.analysis_status == SceneStatus::Error));
}

#[tokio::test]
async fn setup_failure_fails_the_session() {
    let mut controller = SessionController::new();
    extract_scenes(&mut controller, 2);

    let result = controller
        .run_analysis_async(Arc::new(Unreachable), &AsyncAnalysisOptions::new())
        .await;

    assert!(matches!(result, Err(SessionError::AnalysisFailed { .. })));
    assert_eq!(controller.analysis_status(), AnalysisStatus::Error);
}

#[tokio::test]
async fn requires_a_session() {
    let mut controller = SessionController::new();
    let result = controller
        .run_analysis_async(Arc::new(Unreachable), &AsyncAnalysisOptions::new())
        .await;
    assert!(matches!(result, Err(SessionError::NoActiveSession)));
}
