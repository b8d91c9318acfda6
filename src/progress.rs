//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for observing extraction and
//! analysis progress, [`CancellationToken`] for cooperative cancellation of
//! an extraction, and [`ProgressInfo`] for the snapshots delivered to
//! callbacks.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use scenecut::{
//!     CancellationToken, ExtractionConfig, ProgressCallback, ProgressInfo,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!(
//!             "[{:?}] {}/{} ({}%)",
//!             info.operation, info.current, info.total, info.percentage,
//!         );
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let config = ExtractionConfig::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_cancellation(token.clone());
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use crate::session::SessionId;

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Seeking and capturing frames from the source.
    FrameExtraction,
    /// Running the analyzer over the scenes of a session.
    SceneAnalysis,
    /// Writing a session to a [`SessionStore`](crate::SessionStore).
    SessionSave,
}

/// A snapshot of progress, delivered to [`ProgressCallback::on_progress`].
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many items have been processed so far.
    pub current: u64,
    /// Total items expected.
    pub total: u64,
    /// `round(100 * current / total)`, or 0 when `total` is 0.
    pub percentage: u8,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
    /// The scene that was just processed, if any.
    pub scene_number: Option<u32>,
    /// The source timestamp (seconds) that was just processed, if any.
    pub timestamp: Option<f64>,
    /// The session the progress belongs to. Not yet assigned during extraction.
    pub session_id: Option<SessionId>,
}

/// Trait for receiving progress updates.
///
/// Implementations must be [`Send`] and [`Sync`] because the same callback
/// may be shared between a controller and the async analysis driver.
///
/// Progress callbacks are **infallible**: they observe but cannot halt the
/// operation. Use [`CancellationToken`] to stop an extraction.
pub trait ProgressCallback: Send + Sync {
    /// Called after each processed item (or batch of items).
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it; call [`cancel`](CancellationToken::cancel)
/// from anywhere to stop the associated extraction before its next seek.
///
/// # Example
///
/// ```
/// use scenecut::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones of this token observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Integer completion percentage, `round(100 * current / total)`.
///
/// Returns 0 when `total` is 0 and never exceeds 100.
///
/// ```
/// assert_eq!(scenecut::progress::percentage(1, 3), 33);
/// assert_eq!(scenecut::progress::percentage(2, 3), 67);
/// assert_eq!(scenecut::progress::percentage(0, 0), 0);
/// ```
pub fn percentage(current: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let ratio = (current.min(total) as f64 / total as f64) * 100.0;
    ratio.round() as u8
}

/// Tracks timing for one operation and emits callbacks every `batch_size` items.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: u64,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
    session_id: Option<SessionId>,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: u64,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
            session_id: None,
        }
    }

    pub(crate) fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Record one completed item and fire the callback if the batch
    /// threshold is reached. The last item always reports.
    pub(crate) fn advance(&mut self, scene_number: Option<u32>, timestamp: Option<f64>) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size || self.current >= self.total {
            self.report(scene_number, timestamp);
            self.items_since_last_report = 0;
        }
    }

    /// Report an externally computed position, e.g. the number of settled
    /// scenes in an analysis batch.
    pub(crate) fn report_at(&mut self, current: u64, scene_number: Option<u32>) {
        self.current = current;
        self.report(scene_number, None);
    }

    fn report(&self, scene_number: Option<u32>, timestamp: Option<f64>) {
        let info = ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage: percentage(self.current, self.total),
            elapsed: self.start_time.elapsed(),
            scene_number,
            timestamp,
            session_id: self.session_id,
        };

        self.callback.on_progress(&info);
    }
}
