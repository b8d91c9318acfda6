//! Shared fixtures: a deterministic in-memory frame source.

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use image::{Rgb, RgbImage};
use scenecut::{
    ExtractionConfig, ExtractionError, ExtractionSession, FrameSampler, FrameSource,
    ProgressCallback, ProgressInfo, SamplingOptions, Scene, SceneAnalysis, SessionController,
    SourceFile, SourceMetadata, Thumbnail,
};

/// Counters shared between a [`SyntheticSource`] and the test that owns it.
#[derive(Debug, Clone, Default)]
pub struct SourceWatch {
    pub releases: Arc<AtomicUsize>,
    pub seeks: Arc<Mutex<Vec<f64>>>,
}

impl SourceWatch {
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn seek_positions(&self) -> Vec<f64> {
        self.seeks.lock().unwrap().clone()
    }
}

/// Renders a solid frame whose color encodes the seek position.
pub struct SyntheticSource {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// Fail the capture with this 0-based index.
    pub fail_capture_at: Option<usize>,
    position: Option<f64>,
    captures: usize,
    watch: SourceWatch,
}

impl SyntheticSource {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            width: 16,
            height: 8,
            fail_capture_at: None,
            position: None,
            captures: 0,
            watch: SourceWatch::default(),
        }
    }

    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_capture_at = Some(index);
        self
    }

    pub fn watch(&self) -> SourceWatch {
        self.watch.clone()
    }
}

impl FrameSource for SyntheticSource {
    fn metadata(&self) -> Result<SourceMetadata, ExtractionError> {
        Ok(SourceMetadata {
            duration: self.duration,
            width: self.width,
            height: self.height,
            frames_per_second: 25.0,
            codec: "synthetic".to_string(),
        })
    }

    fn seek_to(&mut self, timestamp: f64) -> Result<(), ExtractionError> {
        self.watch.seeks.lock().unwrap().push(timestamp);
        self.position = Some(timestamp);
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<RgbImage, ExtractionError> {
        let position = self.position.ok_or_else(|| {
            ExtractionError::Ffmpeg("capture before seek".to_string())
        })?;
        if self.fail_capture_at == Some(self.captures) {
            return Err(ExtractionError::Ffmpeg("decoder stalled".to_string()));
        }
        self.captures += 1;
        let shade = ((position * 10.0) as u32 % 256) as u8;
        Ok(RgbImage::from_pixel(self.width, self.height, Rgb([shade, 64, 128])))
    }

    fn release(&mut self) {
        self.watch.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records every progress notification.
#[derive(Default)]
pub struct RecordingProgress {
    pub infos: Mutex<Vec<ProgressInfo>>,
}

impl RecordingProgress {
    pub fn snapshot(&self) -> Vec<ProgressInfo> {
        self.infos.lock().unwrap().clone()
    }
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().unwrap().push(info.clone());
    }
}

pub fn options(interval_seconds: f64, max_frames: u32) -> SamplingOptions {
    SamplingOptions::new(interval_seconds, max_frames, 0.8)
}

pub fn source_file() -> SourceFile {
    SourceFile::new("holiday.mp4", 1_024, "video/mp4")
}

/// Extract a session of `scenes` one-second scenes into `controller`.
pub fn extract_scenes(controller: &mut SessionController, scenes: u32) -> SourceWatch {
    let source = SyntheticSource::new(f64::from(scenes));
    let watch = source.watch();
    controller
        .extract(source_file(), source, &options(1.0, 60), &ExtractionConfig::new())
        .expect("synthetic extraction succeeds");
    watch
}

/// Build a standalone session of `scenes` one-second scenes.
pub fn build_session(scenes: u32) -> ExtractionSession {
    let sampled = FrameSampler::new(options(1.0, 60))
        .sample(SyntheticSource::new(f64::from(scenes)), &ExtractionConfig::new())
        .expect("synthetic sampling succeeds");
    ExtractionSession::new(source_file(), sampled)
}

pub fn thumbnail(bytes: &[u8]) -> Thumbnail {
    Thumbnail {
        data: bytes.to_vec(),
        width: 4,
        height: 3,
    }
}

pub fn scene(scene_number: u32, timestamp: f64) -> Scene {
    Scene::new(scene_number, timestamp, thumbnail(&[0xFF, 0xD8, scene_number as u8]))
}

pub fn analysis(description: &str, tags: &[&str]) -> SceneAnalysis {
    SceneAnalysis::new(description, tags.iter().copied())
}
