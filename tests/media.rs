//! FFmpeg-backed frame source tests.
//!
//! These run against `tests/fixtures/sample_video.mp4` and return early
//! when the fixture is missing. Generate it with:
//!
//! ```text
//! ffmpeg -f lavfi -i testsrc=duration=5:size=320x240:rate=25 \
//!     -pix_fmt yuv420p tests/fixtures/sample_video.mp4
//! ```

use std::path::Path;

use scenecut::{
    ExtractionConfig, ExtractionError, FrameSampler, FrameSource, MediaFile, SamplingOptions,
    SamplingPlan,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn open_fixture() -> Option<MediaFile> {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return None;
    }
    Some(MediaFile::open(path).unwrap())
}

// ── Opening ────────────────────────────────────────────────────────

#[test]
fn open_missing_file_fails() {
    let result = MediaFile::open("tests/fixtures/does_not_exist.mp4");
    assert!(matches!(result, Err(ExtractionError::FileOpen { .. })));
}

#[test]
fn open_reads_metadata() {
    let Some(media) = open_fixture() else {
        return;
    };

    let metadata = media.metadata().unwrap();
    assert!(metadata.duration > 0.0);
    assert!(metadata.width > 0);
    assert!(metadata.height > 0);
    assert!(metadata.frames_per_second > 0.0);
    assert_ne!(metadata.codec, "unknown");
    assert_eq!(media.path(), Path::new(sample_video_path()));
}

// ── Seeking and capture ────────────────────────────────────────────

#[test]
fn capture_before_seek_fails() {
    let Some(mut media) = open_fixture() else {
        return;
    };

    assert!(media.capture_frame().is_err());
}

#[test]
fn seek_then_capture_returns_native_size() {
    let Some(mut media) = open_fixture() else {
        return;
    };
    let metadata = media.metadata().unwrap();

    for timestamp in [0.0, metadata.duration / 2.0] {
        media.seek_to(timestamp).unwrap();
        let frame = media.capture_frame().unwrap();
        assert_eq!(frame.width(), metadata.width);
        assert_eq!(frame.height(), metadata.height);
    }
}

#[test]
fn seek_backwards_after_forward() {
    let Some(mut media) = open_fixture() else {
        return;
    };
    let metadata = media.metadata().unwrap();

    media.seek_to(metadata.duration * 0.75).unwrap();
    media.seek_to(0.0).unwrap();
    assert_eq!(media.capture_frame().unwrap().width(), metadata.width);
}

#[test]
fn seek_near_end_captures_last_frame() {
    let Some(mut media) = open_fixture() else {
        return;
    };
    let metadata = media.metadata().unwrap();

    media.seek_to(metadata.duration - 0.001).unwrap();
    let frame = media.capture_frame().unwrap();
    assert_eq!(frame.dimensions(), (metadata.width, metadata.height));
}

#[test]
fn released_file_refuses_to_seek() {
    let Some(mut media) = open_fixture() else {
        return;
    };

    media.release();
    assert!(matches!(media.seek_to(0.0), Err(ExtractionError::ResourceReleased)));
    assert!(matches!(media.capture_frame(), Err(ExtractionError::ResourceReleased)));
}

// ── Sampling ───────────────────────────────────────────────────────

#[test]
fn sampling_a_real_file_produces_jpeg_scenes() {
    let Some(media) = open_fixture() else {
        return;
    };
    let metadata = media.metadata().unwrap();

    let options = SamplingOptions::new(1.0, 3, 0.7);
    let expected = SamplingPlan::compute(metadata.duration, &options)
        .unwrap()
        .timestamps()
        .count();

    let sampled = FrameSampler::new(options)
        .sample(media, &ExtractionConfig::new())
        .unwrap();

    assert_eq!(sampled.scenes.len(), expected);
    for scene in &sampled.scenes {
        assert!(scene.timestamp < metadata.duration);
        assert_eq!(scene.thumbnail.width, metadata.width);
        assert_eq!(scene.thumbnail.height, metadata.height);
        assert_eq!(&scene.thumbnail.data[..2], &[0xFF, 0xD8]);
    }
}
