//! Internal utility functions.
//!
//! Helpers for pixel-data copying, timestamp conversion, and timestamp
//! formatting shared by the decoder, the catalog, and the exporters.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};
use ffmpeg_sys_next::AV_TIME_BASE;

/// Copy pixel data from an FFmpeg RGB24 frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 3).
/// This strips the padding so the result can be passed directly to
/// [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}

/// Convert seconds to a container timestamp in `AV_TIME_BASE` units, as
/// expected by container-level seeking.
pub(crate) fn seconds_to_av_timestamp(seconds: f64) -> i64 {
    (seconds * f64::from(AV_TIME_BASE)) as i64
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator())
}

/// Format seconds as `MM:SS`, truncating fractional seconds.
///
/// Minutes are not wrapped into hours, so a 75-minute source yields
/// `"75:00"`.
///
/// ```
/// assert_eq!(scenecut::format_timestamp(0.0), "00:00");
/// assert_eq!(scenecut::format_timestamp(88.5), "01:28");
/// assert_eq!(scenecut::format_timestamp(605.9), "10:05");
/// ```
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u64;
    let remainder = (seconds % 60.0).floor() as u64;
    format!("{minutes:02}:{remainder:02}")
}
