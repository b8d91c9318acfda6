//! Source description types.
//!
//! [`SourceFile`] is what the caller knows about an upload before decoding
//! it; [`SourceMetadata`] is what a [`FrameSource`](crate::FrameSource)
//! reports once the stream has been opened.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Identity of an uploaded source blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Original file name, e.g. `"reel.mp4"`.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type, e.g. `"video/mp4"`.
    pub mime_type: String,
}

impl SourceFile {
    /// Create a source description.
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
        }
    }

    /// Describe a file on disk. The MIME type is guessed from the extension.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file's metadata cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)?.len();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let mime_type = match extension.as_str() {
            "mp4" | "m4v" => "video/mp4",
            "mov" => "video/quicktime",
            "webm" => "video/webm",
            "mkv" => "video/x-matroska",
            "avi" => "video/x-msvideo",
            _ => "application/octet-stream",
        };
        Ok(Self::new(name, size, mime_type))
    }

    /// File name without its extension, used as the base of export names.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }
}

/// Stream properties reported by an opened [`FrameSource`](crate::FrameSource).
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMetadata {
    /// Total duration in seconds.
    pub duration: f64,
    /// Native frame width in pixels.
    pub width: u32,
    /// Native frame height in pixels.
    pub height: u32,
    /// Average frame rate, 0.0 when unknown.
    pub frames_per_second: f64,
    /// Codec name (e.g. `"h264"`), `"unknown"` when not reported.
    pub codec: String,
}
