//! Scene records.
//!
//! A [`Scene`] is one sampled frame: its position in the source, the
//! compressed [`Thumbnail`], the user's selection flag, and the analysis
//! state. Scenes are created by the [`FrameSampler`](crate::FrameSampler)
//! and only their selection and analysis fields change afterwards.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utilities::format_timestamp;

/// Opaque unique identifier of a scene, assigned at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(Uuid);

impl SceneId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for SceneId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Per-scene analysis lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneStatus {
    /// Not analyzed yet.
    #[default]
    Pending,
    /// An analyzer call is outstanding.
    Analyzing,
    /// Analysis finished and [`Scene::analysis`] is set.
    Completed,
    /// The analyzer failed for this scene.
    Error,
}

impl SceneStatus {
    /// `true` for [`Completed`](SceneStatus::Completed) and
    /// [`Error`](SceneStatus::Error).
    pub fn is_settled(self) -> bool {
        matches!(self, SceneStatus::Completed | SceneStatus::Error)
    }
}

/// Description and tags produced by the analyzer for one scene.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SceneAnalysis {
    /// Free-text description of the frame.
    pub description: String,
    /// Ordered tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SceneAnalysis {
    /// Create an analysis result.
    pub fn new<I, S>(description: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            description: description.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// A JPEG-compressed frame.
#[derive(Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// Encoded JPEG bytes.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl std::fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Thumbnail")
            .field("bytes", &self.data.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// One sampled frame of the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Unique identifier.
    pub id: SceneId,
    /// 1-based position in capture order.
    pub scene_number: u32,
    /// Seconds from the start of the source.
    pub timestamp: f64,
    /// The captured frame.
    pub thumbnail: Thumbnail,
    /// Whether the user selected this scene for export.
    pub is_selected: bool,
    /// Analysis result, present once the analyzer succeeded.
    pub analysis: Option<SceneAnalysis>,
    /// Analysis lifecycle of this scene.
    pub analysis_status: SceneStatus,
}

impl Scene {
    /// Create a freshly captured, unselected, unanalyzed scene.
    pub fn new(scene_number: u32, timestamp: f64, thumbnail: Thumbnail) -> Self {
        Self {
            id: SceneId::new(),
            scene_number,
            timestamp,
            thumbnail,
            is_selected: false,
            analysis: None,
            analysis_status: SceneStatus::Pending,
        }
    }

    /// The timestamp as `MM:SS`.
    pub fn timestamp_formatted(&self) -> String {
        format_timestamp(self.timestamp)
    }
}
