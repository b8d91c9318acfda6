//! Session persistence.
//!
//! [`SessionStore`] is the boundary to wherever sessions are kept between
//! runs. [`JsonFileStore`] keeps each session in its own directory:
//!
//! ```text
//! {root}/{session_id}/session.json
//! {root}/{session_id}/scene_1.jpg
//! {root}/{session_id}/scene_2.jpg
//! ...
//! ```

use std::{
    cmp::Reverse,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::{
    error::StoreError,
    metadata::SourceFile,
    progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker},
    scene::{Scene, SceneAnalysis, SceneId, SceneStatus, Thumbnail},
    session::{AnalysisStatus, ExtractionSession},
};

/// Most sessions returned by [`SessionStore::list_sessions`].
pub const SESSION_LIST_LIMIT: usize = 50;

const SESSION_FILE: &str = "session.json";

/// Where sessions are persisted.
pub trait SessionStore {
    /// Persist a session with all its scenes and thumbnails. Returns the
    /// identifier to use with the other methods.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if anything cannot be written.
    fn save_session(&self, session: &ExtractionSession) -> Result<String, StoreError>;

    /// Record the analysis of one scene and mark it completed. Unknown
    /// scene numbers are ignored.
    ///
    /// # Errors
    ///
    /// [`StoreError::SessionNotFound`] for an unknown session.
    fn update_scene_analysis(
        &self,
        session_id: &str,
        scene_number: u32,
        analysis: &SceneAnalysis,
    ) -> Result<(), StoreError>;

    /// Record the session-level analysis status.
    ///
    /// # Errors
    ///
    /// [`StoreError::SessionNotFound`] for an unknown session.
    fn update_analysis_status(
        &self,
        session_id: &str,
        status: AnalysisStatus,
    ) -> Result<(), StoreError>;

    /// Stored sessions, newest first, at most [`SESSION_LIST_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read.
    fn list_sessions(&self) -> Result<Vec<StoredSessionSummary>, StoreError>;

    /// A session's scenes in scene-number order. Selections come back
    /// cleared; analysis is present only where a description was stored.
    ///
    /// # Errors
    ///
    /// [`StoreError::SessionNotFound`] for an unknown session.
    fn fetch_scenes(&self, session_id: &str) -> Result<Vec<Scene>, StoreError>;

    /// Remove a session and its thumbnails.
    ///
    /// # Errors
    ///
    /// [`StoreError::SessionNotFound`] for an unknown session.
    fn delete_session(&self, session_id: &str) -> Result<(), StoreError>;
}

/// One row of [`SessionStore::list_sessions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSessionSummary {
    /// Session identifier.
    pub id: String,
    /// The file the session was extracted from.
    pub source: SourceFile,
    /// Source duration in seconds.
    pub duration: f64,
    /// Number of scenes.
    pub total_scenes: usize,
    /// Session-level analysis status at the last update.
    pub analysis_status: AnalysisStatus,
    /// Milliseconds since the Unix epoch when the session was saved.
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    #[serde(flatten)]
    summary: StoredSessionSummary,
    scenes: Vec<StoredScene>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredScene {
    scene_number: u32,
    timestamp: f64,
    width: u32,
    height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    analysis_status: SceneStatus,
}

impl StoredScene {
    fn from_scene(scene: &Scene) -> Self {
        Self {
            scene_number: scene.scene_number,
            timestamp: scene.timestamp,
            width: scene.thumbnail.width,
            height: scene.thumbnail.height,
            description: scene
                .analysis
                .as_ref()
                .map(|analysis| analysis.description.clone()),
            tags: scene
                .analysis
                .as_ref()
                .map(|analysis| analysis.tags.clone())
                .unwrap_or_default(),
            analysis_status: scene.analysis_status,
        }
    }
}

/// A [`SessionStore`] backed by JSON files in a directory.
pub struct JsonFileStore {
    root: PathBuf,
    progress: Arc<dyn ProgressCallback>,
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl JsonFileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            progress: Arc::new(NoOpProgress),
        })
    }

    /// Report one progress step per thumbnail written by
    /// [`save_session`](SessionStore::save_session).
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of an existing session. Ids that are not UUIDs never name
    /// a session, which also keeps them from escaping the root.
    fn session_dir(&self, session_id: &str) -> Result<PathBuf, StoreError> {
        let not_found = || StoreError::SessionNotFound(session_id.to_string());
        let id = Uuid::parse_str(session_id).map_err(|_| not_found())?;
        let directory = self.root.join(id.to_string());
        if directory.join(SESSION_FILE).is_file() {
            Ok(directory)
        } else {
            Err(not_found())
        }
    }

    fn read_record(&self, directory: &Path) -> Result<StoredSession, StoreError> {
        let content = fs::read_to_string(directory.join(SESSION_FILE))?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_record(&self, directory: &Path, record: &StoredSession) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(record)?;
        let mut temporary = NamedTempFile::new_in(directory)?;
        temporary.write_all(content.as_bytes())?;
        temporary
            .persist(directory.join(SESSION_FILE))
            .map_err(|error| StoreError::Io(error.error))?;
        Ok(())
    }

    fn update_record<F>(&self, session_id: &str, update: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut StoredSession),
    {
        let directory = self.session_dir(session_id)?;
        let mut record = self.read_record(&directory)?;
        update(&mut record);
        self.write_record(&directory, &record)
    }
}

fn thumbnail_file_name(scene_number: u32) -> String {
    format!("scene_{scene_number}.jpg")
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

impl SessionStore for JsonFileStore {
    fn save_session(&self, session: &ExtractionSession) -> Result<String, StoreError> {
        let id = session.id().to_string();
        let directory = self.root.join(&id);
        fs::create_dir_all(&directory)?;

        let scenes = session.catalog().scenes();
        let mut tracker = ProgressTracker::new(
            self.progress.clone(),
            OperationType::SessionSave,
            scenes.len() as u64,
            1,
        )
        .with_session(session.id());

        for scene in scenes {
            fs::write(
                directory.join(thumbnail_file_name(scene.scene_number)),
                &scene.thumbnail.data,
            )?;
            tracker.advance(Some(scene.scene_number), Some(scene.timestamp));
        }

        let record = StoredSession {
            summary: StoredSessionSummary {
                id: id.clone(),
                source: session.source().clone(),
                duration: session.duration(),
                total_scenes: session.total_scenes(),
                analysis_status: session.analysis_status(),
                created_at: unix_millis(),
            },
            scenes: scenes.iter().map(StoredScene::from_scene).collect(),
        };
        self.write_record(&directory, &record)?;

        log::info!("Saved session {id} with {} scene(s)", scenes.len());
        Ok(id)
    }

    fn update_scene_analysis(
        &self,
        session_id: &str,
        scene_number: u32,
        analysis: &SceneAnalysis,
    ) -> Result<(), StoreError> {
        self.update_record(session_id, |record| {
            match record
                .scenes
                .iter_mut()
                .find(|scene| scene.scene_number == scene_number)
            {
                Some(scene) => {
                    scene.description = Some(analysis.description.clone());
                    scene.tags = analysis.tags.clone();
                    scene.analysis_status = SceneStatus::Completed;
                }
                None => {
                    log::warn!("Session {session_id} has no scene {scene_number}");
                }
            }
        })
    }

    fn update_analysis_status(
        &self,
        session_id: &str,
        status: AnalysisStatus,
    ) -> Result<(), StoreError> {
        self.update_record(session_id, |record| {
            record.summary.analysis_status = status;
        })
    }

    fn list_sessions(&self) -> Result<Vec<StoredSessionSummary>, StoreError> {
        let mut summaries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let directory = entry?.path();
            if !directory.join(SESSION_FILE).is_file() {
                continue;
            }
            match self.read_record(&directory) {
                Ok(record) => summaries.push(record.summary),
                Err(error) => {
                    log::warn!("Skipping unreadable session {}: {error}", directory.display());
                }
            }
        }

        summaries.sort_by_key(|summary| Reverse(summary.created_at));
        summaries.truncate(SESSION_LIST_LIMIT);
        Ok(summaries)
    }

    fn fetch_scenes(&self, session_id: &str) -> Result<Vec<Scene>, StoreError> {
        let directory = self.session_dir(session_id)?;
        let mut record = self.read_record(&directory)?;
        record.scenes.sort_by_key(|scene| scene.scene_number);

        record
            .scenes
            .into_iter()
            .map(|stored| {
                let data = fs::read(directory.join(thumbnail_file_name(stored.scene_number)))?;
                let analysis = stored.description.map(|description| SceneAnalysis {
                    description,
                    tags: stored.tags,
                });
                Ok(Scene {
                    id: SceneId::new(),
                    scene_number: stored.scene_number,
                    timestamp: stored.timestamp,
                    thumbnail: Thumbnail {
                        data,
                        width: stored.width,
                        height: stored.height,
                    },
                    is_selected: false,
                    analysis,
                    analysis_status: stored.analysis_status,
                })
            })
            .collect()
    }

    fn delete_session(&self, session_id: &str) -> Result<(), StoreError> {
        let directory = self.session_dir(session_id)?;
        fs::remove_dir_all(&directory)?;
        log::debug!("Deleted session {session_id}");
        Ok(())
    }
}
