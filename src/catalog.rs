//! The ordered scene list of a session.
//!
//! [`SceneCatalog`] never reorders, inserts, or removes scenes after it is
//! built; only selection flags and analysis fields change. Operations that
//! address a scene by id are silent no-ops when the id is unknown, because
//! late UI callbacks may still reference scenes from a superseded session.

use crate::scene::{Scene, SceneAnalysis, SceneId, SceneStatus};

/// Ordered, capture-order list of [`Scene`] records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneCatalog {
    scenes: Vec<Scene>,
}

impl SceneCatalog {
    /// Build a catalog from scenes in capture order.
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self { scenes }
    }

    /// All scenes, in scene-number order.
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// `true` if the catalog holds no scenes.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Look up a scene by id.
    pub fn get(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|scene| scene.id == *id)
    }

    /// Iterate over scenes in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Scene> {
        self.scenes.iter()
    }

    /// Select every scene.
    pub fn select_all(&mut self) {
        self.set_all_selected(true);
    }

    /// Deselect every scene.
    pub fn deselect_all(&mut self) {
        self.set_all_selected(false);
    }

    fn set_all_selected(&mut self, selected: bool) {
        for scene in &mut self.scenes {
            scene.is_selected = selected;
        }
    }

    /// Flip the selection of one scene. Returns `false` if `id` is unknown.
    pub fn toggle_selection(&mut self, id: &SceneId) -> bool {
        match self.find_mut(id) {
            Some(scene) => {
                scene.is_selected = !scene.is_selected;
                true
            }
            None => false,
        }
    }

    /// Store an analysis result and mark the scene completed.
    /// Returns `false` if `id` is unknown.
    pub fn apply_analysis(&mut self, id: &SceneId, analysis: SceneAnalysis) -> bool {
        match self.find_mut(id) {
            Some(scene) => {
                scene.analysis = Some(analysis);
                scene.analysis_status = SceneStatus::Completed;
                true
            }
            None => false,
        }
    }

    /// Mark one scene as failed. Returns `false` if `id` is unknown or the
    /// scene already completed.
    pub fn mark_error(&mut self, id: &SceneId) -> bool {
        match self.find_mut(id) {
            Some(scene) if scene.analysis_status == SceneStatus::Completed => false,
            Some(scene) => {
                scene.analysis_status = SceneStatus::Error;
                true
            }
            None => false,
        }
    }

    /// Mark the scene at `index` (0-based position) as being analyzed.
    /// Returns `false` if the index is out of range.
    pub fn mark_analyzing(&mut self, index: usize) -> bool {
        match self.scenes.get_mut(index) {
            Some(scene) => {
                scene.analysis_status = SceneStatus::Analyzing;
                true
            }
            None => false,
        }
    }

    /// Scenes the user selected, in catalog order.
    pub fn selected(&self) -> Vec<&Scene> {
        self.scenes.iter().filter(|scene| scene.is_selected).collect()
    }

    /// Number of selected scenes.
    pub fn selected_count(&self) -> usize {
        self.scenes.iter().filter(|scene| scene.is_selected).count()
    }

    /// Number of scenes whose analysis completed.
    pub fn completed_count(&self) -> usize {
        self.count_status(SceneStatus::Completed)
    }

    /// Number of scenes whose analysis failed.
    pub fn failed_count(&self) -> usize {
        self.count_status(SceneStatus::Error)
    }

    /// `true` once every scene is either completed or failed.
    pub fn all_settled(&self) -> bool {
        self.scenes
            .iter()
            .all(|scene| scene.analysis_status.is_settled())
    }

    fn count_status(&self, status: SceneStatus) -> usize {
        self.scenes
            .iter()
            .filter(|scene| scene.analysis_status == status)
            .count()
    }

    pub(crate) fn reset_incomplete(&mut self) {
        for scene in &mut self.scenes {
            if scene.analysis_status != SceneStatus::Completed {
                scene.analysis_status = SceneStatus::Pending;
            }
        }
    }

    fn find_mut(&mut self, id: &SceneId) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|scene| scene.id == *id)
    }
}

impl<'a> IntoIterator for &'a SceneCatalog {
    type Item = &'a Scene;
    type IntoIter = std::slice::Iter<'a, Scene>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenes.iter()
    }
}
