//! Scene state management
//!
//! This module provides the host-side scene with created faces and undo/redo
//! history.

mod face_ops;
mod history;

use shared::{MeshDescription, MeshId, SceneDescription};

/// Scene state with undo/redo history
#[derive(Default)]
pub struct SceneState {
    /// Current scene
    pub scene: SceneDescription,
    /// Undo stack - previous states
    pub(crate) undo_stack: Vec<SceneDescription>,
    /// Redo stack - undone states
    pub(crate) redo_stack: Vec<SceneDescription>,
    /// Monotonically increasing version counter for cache invalidation
    pub(crate) version: u64,
}

impl SceneState {
    pub fn new(scene: SceneDescription) -> Self {
        Self {
            scene,
            ..Default::default()
        }
    }

    /// Current scene version (increments on every mutation)
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the scene, dropping history
    pub fn set_scene(&mut self, scene: SceneDescription) {
        self.scene = scene;
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.version += 1;
    }

    /// Get a mesh by ID
    pub fn get_mesh(&self, mesh_id: &str) -> Option<&MeshDescription> {
        self.scene.mesh(mesh_id)
    }

    pub fn mesh_ids(&self) -> Vec<MeshId> {
        self.scene.meshes.iter().map(|m| m.id.clone()).collect()
    }

    /// Bump version without saving undo
    pub fn notify_mutated(&mut self) {
        self.version += 1;
    }

    /// Save current state to undo stack
    pub(crate) fn save_undo(&mut self) {
        self.undo_stack.push(self.scene.clone());
        if self.undo_stack.len() > 100 {
            self.undo_stack.remove(0);
        }
    }
}
