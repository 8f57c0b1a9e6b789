//! Headless test harness for scripted picking sessions.
//!
//! Plays the host: owns the scene, answers the tool's service calls, and
//! rebuilds the geometry cache between gestures.

use std::collections::HashSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use shared::{FaceRequest, SceneDescription, ViewId};

use crate::build::GeometryCache;
use crate::error::{EngineError, Result};
use crate::reconstruct::Face3D;
use crate::state::scene::SceneState;
use crate::state::session::GestureSession;
use crate::state::settings::PickSettings;
use crate::tool::{CreateTool, FaceServices, PressOutcome, ReleaseOutcome};
use crate::validation::MeshValidator;
use crate::viewport::camera::{ViewContext, ViewProjection};
use crate::viewport::overlays::RenderRequest;
use crate::viewport::picking::IntersectionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    Info,
    Error,
}

/// User-facing message emitted by the tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMessage {
    pub level: MessageLevel,
    pub text: String,
}

/// Host side of the tool's service seam
#[derive(Default)]
pub struct HostServices {
    pub scene: SceneState,
    inactive_views: HashSet<ViewId>,
    messages: Vec<HostMessage>,
}

impl FaceServices for HostServices {
    fn create_face(&mut self, request: FaceRequest) -> std::result::Result<(), String> {
        self.scene.create_face(&request).map(|_| ())
    }

    fn is_active_view(&self, view: &str) -> bool {
        !self.inactive_views.contains(view)
    }

    fn log_error(&mut self, message: &str) {
        tracing::error!("{message}");
        self.messages.push(HostMessage {
            level: MessageLevel::Error,
            text: message.to_string(),
        });
    }

    fn log_info(&mut self, message: &str) {
        tracing::info!("{message}");
        self.messages.push(HostMessage {
            level: MessageLevel::Info,
            text: message.to_string(),
        });
    }
}

/// Headless test harness: scene, geometry cache and creation tool
pub struct TestHarness {
    pub host: HostServices,
    pub tool: CreateTool,
    cache: GeometryCache,
    /// Scene version the tool's geometry was built from
    synced_version: Option<u64>,
}

impl TestHarness {
    /// Create a harness with an empty scene.
    pub fn new() -> Self {
        Self::with_scene(SceneDescription::default())
    }

    pub fn with_scene(scene: SceneDescription) -> Self {
        let mut harness = Self {
            host: HostServices {
                scene: SceneState::new(scene),
                ..Default::default()
            },
            tool: CreateTool::new(PickSettings::default()),
            cache: GeometryCache::new(),
            synced_version: None,
        };
        harness.sync_geometry();
        harness
    }

    pub fn set_settings(&mut self, settings: PickSettings) {
        self.tool.set_settings(settings);
    }

    /// Rebuild the tool's geometry if the scene changed and no gesture is
    /// running. Returns whether the tool is up to date.
    pub fn sync_geometry(&mut self) -> bool {
        let version = self.host.scene.version();
        if self.synced_version == Some(version) {
            return true;
        }
        if let Some(view) = self.tool.extending_view() {
            tracing::debug!("Deferring geometry rebuild until '{view}' releases");
            return false;
        }
        let snapshot = self.cache.rebuild(&self.host.scene.scene);
        match self.tool.set_geometry(snapshot) {
            Ok(()) => {
                self.synced_version = Some(version);
                true
            }
            Err(e) => {
                tracing::warn!("Geometry rebuild refused: {e}");
                false
            }
        }
    }

    /// Generation of the geometry the tool picks against
    pub fn geometry_generation(&self) -> u64 {
        self.tool.geometry().map(|g| g.generation()).unwrap_or(0)
    }

    // ── Scene ─────────────────────────────────────────────────

    /// Load a scene (replaces current). Refused mid-gesture.
    pub fn load_scene(&mut self, scene: SceneDescription) -> Result<()> {
        if let Some(view) = self.tool.extending_view() {
            return Err(EngineError::GestureInProgress { view: view.to_string() });
        }
        self.host.scene.set_scene(scene);
        self.tool.clear_geometry()?;
        self.synced_version = None;
        self.sync_geometry();
        Ok(())
    }

    /// Load a scene from JSON string
    pub fn load_scene_json(&mut self, json: &str) -> std::result::Result<(), String> {
        let scene: SceneDescription =
            serde_json::from_str(json).map_err(|e| format!("JSON parse error: {e}"))?;
        self.load_scene(scene).map_err(|e| e.to_string())
    }

    /// Export the current scene as JSON
    pub fn export_scene_json(&self) -> String {
        serde_json::to_string_pretty(&self.host.scene.scene).unwrap_or_default()
    }

    /// Undo the last committed face
    pub fn undo(&mut self) -> bool {
        let undone = self.host.scene.undo();
        self.sync_geometry();
        undone
    }

    /// Redo the last undone face
    pub fn redo(&mut self) -> bool {
        let redone = self.host.scene.redo();
        self.sync_geometry();
        redone
    }

    /// Show or hide a mesh
    pub fn set_mesh_visible(&mut self, mesh_id: &str, visible: bool) -> Result<()> {
        let mesh = self
            .host
            .scene
            .scene
            .mesh_mut(mesh_id)
            .ok_or_else(|| EngineError::UnknownMesh(mesh_id.to_string()))?;
        mesh.visible = visible;
        self.host.scene.notify_mutated();
        self.sync_geometry();
        Ok(())
    }

    // ── Views ─────────────────────────────────────────────────

    /// Projection for a view from the scene's view and camera entries
    pub fn projection(&self, view: &str) -> Result<ViewProjection> {
        let scene = &self.host.scene.scene;
        let no_data = || EngineError::NoDisplayData { view: view.to_string() };
        let desc = scene.view(view).ok_or_else(no_data)?;
        let camera = scene.camera(&desc.camera).ok_or_else(no_data)?;
        ViewProjection::new(&ViewContext::new(view, desc.width, desc.height), camera)
    }

    /// Resize a view or bind it to another camera
    pub fn set_view(
        &mut self,
        view: &str,
        width: Option<f64>,
        height: Option<f64>,
        camera: Option<String>,
    ) -> Result<()> {
        let desc = self
            .host
            .scene
            .scene
            .view_mut(view)
            .ok_or_else(|| EngineError::NoDisplayData { view: view.to_string() })?;
        if let Some(w) = width {
            desc.width = w;
        }
        if let Some(h) = height {
            desc.height = h;
        }
        if let Some(c) = camera {
            desc.camera = c;
        }
        Ok(())
    }

    /// Change the visible window of a camera
    pub fn set_zoom(
        &mut self,
        camera: &str,
        zoom: Option<f64>,
        pan: Option<[f64; 2]>,
    ) -> Result<()> {
        let cam = self
            .host
            .scene
            .scene
            .camera_mut(camera)
            .ok_or_else(|| EngineError::InvalidCamera {
                reason: format!("unknown camera '{camera}'"),
            })?;
        if let Some(z) = zoom {
            cam.zoom = z;
        }
        if let Some(p) = pan {
            cam.pan = p;
        }
        Ok(())
    }

    /// Mark a view focused or not
    pub fn set_active(&mut self, view: &str, active: bool) {
        if active {
            self.host.inactive_views.remove(view);
        } else {
            self.host.inactive_views.insert(view.to_string());
        }
    }

    // ── Gestures ──────────────────────────────────────────────

    pub fn press(&mut self, view: &str, x: f64, y: f64) -> Result<PressOutcome> {
        let projection = self.projection(view)?;
        let result = self.tool.on_press(&projection, DVec2::new(x, y), &mut self.host);
        self.sync_geometry();
        result
    }

    pub fn move_to(&mut self, view: &str, x: f64, y: f64) -> Result<IntersectionResult> {
        let projection = self.projection(view)?;
        self.tool.on_move(&projection, DVec2::new(x, y), &mut self.host)
    }

    pub fn drag(&mut self, view: &str, x: f64, y: f64) -> Result<Option<Face3D>> {
        let projection = self.projection(view)?;
        self.tool.on_drag(&projection, DVec2::new(x, y), &mut self.host)
    }

    pub fn release(&mut self, view: &str) -> Result<ReleaseOutcome> {
        let result = self.tool.on_release(view, &mut self.host);
        self.sync_geometry();
        result
    }

    pub fn cancel(&mut self, view: &str) {
        self.tool.cancel(view);
        self.sync_geometry();
    }

    pub fn undo_last_point(&mut self, view: &str) -> Option<DVec2> {
        self.tool.undo_last_point(view)
    }

    pub fn deactivate_view(&mut self, view: &str) -> bool {
        let removed = self.tool.deactivate_view(view);
        self.sync_geometry();
        removed
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn session(&self, view: &str) -> Option<&GestureSession> {
        self.tool.session(view)
    }

    pub fn render_requests(&self, view: &str) -> Result<Vec<RenderRequest>> {
        let projection = self.projection(view)?;
        Ok(self.tool.render_requests(&projection))
    }

    /// Number of meshes in the scene
    pub fn mesh_count(&self) -> usize {
        self.host.scene.scene.meshes.len()
    }

    /// Total number of faces over all meshes
    pub fn face_count(&self) -> usize {
        self.host.scene.scene.meshes.iter().map(|m| m.faces.len()).sum()
    }

    /// Create a validator for a mesh
    pub fn validate_mesh(&self, mesh_id: &str) -> Option<MeshValidator<'_>> {
        self.host.scene.get_mesh(mesh_id).map(MeshValidator::new)
    }

    pub fn messages(&self) -> &[HostMessage] {
        &self.host.messages
    }

    /// Error messages shown to the user so far
    pub fn errors(&self) -> Vec<&str> {
        self.host
            .messages
            .iter()
            .filter(|m| m.level == MessageLevel::Error)
            .map(|m| m.text.as_str())
            .collect()
    }

    pub fn clear_messages(&mut self) {
        self.host.messages.clear();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
