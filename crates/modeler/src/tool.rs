//! Face creation tool: turns press/move/drag/release events into picks,
//! edge extensions and face commits.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{DVec2, DVec3};
use shared::{FaceRequest, ViewId};

use crate::build::GeometrySnapshot;
use crate::error::{DegenerateReason, EngineError, Result};
use crate::reconstruct::{extend_on_plane, reconstruct_extension, reconstruct_face, Face3D};
use crate::state::session::GestureSession;
use crate::state::settings::PickSettings;
use crate::viewport::camera::ViewProjection;
use crate::viewport::overlays::{render_requests, RenderRequest};
use crate::viewport::picking::{classify, EdgeHit, IntersectionResult};

/// Message shown when four picks cannot be turned into a face
pub const DEGENERATE_FACE_MESSAGE: &str = "Can't find a 3D face with these points";
/// Message shown when an edge cannot be extended under the cursor
pub const DEGENERATE_EXTEND_MESSAGE: &str = "Can't extend the face from this edge";

/// Services the host provides to the tool.
pub trait FaceServices {
    /// Commit a quad. `target_mesh` is set when extending an existing mesh.
    fn create_face(&mut self, request: FaceRequest) -> std::result::Result<(), String>;

    /// Whether the view currently has focus
    fn is_active_view(&self, _view: &str) -> bool {
        true
    }

    fn log_error(&mut self, message: &str) {
        tracing::error!("{message}");
    }

    fn log_info(&mut self, message: &str) {
        tracing::info!("{message}");
    }
}

/// Result of a press
#[derive(Debug, Clone, PartialEq)]
pub enum PressOutcome {
    /// A pick was added; holds the buffer length
    PointAdded(usize),
    /// An edge extension started
    ExtendStarted(EdgeHit),
    /// The fourth pick produced a face that was committed
    FaceCreated(Face3D),
    /// The fourth pick was rejected and retracted
    Retracted(DegenerateReason),
}

/// Result of a release
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseOutcome {
    /// No extension was running
    Idle,
    /// The extension had no valid preview
    NothingToCommit,
    /// The preview was committed onto the edge's mesh
    Committed(Face3D),
}

fn session_entry<'a>(
    sessions: &'a mut HashMap<ViewId, GestureSession>,
    view: &str,
    generation: u64,
) -> &'a mut GestureSession {
    sessions
        .entry(view.to_string())
        .or_insert_with(|| GestureSession::new(view, generation))
}

fn to_request(target_mesh: Option<String>, face: &Face3D) -> FaceRequest {
    FaceRequest {
        target_mesh,
        points: face.map(|p| p.to_array()),
    }
}

/// Creation state machine over every view.
///
/// Holds the geometry snapshot all views pick against and one
/// [`GestureSession`] per view.
#[derive(Default)]
pub struct CreateTool {
    settings: PickSettings,
    geometry: Option<Arc<GeometrySnapshot>>,
    sessions: HashMap<ViewId, GestureSession>,
}

impl CreateTool {
    pub fn new(settings: PickSettings) -> Self {
        Self {
            settings,
            geometry: None,
            sessions: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &PickSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: PickSettings) {
        self.settings = settings;
    }

    pub fn geometry(&self) -> Option<&Arc<GeometrySnapshot>> {
        self.geometry.as_ref()
    }

    /// View holding a running edge extension, if any
    pub fn extending_view(&self) -> Option<&str> {
        self.sessions
            .values()
            .find(|s| s.is_extending())
            .map(|s| s.view_id())
    }

    /// Swap in a new geometry snapshot. Refused while an edge extension
    /// holds indices into the current one.
    pub fn set_geometry(&mut self, snapshot: Arc<GeometrySnapshot>) -> Result<()> {
        if let Some(view) = self.extending_view() {
            return Err(EngineError::GestureInProgress { view: view.to_string() });
        }
        tracing::debug!("Picking against geometry generation {}", snapshot.generation());
        self.geometry = Some(snapshot);
        Ok(())
    }

    /// Drop the geometry and every session (project closed).
    pub fn clear_geometry(&mut self) -> Result<()> {
        if let Some(view) = self.extending_view() {
            return Err(EngineError::GestureInProgress { view: view.to_string() });
        }
        self.geometry = None;
        self.sessions.clear();
        Ok(())
    }

    pub fn session(&self, view: &str) -> Option<&GestureSession> {
        self.sessions.get(view)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &GestureSession> {
        self.sessions.values()
    }

    /// Check the silent preconditions of an event and hand back the geometry.
    fn begin_event(
        &self,
        view: &str,
        services: &dyn FaceServices,
    ) -> Result<Arc<GeometrySnapshot>> {
        let geometry = self.geometry.clone().ok_or(EngineError::NoSession)?;
        if !services.is_active_view(view) {
            return Err(EngineError::InactiveView { view: view.to_string() });
        }
        Ok(geometry)
    }

    // ── Events ──────────────────────────────────────────────────

    /// Cursor moved without a button held: refresh what lies under it.
    pub fn on_move(
        &mut self,
        projection: &ViewProjection,
        cursor_px: DVec2,
        services: &mut dyn FaceServices,
    ) -> Result<IntersectionResult> {
        let geometry = self.begin_event(projection.view_id(), services)?;
        let hit = classify(projection, &geometry, cursor_px, &self.settings);
        let cursor = projection.view_to_camera(cursor_px.x, cursor_px.y);
        session_entry(&mut self.sessions, projection.view_id(), geometry.generation())
            .set_cursor(cursor, hit.clone());
        Ok(hit)
    }

    /// Button pressed: start an edge extension or add a free-face pick.
    pub fn on_press(
        &mut self,
        projection: &ViewProjection,
        cursor_px: DVec2,
        services: &mut dyn FaceServices,
    ) -> Result<PressOutcome> {
        let geometry = self.begin_event(projection.view_id(), services)?;
        let hit = classify(projection, &geometry, cursor_px, &self.settings);
        let cursor = projection.view_to_camera(cursor_px.x, cursor_px.y);
        let generation = geometry.generation();

        let session = session_entry(&mut self.sessions, projection.view_id(), generation);
        if session.is_extending() {
            tracing::debug!(
                "Press in '{}' while extending, dropping the extension",
                session.view_id()
            );
            session.end_extend();
        }
        session.set_generation(generation);
        session.set_cursor(cursor, hit.clone());

        let pick = match hit {
            IntersectionResult::Edge(edge) => {
                session.begin_extend(edge.clone(), generation);
                tracing::debug!(
                    "Extending edge {}-{} of '{}'",
                    edge.point_index_a,
                    edge.point_index_b,
                    edge.mesh_id
                );
                return Ok(PressOutcome::ExtendStarted(edge));
            }
            IntersectionResult::Point(point) => geometry
                .point(&point.mesh_id, point.point_index)
                .map(|p| projection.world_to_camera(p))
                .unwrap_or(cursor),
            IntersectionResult::None => cursor,
        };

        let count = session.push_point(pick);
        if count < 4 {
            return Ok(PressOutcome::PointAdded(count));
        }

        let points = session.build_points().to_vec();
        match reconstruct_face(projection, &geometry, &points, &self.settings) {
            Ok(face) => {
                session.clear_points();
                match services.create_face(to_request(None, &face)) {
                    Ok(()) => {
                        services.log_info("Face created");
                        Ok(PressOutcome::FaceCreated(face))
                    }
                    Err(msg) => {
                        services.log_error(&msg);
                        Err(EngineError::CommitRejected(msg))
                    }
                }
            }
            Err(EngineError::Degenerate(reason)) => {
                session.pop_point();
                tracing::debug!("Free face rejected: {reason}");
                services.log_error(DEGENERATE_FACE_MESSAGE);
                Ok(PressOutcome::Retracted(reason))
            }
            Err(e) => {
                session.pop_point();
                Err(e)
            }
        }
    }

    /// Cursor moved with the button held: update the extension preview.
    ///
    /// Returns the current preview, `None` when no extension is running or
    /// the edge cannot be extended under the cursor.
    pub fn on_drag(
        &mut self,
        projection: &ViewProjection,
        cursor_px: DVec2,
        services: &mut dyn FaceServices,
    ) -> Result<Option<Face3D>> {
        let geometry = self.begin_event(projection.view_id(), services)?;
        let hit = classify(projection, &geometry, cursor_px, &self.settings);
        let cursor = projection.view_to_camera(cursor_px.x, cursor_px.y);

        let generation = geometry.generation();
        let session = session_entry(&mut self.sessions, projection.view_id(), generation);
        session.set_cursor(cursor, hit);

        let Some(edge) = session.extend_edge().cloned() else {
            return Ok(None);
        };
        if session.generation() != geometry.generation() {
            let started = session.generation();
            session.reset();
            return Err(EngineError::StaleGeometry {
                started,
                current: geometry.generation(),
            });
        }

        match extension_preview(projection, &geometry, &edge, cursor, &self.settings) {
            Ok(face) => {
                session.set_preview(Some(face));
                Ok(Some(face))
            }
            Err(e @ EngineError::Degenerate(_)) => {
                tracing::debug!("Edge extension rejected: {e}");
                if session.reject_preview() {
                    services.log_error(DEGENERATE_EXTEND_MESSAGE);
                }
                Ok(None)
            }
            Err(e) => {
                session.set_preview(None);
                Err(e)
            }
        }
    }

    /// Button released: commit the extension preview, if any.
    pub fn on_release(
        &mut self,
        view: &str,
        services: &mut dyn FaceServices,
    ) -> Result<ReleaseOutcome> {
        let current = self.geometry.as_ref().map(|g| g.generation());
        let Some(session) = self.sessions.get_mut(view) else {
            return Ok(ReleaseOutcome::Idle);
        };
        let started = session.generation();
        let Some((edge, preview)) = session.end_extend() else {
            return Ok(ReleaseOutcome::Idle);
        };

        match current {
            None => return Err(EngineError::NoSession),
            Some(current) if current != started => {
                return Err(EngineError::StaleGeometry { started, current });
            }
            Some(_) => {}
        }

        let Some(face) = preview else {
            return Ok(ReleaseOutcome::NothingToCommit);
        };
        match services.create_face(to_request(Some(edge.mesh_id.clone()), &face)) {
            Ok(()) => {
                services.log_info(&format!("Face added to '{}'", edge.mesh_id));
                Ok(ReleaseOutcome::Committed(face))
            }
            Err(msg) => {
                services.log_error(&msg);
                Err(EngineError::CommitRejected(msg))
            }
        }
    }

    // ── Session management ──────────────────────────────────────

    /// Abort whatever the view is doing.
    pub fn cancel(&mut self, view: &str) {
        if let Some(session) = self.sessions.get_mut(view) {
            session.reset();
        }
    }

    /// Forget the view's session entirely.
    pub fn deactivate_view(&mut self, view: &str) -> bool {
        self.sessions.remove(view).is_some()
    }

    /// Retract the last free-face pick.
    pub fn undo_last_point(&mut self, view: &str) -> Option<DVec2> {
        self.sessions.get_mut(view)?.pop_point()
    }

    /// Overlays for the view's session
    pub fn render_requests(&self, projection: &ViewProjection) -> Vec<RenderRequest> {
        match (self.sessions.get(projection.view_id()), &self.geometry) {
            (Some(session), Some(geometry)) => render_requests(session, projection, geometry),
            _ => Vec::new(),
        }
    }
}

/// Quad `[B, A, A', B']` grown from `edge` towards the cursor.
///
/// The new edge keeps the cursor at the same ratio along it as at press time.
/// When the constrained solve is degenerate the picks are dropped onto the
/// plane of the face the edge came from.
pub fn extension_preview(
    projection: &ViewProjection,
    geometry: &GeometrySnapshot,
    edge: &EdgeHit,
    cursor: DVec2,
    settings: &PickSettings,
) -> Result<Face3D> {
    let point = |i: usize| {
        geometry
            .point(&edge.mesh_id, i)
            .ok_or_else(|| EngineError::UnknownMesh(edge.mesh_id.clone()))
    };
    let a = point(edge.point_index_a)?;
    let b = point(edge.point_index_b)?;

    let new_a = cursor - edge.edge_ratio * edge.edge_height_2d;
    let new_b = cursor + (1.0 - edge.edge_ratio) * edge.edge_height_2d;

    let [a2, b2] = match reconstruct_extension(projection, a, b, new_a, new_b, settings) {
        Ok(points) => points,
        Err(EngineError::Degenerate(reason)) => {
            let Some(face) = edge.origin_face.as_ref() else {
                return Err(reason.into());
            };
            tracing::debug!("Extension solve failed ({reason}), using the face plane");
            let face_points: Vec<DVec3> =
                face.iter().filter_map(|&i| geometry.point(&edge.mesh_id, i)).collect();
            extend_on_plane(projection, &face_points, [a, b], new_a, new_b, settings)?
        }
        Err(e) => return Err(e),
    };
    Ok([b, a, a2, b2])
}
