//! Per-view gesture state

use glam::DVec2;
use shared::ViewId;

use crate::reconstruct::Face3D;
use crate::viewport::picking::{EdgeHit, IntersectionResult};

/// What the creation tool is doing in a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreationState {
    /// Idle or accumulating free-face picks
    #[default]
    None,
    /// Dragging a new face out of an existing edge
    ExtendingEdge,
}

/// Scratch state of one view's interaction.
///
/// Owns the build buffer, the last intersection result and the edge-extend
/// preview. Created on the first event in a view and dropped when the view
/// is deactivated.
#[derive(Debug, Clone)]
pub struct GestureSession {
    view: ViewId,
    state: CreationState,
    /// Free-face picks in camera space
    build_points: Vec<DVec2>,
    intersection: IntersectionResult,
    /// Last cursor position in camera space
    cursor: Option<DVec2>,
    /// Edge the running extension grows from
    extend_edge: Option<EdgeHit>,
    preview: Option<Face3D>,
    /// The last drag could not be extended under the cursor
    extend_rejected: bool,
    /// Cache generation the current indices belong to
    generation: u64,
}

impl GestureSession {
    pub fn new(view: impl Into<ViewId>, generation: u64) -> Self {
        Self {
            view: view.into(),
            state: CreationState::None,
            build_points: Vec::new(),
            intersection: IntersectionResult::None,
            cursor: None,
            extend_edge: None,
            preview: None,
            extend_rejected: false,
            generation,
        }
    }

    pub fn view_id(&self) -> &str {
        &self.view
    }

    pub fn state(&self) -> CreationState {
        self.state
    }

    pub fn is_extending(&self) -> bool {
        self.state == CreationState::ExtendingEdge
    }

    pub fn build_points(&self) -> &[DVec2] {
        &self.build_points
    }

    pub fn intersection(&self) -> &IntersectionResult {
        &self.intersection
    }

    pub fn cursor(&self) -> Option<DVec2> {
        self.cursor
    }

    pub fn extend_edge(&self) -> Option<&EdgeHit> {
        self.extend_edge.as_ref()
    }

    pub fn preview(&self) -> Option<&Face3D> {
        self.preview.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_extend_rejected(&self) -> bool {
        self.extend_rejected
    }

    // ── Mutation (tool only) ────────────────────────────────────

    pub(crate) fn set_cursor(&mut self, cursor: DVec2, intersection: IntersectionResult) {
        self.cursor = Some(cursor);
        self.intersection = intersection;
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub(crate) fn push_point(&mut self, point: DVec2) -> usize {
        self.build_points.push(point);
        self.build_points.len()
    }

    pub(crate) fn pop_point(&mut self) -> Option<DVec2> {
        self.build_points.pop()
    }

    pub(crate) fn clear_points(&mut self) {
        self.build_points.clear();
    }

    pub(crate) fn begin_extend(&mut self, edge: EdgeHit, generation: u64) {
        self.state = CreationState::ExtendingEdge;
        self.extend_edge = Some(edge);
        self.preview = None;
        self.extend_rejected = false;
        self.generation = generation;
    }

    pub(crate) fn set_preview(&mut self, preview: Option<Face3D>) {
        self.preview = preview;
        self.extend_rejected = false;
    }

    /// Drop the preview after a failed drag. Returns `true` only when the
    /// previous drag was not already rejected.
    pub(crate) fn reject_preview(&mut self) -> bool {
        self.preview = None;
        !std::mem::replace(&mut self.extend_rejected, true)
    }

    /// Leave the extension, handing back the preview it produced
    pub(crate) fn end_extend(&mut self) -> Option<(EdgeHit, Option<Face3D>)> {
        self.state = CreationState::None;
        self.extend_rejected = false;
        let preview = self.preview.take();
        self.extend_edge.take().map(|edge| (edge, preview))
    }

    /// Drop every piece of scratch state
    pub(crate) fn reset(&mut self) {
        self.end_extend();
        self.build_points.clear();
        self.intersection = IntersectionResult::None;
    }
}
