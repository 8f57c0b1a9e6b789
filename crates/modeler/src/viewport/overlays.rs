//! Overlay requests for the host renderer (cursor, snap highlights, build
//! polygon, preview quad).
//!
//! Everything is expressed in view-space pixels. The engine never draws; the
//! host walks the list and paints each request in its own style.

use glam::{DVec2, DVec3};

use super::camera::ViewProjection;
use super::picking::IntersectionResult;
use crate::build::GeometrySnapshot;
use crate::state::session::GestureSession;

/// Pixel offset of the extend marker from the cursor
const EXTEND_CURSOR_OFFSET: DVec2 = DVec2::new(10.0, 10.0);

/// One overlay primitive
#[derive(Debug, Clone, PartialEq)]
pub enum RenderRequest {
    Cursor { position: DVec2 },
    /// Cursor while dragging an edge extension, drawn beside the pointer
    ExtendCursor { position: DVec2 },
    HighlightPoint { position: DVec2 },
    HighlightEdge { a: DVec2, b: DVec2 },
    /// Free-face picks so far
    BuildPolygon {
        points: Vec<DVec2>,
        /// Segment from the last pick to the cursor
        rubber_band: Option<[DVec2; 2]>,
        closed: bool,
    },
    PreviewQuad { corners: [DVec2; 4] },
}

impl RenderRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            RenderRequest::Cursor { .. } => "cursor",
            RenderRequest::ExtendCursor { .. } => "extend_cursor",
            RenderRequest::HighlightPoint { .. } => "highlight_point",
            RenderRequest::HighlightEdge { .. } => "highlight_edge",
            RenderRequest::BuildPolygon { .. } => "build_polygon",
            RenderRequest::PreviewQuad { .. } => "preview_quad",
        }
    }
}

fn visible(projection: &ViewProjection, world: DVec3) -> Option<DVec2> {
    (projection.depth(world) > 0.0).then(|| projection.world_to_view(world))
}

/// Overlays describing a view's session, back to front.
pub fn render_requests(
    session: &GestureSession,
    projection: &ViewProjection,
    snapshot: &GeometrySnapshot,
) -> Vec<RenderRequest> {
    let mut out = Vec::new();
    let cursor = session.cursor().map(|c| projection.camera_to_view(c));

    if let Some(face) = session.preview() {
        let corners = face.map(|p| projection.world_to_view(p));
        if face.iter().all(|p| projection.depth(*p) > 0.0) {
            out.push(RenderRequest::PreviewQuad { corners });
        }
    }

    if !session.build_points().is_empty() {
        let points: Vec<DVec2> = session
            .build_points()
            .iter()
            .map(|p| projection.camera_to_view(*p))
            .collect();
        let rubber_band = match (points.last(), cursor) {
            (Some(last), Some(c)) => Some([*last, c]),
            _ => None,
        };
        let closed = points.len() >= 3;
        out.push(RenderRequest::BuildPolygon {
            points,
            rubber_band,
            closed,
        });
    }

    match session.intersection() {
        IntersectionResult::Point(hit) => {
            if let Some(position) = snapshot
                .point(&hit.mesh_id, hit.point_index)
                .and_then(|p| visible(projection, p))
            {
                out.push(RenderRequest::HighlightPoint { position });
            }
        }
        IntersectionResult::Edge(hit) => {
            let a = snapshot
                .point(&hit.mesh_id, hit.point_index_a)
                .and_then(|p| visible(projection, p));
            let b = snapshot
                .point(&hit.mesh_id, hit.point_index_b)
                .and_then(|p| visible(projection, p));
            if let (Some(a), Some(b)) = (a, b) {
                out.push(RenderRequest::HighlightEdge { a, b });
            }
        }
        IntersectionResult::None => {}
    }

    if let Some(position) = cursor {
        if session.is_extending() {
            out.push(RenderRequest::ExtendCursor {
                position: position + EXTEND_CURSOR_OFFSET,
            });
        } else {
            out.push(RenderRequest::Cursor { position });
        }
    }

    out
}
