//! Cursor intersection against cached geometry, in camera space.
//!
//! Points and edges are separate passes with independent tolerances; callers
//! test points first so vertex snapping wins over edge snapping.

use glam::{DVec2, DVec3};
use shared::MeshId;

use super::camera::ViewProjection;
use crate::build::GeometrySnapshot;
use crate::state::settings::PickSettings;

/// A cached vertex under the cursor
#[derive(Debug, Clone, PartialEq)]
pub struct PointHit {
    pub mesh_id: MeshId,
    pub point_index: usize,
}

/// A cached edge under the cursor
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeHit {
    pub mesh_id: MeshId,
    pub point_index_a: usize,
    pub point_index_b: usize,
    /// Perpendicular cursor distance to the edge, camera units
    pub distance: f64,
    /// Cursor position along `a -> b` in camera space, in [0, 1]
    pub edge_ratio: f64,
    /// `b - a` in camera space
    pub edge_height_2d: DVec2,
    /// `B - A` in world space
    pub edge_height_3d: DVec3,
    /// Vertex loop of the first face containing the edge
    pub origin_face: Option<Vec<usize>>,
}

/// What the cursor is over
#[derive(Debug, Clone, PartialEq, Default)]
pub enum IntersectionResult {
    #[default]
    None,
    Point(PointHit),
    Edge(EdgeHit),
}

impl IntersectionResult {
    pub fn is_none(&self) -> bool {
        matches!(self, IntersectionResult::None)
    }

    pub fn as_edge(&self) -> Option<&EdgeHit> {
        match self {
            IntersectionResult::Edge(hit) => Some(hit),
            _ => None,
        }
    }
}

/// Half-size of the point snap box in camera units
pub fn point_threshold(projection: &ViewProjection, settings: &PickSettings) -> f64 {
    2.0 * settings.point_radius * projection.zoom() / projection.view().height
}

/// Edge snap distance in camera units
pub fn edge_tolerance(projection: &ViewProjection, settings: &PickSettings) -> f64 {
    settings.edge_tolerance * projection.zoom()
}

/// Find the first cached point whose projection lies in the box
/// `cursor ± threshold` on both axes.
///
/// Enumeration is mesh id order then index order. The first hit wins even
/// when a later point is closer.
pub fn intersect_point_camera(
    projection: &ViewProjection,
    snapshot: &GeometrySnapshot,
    cursor: DVec2,
    threshold: f64,
) -> Option<PointHit> {
    for (mesh_id, mesh) in snapshot.meshes() {
        for (i, p) in mesh.points.iter().enumerate() {
            if projection.depth(*p) <= 0.0 {
                continue;
            }
            let c = projection.world_to_camera(*p);
            if (c.x - cursor.x).abs() <= threshold && (c.y - cursor.y).abs() <= threshold {
                return Some(PointHit {
                    mesh_id: mesh_id.clone(),
                    point_index: i,
                });
            }
        }
    }
    None
}

/// Point test from a cursor in viewport pixels
pub fn intersect_point(
    projection: &ViewProjection,
    snapshot: &GeometrySnapshot,
    cursor_px: DVec2,
    settings: &PickSettings,
) -> Option<PointHit> {
    let cursor = projection.view_to_camera(cursor_px.x, cursor_px.y);
    intersect_point_camera(projection, snapshot, cursor, point_threshold(projection, settings))
}

/// Perpendicular distance from `p` to segment `a-b`, or `None` when the
/// projection of `p` onto the line falls outside the segment.
/// Also returns the parametric position of that projection along `a -> b`.
pub fn segment_distance(a: DVec2, b: DVec2, p: DVec2) -> Option<(f64, f64)> {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f64::EPSILON * f64::EPSILON {
        return None;
    }

    // Same sign on both ends means the foot of the perpendicular is inside
    let ap = p - a;
    let bp = p - b;
    let from_a = ap.dot(ab) > 0.0;
    let from_b = bp.dot(-ab) > 0.0;
    if from_a != from_b {
        return None;
    }

    let distance = ab.perp_dot(a - p).abs() / len_sq.sqrt();
    let ratio = (ap.dot(ab) / len_sq).clamp(0.0, 1.0);
    Some((distance, ratio))
}

/// Find the globally nearest cached edge within `tolerance` of the cursor.
///
/// A mesh with no edges ends the search with no result.
pub fn intersect_edge_camera(
    projection: &ViewProjection,
    snapshot: &GeometrySnapshot,
    cursor: DVec2,
    tolerance: f64,
) -> Option<EdgeHit> {
    let mut best: Option<(f64, f64, &MeshId, [usize; 2], DVec2)> = None;

    for (mesh_id, mesh) in snapshot.meshes() {
        if mesh.edges.is_empty() {
            return None;
        }

        for &[ia, ib] in &mesh.edges {
            let (pa, pb) = (mesh.points[ia], mesh.points[ib]);
            if projection.depth(pa) <= 0.0 || projection.depth(pb) <= 0.0 {
                continue;
            }
            let a = projection.world_to_camera(pa);
            let b = projection.world_to_camera(pb);

            let Some((distance, ratio)) = segment_distance(a, b, cursor) else {
                continue;
            };
            if best.as_ref().is_none_or(|(d, ..)| distance < *d) {
                best = Some((distance, ratio, mesh_id, [ia, ib], b - a));
            }
        }
    }

    let (distance, edge_ratio, mesh_id, [ia, ib], edge_height_2d) = best?;
    if distance > tolerance {
        return None;
    }

    let mesh = snapshot.mesh(mesh_id)?;
    Some(EdgeHit {
        mesh_id: mesh_id.clone(),
        point_index_a: ia,
        point_index_b: ib,
        distance,
        edge_ratio,
        edge_height_2d,
        edge_height_3d: mesh.points[ib] - mesh.points[ia],
        origin_face: mesh.face_containing_edge(ia, ib).map(|f| f.to_vec()),
    })
}

/// Edge test from a cursor in viewport pixels
pub fn intersect_edge(
    projection: &ViewProjection,
    snapshot: &GeometrySnapshot,
    cursor_px: DVec2,
    settings: &PickSettings,
) -> Option<EdgeHit> {
    let cursor = projection.view_to_camera(cursor_px.x, cursor_px.y);
    intersect_edge_camera(projection, snapshot, cursor, edge_tolerance(projection, settings))
}

/// Classify what lies under the cursor: points first, then edges.
pub fn classify(
    projection: &ViewProjection,
    snapshot: &GeometrySnapshot,
    cursor_px: DVec2,
    settings: &PickSettings,
) -> IntersectionResult {
    if let Some(hit) = intersect_point(projection, snapshot, cursor_px, settings) {
        return IntersectionResult::Point(hit);
    }
    if let Some(hit) = intersect_edge(projection, snapshot, cursor_px, settings) {
        return IntersectionResult::Edge(hit);
    }
    IntersectionResult::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::GeometryCache;
    use crate::fixtures::{
        edge_mesh, front_camera, front_view, point_mesh, unit_quad_mesh, wall_scene,
    };
    use shared::SceneDescription;

    fn projection() -> ViewProjection {
        ViewProjection::new(&front_view(), &front_camera()).unwrap()
    }

    fn snapshot(scene: &SceneDescription) -> std::sync::Arc<GeometrySnapshot> {
        GeometryCache::new().rebuild(scene)
    }

    fn scene_with(meshes: Vec<shared::MeshDescription>) -> SceneDescription {
        SceneDescription {
            meshes,
            ..wall_scene()
        }
    }

    #[test]
    fn test_point_box_match() {
        // World (100, 100, 0) lands on camera (10, 10)
        let snap = snapshot(&scene_with(vec![point_mesh("p", [100.0, 100.0, 0.0])]));
        let proj = projection();
        let hit = intersect_point_camera(&proj, &snap, DVec2::new(11.0, 11.0), 2.0);
        assert_eq!(hit, Some(PointHit { mesh_id: "p".into(), point_index: 0 }));
        assert!(intersect_point_camera(&proj, &snap, DVec2::new(13.0, 13.0), 2.0).is_none());
    }

    #[test]
    fn test_point_box_is_not_circular() {
        // (1.9, 1.9) is outside a radius-2 circle but inside the box
        let snap = snapshot(&scene_with(vec![point_mesh("p", [0.0, 0.0, 0.0])]));
        let hit = intersect_point_camera(&projection(), &snap, DVec2::new(1.9, 1.9), 2.0);
        assert!(hit.is_some());
    }

    #[test]
    fn test_point_tie_break_by_enumeration() {
        // Both points are 0.5 from the cursor; mesh "a" enumerates first
        let scene = scene_with(vec![
            point_mesh("b", [0.0, 5.0, 0.0]),
            point_mesh("a", [0.0, -5.0, 0.0]),
        ]);
        let snap = snapshot(&scene);
        let proj = projection();
        for _ in 0..5 {
            let hit = intersect_point_camera(&proj, &snap, DVec2::ZERO, 1.0).unwrap();
            assert_eq!(hit.mesh_id, "a");
        }
    }

    #[test]
    fn test_point_first_not_nearest() {
        // Index 0 is farther from the cursor than index 1, but wins
        let mut mesh = point_mesh("m", [0.4, 0.0, 0.0]);
        mesh.points.push([0.05, 0.0, 0.0]);
        let snap = snapshot(&scene_with(vec![mesh]));
        let hit = intersect_point_camera(&projection(), &snap, DVec2::ZERO, 0.05).unwrap();
        assert_eq!(hit.point_index, 0);
    }

    #[test]
    fn test_point_threshold_from_pixels() {
        let proj = projection();
        let t = point_threshold(&proj, &PickSettings::default());
        assert!((t - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_intersect_point_from_pixels() {
        let snap = snapshot(&scene_with(vec![unit_quad_mesh("wall")]));
        let proj = projection();
        // Vertex (1, 1, 0) is at pixel (600, 400)
        let settings = PickSettings::default();
        let hit = intersect_point(&proj, &snap, DVec2::new(605.0, 395.0), &settings).unwrap();
        assert_eq!(hit.point_index, 2);
        assert!(intersect_point(&proj, &snap, DVec2::new(550.0, 450.0), &settings).is_none());
    }

    #[test]
    fn test_point_behind_camera_ignored() {
        let snap = snapshot(&scene_with(vec![point_mesh("p", [0.0, 0.0, 20.0])]));
        assert!(intersect_point_camera(&projection(), &snap, DVec2::ZERO, 1.0).is_none());
    }

    #[test]
    fn test_segment_distance() {
        let a = DVec2::ZERO;
        let b = DVec2::new(10.0, 0.0);
        let (d, t) = segment_distance(a, b, DVec2::new(5.0, 0.0005)).unwrap();
        assert!((d - 0.0005).abs() < 1e-12);
        assert!((t - 0.5).abs() < 1e-12);
        assert!(segment_distance(a, b, DVec2::new(15.0, 0.0)).is_none());
        assert!(segment_distance(a, b, DVec2::new(-0.1, 3.0)).is_none());
        assert!(segment_distance(a, a, DVec2::new(0.0, 1.0)).is_none());
    }

    #[test]
    fn test_edge_match_and_outside_segment() {
        // World (0,0,0)-(100,0,0) lands on camera (0,0)-(10,0)
        let snap = snapshot(&scene_with(vec![edge_mesh("e", [0.0; 3], [100.0, 0.0, 0.0])]));
        let proj = projection();
        let hit = intersect_edge_camera(&proj, &snap, DVec2::new(5.0, 0.0005), 0.03).unwrap();
        assert!(hit.distance < 1e-3);
        assert_eq!((hit.point_index_a, hit.point_index_b), (0, 1));
        assert!((hit.edge_ratio - 0.5).abs() < 1e-9);
        assert!((hit.edge_height_2d - DVec2::new(10.0, 0.0)).length() < 1e-9);
        assert!((hit.edge_height_3d - DVec3::new(100.0, 0.0, 0.0)).length() < 1e-9);
        assert!(hit.origin_face.is_none());

        assert!(intersect_edge_camera(&proj, &snap, DVec2::new(15.0, 0.0), 0.03).is_none());
        assert!(intersect_edge_camera(&proj, &snap, DVec2::new(15.0, 0.0), 1e6).is_none());
    }

    #[test]
    fn test_edge_beyond_tolerance() {
        let snap = snapshot(&scene_with(vec![edge_mesh("e", [0.0; 3], [100.0, 0.0, 0.0])]));
        assert!(intersect_edge_camera(&projection(), &snap, DVec2::new(5.0, 0.05), 0.03).is_none());
    }

    #[test]
    fn test_edge_global_minimum() {
        let scene = scene_with(vec![
            edge_mesh("a", [0.0, 0.2, 0.0], [1.0, 0.2, 0.0]),
            edge_mesh("b", [0.0, 0.1, 0.0], [1.0, 0.1, 0.0]),
        ]);
        let snap = snapshot(&scene);
        // Cursor at world (0.5, 0.12): "b" is nearer even though "a" enumerates first
        let cursor = DVec2::new(0.05, 0.012);
        let hit = intersect_edge_camera(&projection(), &snap, cursor, 0.03).unwrap();
        assert_eq!(hit.mesh_id, "b");
    }

    #[test]
    fn test_edge_records_origin_face() {
        let snap = snapshot(&scene_with(vec![unit_quad_mesh("wall")]));
        // Bottom edge 0-1 at camera y=0, cursor slightly above its middle
        let cursor = DVec2::new(0.05, 0.001);
        let hit = intersect_edge_camera(&projection(), &snap, cursor, 0.03).unwrap();
        assert_eq!((hit.point_index_a, hit.point_index_b), (0, 1));
        assert_eq!(hit.origin_face, Some(vec![0, 1, 2, 3]));
    }

    #[test]
    fn test_edge_mesh_without_edges_stops_search() {
        // "a" has no edges and enumerates first
        let scene = scene_with(vec![
            point_mesh("a", [5.0, 5.0, 0.0]),
            edge_mesh("b", [0.0; 3], [1.0, 0.0, 0.0]),
        ]);
        let snap = snapshot(&scene);
        assert!(intersect_edge_camera(&projection(), &snap, DVec2::new(0.05, 0.0), 0.03).is_none());
    }

    #[test]
    fn test_edge_tolerance_scales_with_zoom() {
        let mut camera = front_camera();
        camera.zoom = 2.0;
        let proj = ViewProjection::new(&front_view(), &camera).unwrap();
        assert!((edge_tolerance(&proj, &PickSettings::default()) - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_classify_prefers_points() {
        let snap = snapshot(&scene_with(vec![unit_quad_mesh("wall")]));
        let proj = projection();
        let settings = PickSettings::default();
        // Near vertex 1 at pixel (600, 500), also on edges 0-1 and 1-2
        assert!(matches!(
            classify(&proj, &snap, DVec2::new(599.0, 500.5), &settings),
            IntersectionResult::Point(PointHit { point_index: 1, .. })
        ));
        // Middle of edge 0-1 at pixel (550, 500)
        assert!(matches!(
            classify(&proj, &snap, DVec2::new(550.0, 501.0), &settings),
            IntersectionResult::Edge(_)
        ));
        // Middle of the face
        assert!(classify(&proj, &snap, DVec2::new(550.0, 450.0), &settings).is_none());
    }
}
