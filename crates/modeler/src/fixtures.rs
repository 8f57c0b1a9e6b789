//! Factory functions for creating test data.
//!
//! Provides canonical cameras, views, meshes and scenes shared by unit tests,
//! integration tests and example scripts.

use shared::*;

use crate::viewport::camera::ViewContext;

// ── Cameras ─────────────────────────────────────────────────────

/// Camera at (0, 0, 10) looking down -Z at the z=0 plane.
/// f = 1000 px on a 1000x1000 image, so world (x, y, 0) lands on camera
/// space (0.1·x, 0.1·y).
pub fn front_camera() -> CameraModel {
    CameraModel::new("front", [0.0, 0.0, 10.0], [0.0, 0.0, 0.0, 1.0], 1000.0, [1000.0, 1000.0])
}

/// 1000x1000 viewport for [`front_camera`]. At zoom 1 world (x, y, 0) lands
/// on pixel (500 + 100·x, 500 - 100·y).
pub fn front_view() -> ViewContext {
    ViewContext::new("front_view", 1000.0, 1000.0)
}

pub fn front_view_description() -> ViewDescription {
    ViewDescription {
        id: "front_view".to_string(),
        camera: "front".to_string(),
        width: 1000.0,
        height: 1000.0,
    }
}

// ── Meshes ──────────────────────────────────────────────────────

/// Axis-aligned quad in the z=0 plane spanning `[x0, x1] x [y0, y1]`.
pub fn quad_mesh(id: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> MeshDescription {
    MeshDescription::new(
        id,
        vec![[x0, y0, 0.0], [x1, y0, 0.0], [x1, y1, 0.0], [x0, y1, 0.0]],
        vec![vec![0, 1, 2, 3]],
    )
}

/// Unit quad `[0, 1] x [0, 1]` in the z=0 plane.
pub fn unit_quad_mesh(id: &str) -> MeshDescription {
    quad_mesh(id, 0.0, 0.0, 1.0, 1.0)
}

/// Single-vertex mesh with no faces or edges.
pub fn point_mesh(id: &str, point: [f64; 3]) -> MeshDescription {
    MeshDescription::new(id, vec![point], vec![])
}

/// Two-vertex mesh holding one explicit edge.
pub fn edge_mesh(id: &str, a: [f64; 3], b: [f64; 3]) -> MeshDescription {
    MeshDescription {
        edges: Some(vec![[0, 1]]),
        ..MeshDescription::new(id, vec![a, b], vec![])
    }
}

// ── Point clouds ────────────────────────────────────────────────

/// Regular grid of cloud points in the plane z = `z`, `n` x `n` samples
/// spanning `[-extent, extent]` on x and y.
pub fn plane_cloud(z: f64, extent: f64, n: usize) -> Vec<[f64; 3]> {
    let mut points = Vec::with_capacity(n * n);
    let step = if n > 1 { 2.0 * extent / (n - 1) as f64 } else { 0.0 };
    for i in 0..n {
        for j in 0..n {
            points.push([-extent + i as f64 * step, -extent + j as f64 * step, z]);
        }
    }
    points
}

// ── Scenes ──────────────────────────────────────────────────────

/// Front camera and view with a wall cloud on z=0 and no meshes.
pub fn wall_scene() -> SceneDescription {
    SceneDescription {
        version: 1,
        cameras: vec![front_camera()],
        meshes: Vec::new(),
        point_cloud: plane_cloud(0.0, 5.0, 21),
        views: vec![front_view_description()],
    }
}

/// [`wall_scene`] plus the unit quad mesh `"wall"`.
pub fn wall_scene_with_quad() -> SceneDescription {
    let mut scene = wall_scene();
    scene.meshes.push(unit_quad_mesh("wall"));
    scene
}
