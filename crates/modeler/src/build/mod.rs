//! Geometry cache building from the host's scene description.
//!
//! Turns mesh descriptions into the flat point/edge/face arrays the picking
//! engine scans.

mod cache;

pub use cache::{CachedMesh, GeometryCache, GeometrySnapshot};

use std::collections::{BTreeMap, HashMap, HashSet};

use glam::DVec3;
use shared::{MeshDescription, MeshId, SceneDescription};

use crate::validation::MeshValidator;

/// Derive undirected edges from face loops, in first-occurrence order.
pub fn derive_edges(faces: &[Vec<usize>]) -> Vec<[usize; 2]> {
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut edges = Vec::new();

    for face in faces {
        for (k, &a) in face.iter().enumerate() {
            let b = face[(k + 1) % face.len()];
            if a == b {
                continue;
            }
            if seen.insert((a.min(b), a.max(b))) {
                edges.push([a, b]);
            }
        }
    }

    edges
}

/// Build one cached mesh, dropping faces and edges that reference missing
/// vertices.
pub fn build_cached_mesh(mesh: &MeshDescription) -> Result<CachedMesh, String> {
    let validator = MeshValidator::new(mesh);
    if !validator.are_points_finite() {
        return Err(format!("mesh '{}' has non-finite coordinates", mesh.id));
    }

    let faces: Vec<Vec<usize>> = mesh
        .faces
        .iter()
        .filter(|f| validator.is_face_valid(f))
        .cloned()
        .collect();
    if faces.len() != mesh.faces.len() {
        tracing::warn!(
            "mesh '{}': dropped {} invalid faces",
            mesh.id,
            mesh.faces.len() - faces.len()
        );
    }

    let edges = match &mesh.edges {
        Some(explicit) => {
            let valid: Vec<[usize; 2]> = explicit
                .iter()
                .copied()
                .filter(|e| validator.is_edge_valid(*e))
                .collect();
            if valid.len() != explicit.len() {
                tracing::warn!(
                    "mesh '{}': dropped {} invalid edges",
                    mesh.id,
                    explicit.len() - valid.len()
                );
            }
            valid
        }
        None => derive_edges(&faces),
    };

    Ok(CachedMesh {
        points: mesh.points.iter().map(|p| DVec3::from_array(*p)).collect(),
        edges,
        faces,
    })
}

/// Build cached meshes from the scene. Hidden meshes are skipped.
pub fn build_scene_geometry(
    scene: &SceneDescription,
) -> (BTreeMap<MeshId, CachedMesh>, HashMap<MeshId, String>) {
    let mut meshes = BTreeMap::new();
    let mut errors = HashMap::new();

    for mesh in &scene.meshes {
        if !mesh.visible {
            continue;
        }
        match build_cached_mesh(mesh) {
            Ok(cached) => {
                meshes.insert(mesh.id.clone(), cached);
            }
            Err(msg) => {
                errors.insert(mesh.id.clone(), msg);
            }
        }
    }

    (meshes, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{edge_mesh, unit_quad_mesh, wall_scene};

    #[test]
    fn test_derive_edges_quad() {
        let edges = derive_edges(&[vec![0, 1, 2, 3]]);
        assert_eq!(edges, vec![[0, 1], [1, 2], [2, 3], [3, 0]]);
    }

    #[test]
    fn test_derive_edges_shared_once() {
        // Two quads sharing edge 1-2, second traverses it as 2-1
        let edges = derive_edges(&[vec![0, 1, 2, 3], vec![1, 4, 5, 2]]);
        assert_eq!(edges.len(), 7);
        assert_eq!(edges.iter().filter(|e| (e[0].min(e[1]), e[0].max(e[1])) == (1, 2)).count(), 1);
    }

    #[test]
    fn test_build_cached_mesh_drops_invalid_face() {
        let mut mesh = unit_quad_mesh("m");
        mesh.faces.push(vec![0, 1, 42]);
        let cached = build_cached_mesh(&mesh).unwrap();
        assert_eq!(cached.faces.len(), 1);
        assert_eq!(cached.edges.len(), 4);
    }

    #[test]
    fn test_explicit_edges_used() {
        let cached = build_cached_mesh(&edge_mesh("e", [0.0; 3], [1.0, 0.0, 0.0])).unwrap();
        assert_eq!(cached.edges, vec![[0, 1]]);
        assert!(cached.faces.is_empty());
    }

    #[test]
    fn test_non_finite_mesh_is_error() {
        let mut mesh = unit_quad_mesh("m");
        mesh.points[0][0] = f64::INFINITY;
        assert!(build_cached_mesh(&mesh).is_err());
    }

    #[test]
    fn test_hidden_mesh_skipped() {
        let mut scene = wall_scene();
        let mut hidden = unit_quad_mesh("hidden");
        hidden.visible = false;
        scene.meshes.push(hidden);
        scene.meshes.push(unit_quad_mesh("shown"));
        let (meshes, errors) = build_scene_geometry(&scene);
        assert!(errors.is_empty());
        assert_eq!(meshes.keys().collect::<Vec<_>>(), vec!["shown"]);
    }
}
