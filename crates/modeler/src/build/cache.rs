//! Geometry cache management

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use glam::DVec3;
use shared::{MeshId, SceneDescription};

use super::build_scene_geometry;

/// Flat geometry of one mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedMesh {
    /// Vertex positions in world space
    pub points: Vec<DVec3>,
    /// Index pairs into `points`
    pub edges: Vec<[usize; 2]>,
    /// Vertex index loops
    pub faces: Vec<Vec<usize>>,
}

impl CachedMesh {
    /// First face that walks `a -> b` or `b -> a` as consecutive vertices
    pub fn face_containing_edge(&self, a: usize, b: usize) -> Option<&[usize]> {
        self.faces
            .iter()
            .find(|face| {
                let n = face.len();
                (0..n).any(|k| {
                    let (u, v) = (face[k], face[(k + 1) % n]);
                    (u == a && v == b) || (u == b && v == a)
                })
            })
            .map(|f| f.as_slice())
    }
}

/// Immutable scene geometry shared by every view during gestures.
///
/// Meshes are kept in a `BTreeMap` so enumeration order (and with it the
/// tie-break of the intersection tests) is stable.
#[derive(Debug, Default)]
pub struct GeometrySnapshot {
    generation: u64,
    meshes: BTreeMap<MeshId, CachedMesh>,
    point_cloud: Vec<DVec3>,
}

impl GeometrySnapshot {
    pub fn new(
        generation: u64,
        meshes: BTreeMap<MeshId, CachedMesh>,
        point_cloud: Vec<DVec3>,
    ) -> Self {
        Self {
            generation,
            meshes,
            point_cloud,
        }
    }

    /// Rebuild counter value this snapshot was produced under
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn meshes(&self) -> impl Iterator<Item = (&MeshId, &CachedMesh)> {
        self.meshes.iter()
    }

    pub fn mesh(&self, id: &str) -> Option<&CachedMesh> {
        self.meshes.get(id)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn points_of(&self, id: &str) -> Option<&[DVec3]> {
        self.meshes.get(id).map(|m| m.points.as_slice())
    }

    pub fn edges_of(&self, id: &str) -> Option<&[[usize; 2]]> {
        self.meshes.get(id).map(|m| m.edges.as_slice())
    }

    pub fn faces_of(&self, id: &str) -> Option<&[Vec<usize>]> {
        self.meshes.get(id).map(|m| m.faces.as_slice())
    }

    pub fn point(&self, id: &str, index: usize) -> Option<DVec3> {
        self.points_of(id)?.get(index).copied()
    }

    /// Sparse reconstruction points used as plane support
    pub fn point_cloud(&self) -> &[DVec3] {
        &self.point_cloud
    }
}

/// Owner of the current geometry snapshot.
///
/// `rebuild` swaps in a fresh snapshot; anyone still holding the old `Arc`
/// keeps a consistent view of the previous geometry.
pub struct GeometryCache {
    current: Arc<GeometrySnapshot>,
    errors: HashMap<MeshId, String>,
    rebuild_count: u64,
}

impl Default for GeometryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryCache {
    pub fn new() -> Self {
        Self {
            current: Arc::new(GeometrySnapshot::default()),
            errors: HashMap::new(),
            rebuild_count: 0,
        }
    }

    /// Replace the cached geometry wholesale from a scene.
    pub fn rebuild(&mut self, scene: &SceneDescription) -> Arc<GeometrySnapshot> {
        let (meshes, errors) = build_scene_geometry(scene);
        for (id, msg) in &errors {
            tracing::warn!("Skipping mesh '{id}': {msg}");
        }

        self.rebuild_count += 1;
        let cloud = scene
            .point_cloud
            .iter()
            .map(|p| DVec3::from_array(*p))
            .filter(|p| p.is_finite())
            .collect();
        self.current = Arc::new(GeometrySnapshot::new(self.rebuild_count, meshes, cloud));
        self.errors = errors;

        tracing::debug!(
            "Geometry cache rebuilt: generation {}, {} meshes",
            self.rebuild_count,
            self.current.mesh_count()
        );
        self.current.clone()
    }

    pub fn snapshot(&self) -> Arc<GeometrySnapshot> {
        self.current.clone()
    }

    /// Rebuild counter
    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }

    /// Meshes rejected by the last rebuild
    pub fn errors(&self) -> &HashMap<MeshId, String> {
        &self.errors
    }
}
