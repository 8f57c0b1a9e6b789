//! Mesh validation utilities.
//!
//! `MeshValidator` checks mesh descriptions before they enter the geometry
//! cache: finite coordinates, in-range indices, face arity and planarity.

use glam::DVec3;
use shared::MeshDescription;

use crate::reconstruct::Plane;

/// Validator for `MeshDescription` integrity checks.
pub struct MeshValidator<'a> {
    mesh: &'a MeshDescription,
}

impl<'a> MeshValidator<'a> {
    /// Create a new validator for the given mesh.
    pub fn new(mesh: &'a MeshDescription) -> Self {
        Self { mesh }
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.points.len()
    }

    pub fn face_count(&self) -> usize {
        self.mesh.faces.len()
    }

    /// Check that every coordinate is finite.
    pub fn are_points_finite(&self) -> bool {
        self.mesh.points.iter().all(|p| p.iter().all(|c| c.is_finite()))
    }

    /// Whether a face has at least 3 vertices and only in-range indices.
    pub fn is_face_valid(&self, face: &[usize]) -> bool {
        face.len() >= 3 && face.iter().all(|&i| i < self.vertex_count())
    }

    /// Whether an edge references two distinct in-range vertices.
    pub fn is_edge_valid(&self, edge: [usize; 2]) -> bool {
        edge[0] != edge[1] && edge[0] < self.vertex_count() && edge[1] < self.vertex_count()
    }

    /// Indices of faces that fail [`Self::is_face_valid`].
    pub fn invalid_faces(&self) -> Vec<usize> {
        self.mesh
            .faces
            .iter()
            .enumerate()
            .filter(|(_, f)| !self.is_face_valid(f))
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of explicit edges that fail [`Self::is_edge_valid`].
    pub fn invalid_edges(&self) -> Vec<usize> {
        self.mesh
            .edges
            .iter()
            .flatten()
            .enumerate()
            .filter(|(_, e)| !self.is_edge_valid(**e))
            .map(|(i, _)| i)
            .collect()
    }

    /// Largest distance of a face vertex from the face's best-fit plane.
    /// `None` for invalid or degenerate faces.
    pub fn face_planarity_error(&self, face_index: usize) -> Option<f64> {
        let face = self.mesh.faces.get(face_index)?;
        if !self.is_face_valid(face) {
            return None;
        }
        let points: Vec<DVec3> = face
            .iter()
            .map(|&i| DVec3::from_array(self.mesh.points[i]))
            .collect();
        let plane = Plane::fit(&points)?;
        points
            .iter()
            .map(|p| plane.signed_distance(*p).abs())
            .reduce(f64::max)
    }

    /// Check all faces lie within `tolerance` of their plane.
    pub fn are_faces_planar(&self, tolerance: f64) -> bool {
        (0..self.face_count()).all(|i| {
            self.face_planarity_error(i)
                .map(|e| e <= tolerance)
                .unwrap_or(false)
        })
    }

    /// Run every check, returning human-readable errors (empty = valid).
    pub fn validate_all(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.are_points_finite() {
            errors.push(format!("mesh '{}' has non-finite coordinates", self.mesh.id));
        }
        for i in self.invalid_faces() {
            errors.push(format!(
                "mesh '{}' face {} is invalid: {:?}",
                self.mesh.id, i, self.mesh.faces[i]
            ));
        }
        for i in self.invalid_edges() {
            errors.push(format!("mesh '{}' edge {} is out of range", self.mesh.id, i));
        }

        errors
    }
}
