//! Face creation

use shared::{FaceRequest, MeshDescription, MeshId};

use super::SceneState;

/// Append a quad to a mesh, reusing vertices with identical coordinates.
fn append_face(mesh: &mut MeshDescription, points: &[[f64; 3]; 4]) {
    let mut loop_indices = Vec::with_capacity(4);
    for p in points {
        let index = match mesh.find_point(*p) {
            Some(i) => i,
            None => {
                mesh.points.push(*p);
                mesh.points.len() - 1
            }
        };
        loop_indices.push(index);
    }

    if let Some(edges) = mesh.edges.as_mut() {
        for k in 0..loop_indices.len() {
            let (a, b) = (loop_indices[k], loop_indices[(k + 1) % loop_indices.len()]);
            if !edges.iter().any(|e| *e == [a, b] || *e == [b, a]) {
                edges.push([a, b]);
            }
        }
    }
    mesh.faces.push(loop_indices);
}

impl SceneState {
    /// Commit a quad. Extends `target_mesh` when given, otherwise creates a
    /// new mesh. Returns the ID of the mesh holding the face.
    pub fn create_face(&mut self, request: &FaceRequest) -> Result<MeshId, String> {
        if request.points.iter().flatten().any(|c| !c.is_finite()) {
            return Err("face has non-finite coordinates".to_string());
        }
        for i in 0..4 {
            if request.points[i] == request.points[(i + 1) % 4] {
                return Err(format!("face corners {i} and {} coincide", (i + 1) % 4));
            }
        }

        match &request.target_mesh {
            Some(mesh_id) => {
                if self.scene.mesh(mesh_id).is_none() {
                    return Err(format!("unknown mesh '{mesh_id}'"));
                }
                self.save_undo();
                self.redo_stack.clear();
                if let Some(mesh) = self.scene.mesh_mut(mesh_id) {
                    append_face(mesh, &request.points);
                }
                self.version += 1;
                tracing::info!("Added face to mesh '{mesh_id}'");
                Ok(mesh_id.clone())
            }
            None => {
                self.save_undo();
                self.redo_stack.clear();
                let mesh_id = uuid::Uuid::new_v4().to_string();
                self.scene.meshes.push(MeshDescription::new(
                    mesh_id.clone(),
                    request.points.to_vec(),
                    vec![vec![0, 1, 2, 3]],
                ));
                self.version += 1;
                tracing::info!("Created mesh '{mesh_id}'");
                Ok(mesh_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{edge_mesh, wall_scene, wall_scene_with_quad};

    fn request(target: Option<&str>, points: [[f64; 3]; 4]) -> FaceRequest {
        FaceRequest {
            target_mesh: target.map(str::to_string),
            points,
        }
    }

    #[test]
    fn test_create_free_face() {
        let mut state = SceneState::new(wall_scene());
        let square = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        let id = state.create_face(&request(None, square)).unwrap();
        let mesh = state.get_mesh(&id).unwrap();
        assert_eq!(mesh.points.len(), 4);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2, 3]]);
        assert_eq!(state.version(), 1);
        assert!(state.can_undo());
    }

    #[test]
    fn test_extend_reuses_shared_vertices() {
        let mut state = SceneState::new(wall_scene_with_quad());
        // Grows from edge 1 -> 2 of the unit quad
        state
            .create_face(&request(
                Some("wall"),
                [[1.0, 1.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 1.0, 0.0]],
            ))
            .unwrap();
        let mesh = state.get_mesh("wall").unwrap();
        assert_eq!(mesh.points.len(), 6);
        assert_eq!(mesh.faces[1], vec![2, 1, 4, 5]);
    }

    #[test]
    fn test_extend_updates_explicit_edges() {
        let mut scene = wall_scene();
        scene.meshes.push(edge_mesh("e", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]));
        let mut state = SceneState::new(scene);
        state
            .create_face(&request(
                Some("e"),
                [[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
            ))
            .unwrap();
        let edges = state.get_mesh("e").unwrap().edges.clone().unwrap();
        assert_eq!(edges, vec![[0, 1], [0, 2], [2, 3], [3, 1]]);
    }

    #[test]
    fn test_rejects_bad_requests() {
        let mut state = SceneState::new(wall_scene_with_quad());
        let good = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];

        let mut nan = good;
        nan[2][1] = f64::NAN;
        assert!(state.create_face(&request(None, nan)).is_err());

        let mut collapsed = good;
        collapsed[1] = collapsed[0];
        assert!(state.create_face(&request(None, collapsed)).is_err());

        assert!(state.create_face(&request(Some("missing"), good)).is_err());
        assert!(!state.can_undo());
        assert_eq!(state.version(), 0);
    }
}
