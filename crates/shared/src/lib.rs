use serde::{Deserialize, Serialize};

/// Mesh identifier in the scene
pub type MeshId = String;

/// Identifier of a viewport bound to a camera
pub type ViewId = String;

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    1
}

fn default_zoom() -> f64 {
    1.0
}

fn identity_orientation() -> [f64; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

// ============================================================================
// Cameras
// ============================================================================

/// Calibrated pinhole camera, as produced by the external calibration.
///
/// `orientation` is a unit quaternion `[x, y, z, w]` rotating camera axes into
/// world axes. The camera looks along its local -Z with +Y up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraModel {
    pub name: String,
    /// Camera center in world space
    pub position: [f64; 3],
    #[serde(default = "identity_orientation")]
    pub orientation: [f64; 4],
    /// Focal length in image pixels
    pub focal_length: f64,
    /// Image size in pixels `[width, height]`
    pub image_size: [f64; 2],
    /// Principal point in image pixels (top-left origin, y down).
    /// `None` means the image center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_point: Option<[f64; 2]>,
    /// Height of the visible camera-space window (1.0 = whole image height)
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    /// Camera-space center of the visible window
    #[serde(default)]
    pub pan: [f64; 2],
}

impl CameraModel {
    pub fn new(
        name: impl Into<String>,
        position: [f64; 3],
        orientation: [f64; 4],
        focal_length: f64,
        image_size: [f64; 2],
    ) -> Self {
        Self {
            name: name.into(),
            position,
            orientation,
            focal_length,
            image_size,
            principal_point: None,
            zoom: 1.0,
            pan: [0.0, 0.0],
        }
    }

    /// Principal point, defaulting to the image center
    pub fn principal_point(&self) -> [f64; 2] {
        self.principal_point
            .unwrap_or([self.image_size[0] * 0.5, self.image_size[1] * 0.5])
    }
}

// ============================================================================
// Meshes
// ============================================================================

/// Polygonal mesh known to the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDescription {
    pub id: MeshId,
    /// Vertex positions in world space
    pub points: Vec<[f64; 3]>,
    /// Faces as ordered vertex index loops
    #[serde(default)]
    pub faces: Vec<Vec<usize>>,
    /// Explicit edge list. When absent, edges are derived from `faces`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<[usize; 2]>>,
    #[serde(default = "default_true")]
    pub visible: bool,
}

impl MeshDescription {
    pub fn new(id: impl Into<MeshId>, points: Vec<[f64; 3]>, faces: Vec<Vec<usize>>) -> Self {
        Self {
            id: id.into(),
            points,
            faces,
            edges: None,
            visible: true,
        }
    }

    /// Index of a vertex with exactly these coordinates
    pub fn find_point(&self, point: [f64; 3]) -> Option<usize> {
        self.points.iter().position(|p| *p == point)
    }
}

// ============================================================================
// Views and scene
// ============================================================================

/// A viewport looking through one camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDescription {
    pub id: ViewId,
    /// Name of the camera this view looks through
    pub camera: String,
    /// Viewport width in device pixels
    pub width: f64,
    /// Viewport height in device pixels
    pub height: f64,
}

/// Scene snapshot handed to the picking engine by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub cameras: Vec<CameraModel>,
    #[serde(default)]
    pub meshes: Vec<MeshDescription>,
    /// Sparse reconstruction points in world space
    #[serde(default)]
    pub point_cloud: Vec<[f64; 3]>,
    #[serde(default)]
    pub views: Vec<ViewDescription>,
}

impl Default for SceneDescription {
    fn default() -> Self {
        Self {
            version: default_version(),
            cameras: Vec::new(),
            meshes: Vec::new(),
            point_cloud: Vec::new(),
            views: Vec::new(),
        }
    }
}

impl SceneDescription {
    pub fn camera(&self, name: &str) -> Option<&CameraModel> {
        self.cameras.iter().find(|c| c.name == name)
    }

    pub fn camera_mut(&mut self, name: &str) -> Option<&mut CameraModel> {
        self.cameras.iter_mut().find(|c| c.name == name)
    }

    pub fn mesh(&self, id: &str) -> Option<&MeshDescription> {
        self.meshes.iter().find(|m| m.id == id)
    }

    pub fn mesh_mut(&mut self, id: &str) -> Option<&mut MeshDescription> {
        self.meshes.iter_mut().find(|m| m.id == id)
    }

    pub fn view(&self, id: &str) -> Option<&ViewDescription> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn view_mut(&mut self, id: &str) -> Option<&mut ViewDescription> {
        self.views.iter_mut().find(|v| v.id == id)
    }
}

/// Request to commit a new planar quad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRequest {
    /// Mesh to extend, or `None` for a new free-standing mesh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_mesh: Option<MeshId>,
    pub points: [[f64; 3]; 4],
}
