//! Camera projection between the three coordinate spaces.
//!
//! * view space: viewport pixels, origin top-left, +y down
//! * camera space: image plane in units of image height, origin at the image
//!   center, +y up
//! * world space: scene coordinates
//!
//! The viewport shows the camera-space window centered at `pan` whose height
//! is `zoom`, so one pixel spans `zoom / viewport_height` camera units.

use glam::{DQuat, DVec2, DVec3};
use shared::{CameraModel, ViewId};

use crate::error::{EngineError, Result};

/// A ray in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    /// Unit direction
    pub direction: DVec3,
}

impl Ray {
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }
}

/// Viewport geometry of one camera view. Recreated per interaction cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewContext {
    pub id: ViewId,
    /// Width in device pixels
    pub width: f64,
    /// Height in device pixels
    pub height: f64,
}

impl ViewContext {
    pub fn new(id: impl Into<ViewId>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }
}

/// Validated camera/view pair. Every conversion is a pure function of it.
#[derive(Debug, Clone)]
pub struct ViewProjection {
    view: ViewContext,
    camera_name: String,
    position: DVec3,
    /// Camera-to-world rotation
    orientation: DQuat,
    focal: f64,
    image_size: DVec2,
    principal: DVec2,
    zoom: f64,
    pan: DVec2,
}

fn invalid(reason: impl Into<String>) -> EngineError {
    EngineError::InvalidCamera {
        reason: reason.into(),
    }
}

impl ViewProjection {
    /// Bind a camera to a viewport, rejecting unusable calibrations.
    pub fn new(view: &ViewContext, camera: &CameraModel) -> Result<Self> {
        let size_ok = view.width.is_finite() && view.height.is_finite();
        if !size_ok || view.width <= 0.0 || view.height <= 0.0 {
            return Err(invalid(format!(
                "viewport '{}' has size {}x{}",
                view.id, view.width, view.height
            )));
        }
        if !camera.focal_length.is_finite() || camera.focal_length <= 0.0 {
            return Err(invalid(format!(
                "'{}' has focal length {}",
                camera.name, camera.focal_length
            )));
        }
        let [w, h] = camera.image_size;
        if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            return Err(invalid(format!("'{}' has image size {w}x{h}", camera.name)));
        }
        if !camera.zoom.is_finite() || camera.zoom <= 0.0 {
            return Err(invalid(format!("'{}' has zoom {}", camera.name, camera.zoom)));
        }

        let position = DVec3::from_array(camera.position);
        let pan = DVec2::from_array(camera.pan);
        let principal = DVec2::from_array(camera.principal_point());
        if !position.is_finite() || !pan.is_finite() || !principal.is_finite() {
            return Err(invalid(format!("'{}' has non-finite parameters", camera.name)));
        }

        let q = DQuat::from_array(camera.orientation);
        let len = q.length();
        if !len.is_finite() || len < 1e-12 {
            return Err(invalid(format!("'{}' has a zero orientation", camera.name)));
        }

        Ok(Self {
            view: view.clone(),
            camera_name: camera.name.clone(),
            position,
            orientation: q / len,
            focal: camera.focal_length,
            image_size: DVec2::new(w, h),
            principal,
            zoom: camera.zoom,
            pan,
        })
    }

    pub fn view(&self) -> &ViewContext {
        &self.view
    }

    pub fn view_id(&self) -> &str {
        &self.view.id
    }

    pub fn camera_name(&self) -> &str {
        &self.camera_name
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Camera center in world space
    pub fn center(&self) -> DVec3 {
        self.position
    }

    /// Camera-space units covered by one viewport pixel
    pub fn units_per_pixel(&self) -> f64 {
        self.zoom / self.view.height
    }

    pub fn view_to_camera(&self, px: f64, py: f64) -> DVec2 {
        let upp = self.units_per_pixel();
        DVec2::new(
            self.pan.x + (px - self.view.width * 0.5) * upp,
            self.pan.y - (py - self.view.height * 0.5) * upp,
        )
    }

    pub fn camera_to_view(&self, point: DVec2) -> DVec2 {
        let ppu = self.view.height / self.zoom;
        DVec2::new(
            self.view.width * 0.5 + (point.x - self.pan.x) * ppu,
            self.view.height * 0.5 - (point.y - self.pan.y) * ppu,
        )
    }

    fn to_camera_frame(&self, world: DVec3) -> DVec3 {
        self.orientation.inverse() * (world - self.position)
    }

    /// Distance in front of the camera along its viewing axis.
    /// Non-positive means the point is behind the camera.
    pub fn depth(&self, world: DVec3) -> f64 {
        -self.to_camera_frame(world).z
    }

    /// Project a world point onto the image plane.
    /// Only meaningful when `depth(world) > 0`.
    pub fn world_to_camera(&self, world: DVec3) -> DVec2 {
        let local = self.to_camera_frame(world);
        let depth = -local.z;
        let image = DVec2::new(
            self.focal * local.x / depth + self.principal.x,
            -self.focal * local.y / depth + self.principal.y,
        );
        self.image_to_camera(image)
    }

    pub fn world_to_view(&self, world: DVec3) -> DVec2 {
        self.camera_to_view(self.world_to_camera(world))
    }

    /// Back-project a camera-space point into a world ray through the camera center.
    pub fn camera_ray(&self, point: DVec2) -> Ray {
        let image = self.camera_to_image(point);
        let local = DVec3::new(
            (image.x - self.principal.x) / self.focal,
            -(image.y - self.principal.y) / self.focal,
            -1.0,
        );
        Ray {
            origin: self.position,
            direction: (self.orientation * local).normalize(),
        }
    }

    fn image_to_camera(&self, image: DVec2) -> DVec2 {
        let h = self.image_size.y;
        DVec2::new(
            (image.x - self.image_size.x * 0.5) / h,
            (h * 0.5 - image.y) / h,
        )
    }

    fn camera_to_image(&self, point: DVec2) -> DVec2 {
        let h = self.image_size.y;
        DVec2::new(
            point.x * h + self.image_size.x * 0.5,
            h * 0.5 - point.y * h,
        )
    }
}
