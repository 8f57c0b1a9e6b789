//! Planes: least-squares fitting and ray intersection.

use glam::DVec3;
use nalgebra::{Matrix3, SymmetricEigen};

use crate::error::DegenerateReason;
use crate::viewport::camera::Ray;

/// Plane through `origin` with unit `normal`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub origin: DVec3,
    pub normal: DVec3,
}

impl Plane {
    pub fn from_point_normal(origin: DVec3, normal: DVec3) -> Option<Self> {
        let normal = normal.try_normalize()?;
        Some(Self { origin, normal })
    }

    /// Least-squares plane through a point set: centroid plus the eigenvector
    /// of the scatter matrix with the smallest eigenvalue.
    ///
    /// Returns `None` for fewer than 3 points or when the points are
    /// (nearly) collinear.
    pub fn fit(points: &[DVec3]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let centroid = points.iter().copied().sum::<DVec3>() / points.len() as f64;

        let scatter = Matrix3::from_fn(|r, c| {
            points
                .iter()
                .map(|p| {
                    let d = *p - centroid;
                    d[r] * d[c]
                })
                .sum::<f64>()
        });
        let eigen = SymmetricEigen::new(scatter);

        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
        let [smallest, middle, largest] = order;

        // Spread along the second axis must be a real fraction of the first.
        let values = &eigen.eigenvalues;
        if values[largest] <= f64::EPSILON || values[middle] <= values[largest] * 1e-10 {
            return None;
        }

        let axis = eigen.eigenvectors.column(smallest);
        Self::from_point_normal(centroid, DVec3::new(axis[0], axis[1], axis[2]))
    }

    pub fn signed_distance(&self, point: DVec3) -> f64 {
        (point - self.origin).dot(self.normal)
    }

    /// Orthogonal projection of a point onto the plane
    pub fn project(&self, point: DVec3) -> DVec3 {
        point - self.normal * self.signed_distance(point)
    }

    /// Intersect a ray with the plane.
    ///
    /// `min_cos` is the smallest accepted |cos| between ray and normal;
    /// `index` tags the error with the pick the ray came from.
    pub fn intersect_ray(
        &self,
        ray: &Ray,
        min_cos: f64,
        index: usize,
    ) -> Result<DVec3, DegenerateReason> {
        let denom = ray.direction.dot(self.normal);
        if denom.abs() < min_cos {
            return Err(DegenerateReason::RayParallelToPlane(index));
        }
        let t = (self.origin - ray.origin).dot(self.normal) / denom;
        if t <= 0.0 {
            return Err(DegenerateReason::BehindCamera(index));
        }
        Ok(ray.at(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_fit_xy_plane() {
        let pts = [
            DVec3::new(0.0, 0.0, 2.0),
            DVec3::new(1.0, 0.0, 2.0),
            DVec3::new(1.0, 3.0, 2.0),
            DVec3::new(-2.0, 1.0, 2.0),
        ];
        let plane = Plane::fit(&pts).unwrap();
        assert!((plane.normal.z.abs() - 1.0).abs() < EPS);
        for p in pts {
            assert!(plane.signed_distance(p).abs() < EPS);
        }
    }

    #[test]
    fn test_fit_tilted_plane() {
        let n = DVec3::new(1.0, -2.0, 0.5).normalize();
        let u = n.any_orthonormal_vector();
        let w = n.cross(u);
        let o = DVec3::new(3.0, -1.0, 4.0);
        let pts: Vec<DVec3> = [(0.0, 0.0), (2.0, 1.0), (-1.0, 3.0), (4.0, -2.0), (0.5, 0.5)]
            .iter()
            .map(|&(a, b)| o + u * a + w * b)
            .collect();
        let plane = Plane::fit(&pts).unwrap();
        assert!((plane.normal.dot(n).abs() - 1.0).abs() < 1e-9);
        assert!(plane.signed_distance(o).abs() < 1e-9);
    }

    #[test]
    fn test_fit_least_squares_noise() {
        let pts = [
            DVec3::new(0.0, 0.0, 0.01),
            DVec3::new(1.0, 0.0, -0.01),
            DVec3::new(1.0, 1.0, 0.01),
            DVec3::new(0.0, 1.0, -0.01),
        ];
        let plane = Plane::fit(&pts).unwrap();
        assert!(plane.normal.z.abs() > 0.999);
    }

    #[test]
    fn test_fit_rejects_collinear() {
        let pts = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(2.0, 2.0, 2.0),
        ];
        assert!(Plane::fit(&pts).is_none());
    }

    #[test]
    fn test_fit_rejects_too_few_and_coincident() {
        assert!(Plane::fit(&[DVec3::ZERO, DVec3::X]).is_none());
        assert!(Plane::fit(&[DVec3::ONE; 5]).is_none());
    }

    #[test]
    fn test_project() {
        let plane = Plane::from_point_normal(DVec3::ZERO, DVec3::Z).unwrap();
        let p = plane.project(DVec3::new(1.0, 2.0, 3.0));
        assert!((p - DVec3::new(1.0, 2.0, 0.0)).length() < EPS);
    }

    #[test]
    fn test_intersect_ray() {
        let plane = Plane::from_point_normal(DVec3::ZERO, DVec3::Z).unwrap();
        let ray = Ray {
            origin: DVec3::new(0.0, 0.0, 10.0),
            direction: DVec3::new(0.1, 0.0, -1.0).normalize(),
        };
        let hit = plane.intersect_ray(&ray, 1e-3, 0).unwrap();
        assert!((hit - DVec3::new(1.0, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn test_intersect_ray_parallel_and_behind() {
        let plane = Plane::from_point_normal(DVec3::ZERO, DVec3::Z).unwrap();
        let parallel = Ray {
            origin: DVec3::new(0.0, 0.0, 10.0),
            direction: DVec3::X,
        };
        assert_eq!(
            plane.intersect_ray(&parallel, 1e-3, 2),
            Err(DegenerateReason::RayParallelToPlane(2))
        );
        let away = Ray {
            origin: DVec3::new(0.0, 0.0, 10.0),
            direction: DVec3::Z,
        };
        assert_eq!(
            plane.intersect_ray(&away, 1e-3, 1),
            Err(DegenerateReason::BehindCamera(1))
        );
    }
}
