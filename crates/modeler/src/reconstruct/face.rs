//! Planar quad reconstruction from picks made in one calibrated view.

use glam::{DVec2, DVec3};

use super::plane::Plane;
use crate::build::GeometrySnapshot;
use crate::error::{DegenerateReason, Result};
use crate::state::settings::PickSettings;
use crate::viewport::camera::ViewProjection;

/// Four ordered, coplanar world points
pub type Face3D = [DVec3; 4];

/// Picks closer than this fraction of the polygon perimeter count as one.
const MIN_PICK_SEPARATION: f64 = 1e-4;
/// Corners closer than this fraction of the face diameter count as one.
const MIN_CORNER_SEPARATION: f64 = 1e-6;
/// Smallest extension area, relative to the squared edge length.
const MIN_EXTEND_AREA: f64 = 1e-6;

/// Signed shoelace area of a 2D polygon
fn polygon_area(points: &[DVec2]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f64>()
        * 0.5
}

fn polygon_perimeter(points: &[DVec2]) -> f64 {
    let n = points.len();
    (0..n).map(|i| points[i].distance(points[(i + 1) % n])).sum()
}

/// Even-odd point-in-polygon test
fn polygon_contains(points: &[DVec2], p: DVec2) -> bool {
    if points.len() < 3 {
        return false;
    }
    let n = points.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Reject polygons whose area is negligible next to their perimeter, or
/// where two picks sit on top of each other.
fn check_not_collinear(
    points: &[DVec2],
    settings: &PickSettings,
) -> std::result::Result<(), DegenerateReason> {
    let perimeter = polygon_perimeter(points);
    if perimeter <= f64::EPSILON {
        return Err(DegenerateReason::CollinearPicks);
    }
    let min_separation = perimeter * MIN_PICK_SEPARATION;
    for (i, a) in points.iter().enumerate() {
        if points[i + 1..].iter().any(|b| a.distance(*b) <= min_separation) {
            return Err(DegenerateReason::CollinearPicks);
        }
    }
    let compactness = polygon_area(points).abs() / (perimeter * perimeter);
    if compactness < settings.min_pick_compactness {
        return Err(DegenerateReason::CollinearPicks);
    }
    Ok(())
}

/// Reject faces where two corners collapsed onto one point.
fn check_distinct_corners(face: &Face3D) -> std::result::Result<(), DegenerateReason> {
    let mut diameter = 0.0_f64;
    for i in 0..4 {
        for j in i + 1..4 {
            diameter = diameter.max(face[i].distance(face[j]));
        }
    }
    for i in 0..4 {
        for j in i + 1..4 {
            if face[i].distance(face[j]) <= diameter * MIN_CORNER_SEPARATION {
                return Err(DegenerateReason::CoincidentCorners(i, j));
            }
        }
    }
    Ok(())
}

/// Reject an extension `[B, A, A', B']` whose area vanishes next to the
/// edge, i.e. the new edge landed back on `A -> B`.
fn check_extension_area(
    edge_a: DVec3,
    edge_b: DVec3,
    new: [DVec3; 2],
) -> std::result::Result<[DVec3; 2], DegenerateReason> {
    let [new_a, new_b] = new;
    let area = 0.5 * (new_a - edge_b).cross(new_b - edge_a).length();
    if area <= edge_a.distance_squared(edge_b) * MIN_EXTEND_AREA {
        return Err(DegenerateReason::ZeroHeight);
    }
    Ok(new)
}

/// Fit the support plane from cloud points seen inside the picked polygon.
pub fn support_plane(
    projection: &ViewProjection,
    snapshot: &GeometrySnapshot,
    polygon: &[DVec2],
    settings: &PickSettings,
) -> std::result::Result<Plane, DegenerateReason> {
    let support: Vec<DVec3> = snapshot
        .point_cloud()
        .iter()
        .copied()
        .filter(|p| projection.depth(*p) > 0.0)
        .filter(|p| polygon_contains(polygon, projection.world_to_camera(*p)))
        .collect();

    if support.len() < settings.min_support_points.max(3) {
        return Err(DegenerateReason::InsufficientSupport {
            found: support.len(),
            required: settings.min_support_points.max(3),
        });
    }
    tracing::debug!("Fitting face plane through {} support points", support.len());
    Plane::fit(&support).ok_or(DegenerateReason::CollinearSupport)
}

/// Intersect the viewing rays of camera-space points with a plane.
pub fn project_onto_plane<const N: usize>(
    projection: &ViewProjection,
    plane: &Plane,
    points: [DVec2; N],
    settings: &PickSettings,
) -> std::result::Result<[DVec3; N], DegenerateReason> {
    let mut out = [DVec3::ZERO; N];
    for (i, p) in points.iter().enumerate() {
        let ray = projection.camera_ray(*p);
        out[i] = plane.intersect_ray(&ray, settings.min_ray_plane_cos, i)?;
    }
    Ok(out)
}

/// Reconstruct a planar quad from 3 or 4 camera-space picks.
///
/// The rays through the picks are intersected with the plane fitted to the
/// scene points seen inside the picked polygon. With 3 picks the 4th corner
/// completes the parallelogram `P3 = P0 + P2 - P1`. Input order is kept.
pub fn reconstruct_face(
    projection: &ViewProjection,
    snapshot: &GeometrySnapshot,
    points: &[DVec2],
    settings: &PickSettings,
) -> Result<Face3D> {
    if !(3..=4).contains(&points.len()) {
        return Err(DegenerateReason::PickCount(points.len()).into());
    }
    check_not_collinear(points, settings)?;

    let plane = support_plane(projection, snapshot, points, settings)?;

    let face = if let [p0, p1, p2] = *points {
        let [a, b, c] = project_onto_plane(projection, &plane, [p0, p1, p2], settings)?;
        [a, b, c, a + c - b]
    } else {
        let picks = [points[0], points[1], points[2], points[3]];
        project_onto_plane(projection, &plane, picks, settings)?
    };
    check_distinct_corners(&face)?;
    Ok(face)
}

/// Solve for the translated copy `A'`, `B'` of the 3D edge `A -> B` whose
/// projections land on the picks `new_a`, `new_b`.
///
/// Least squares on `λb·rb − λa·ra = B − A` over the two viewing rays, then
/// snapped to an exact parallelogram around the solved midpoint so the
/// resulting quad `[B, A, A', B']` is planar and keeps the edge length.
pub fn reconstruct_extension(
    projection: &ViewProjection,
    edge_a: DVec3,
    edge_b: DVec3,
    new_a: DVec2,
    new_b: DVec2,
    settings: &PickSettings,
) -> Result<[DVec3; 2]> {
    let h = edge_b - edge_a;
    let h_len = h.length();
    if h_len <= f64::EPSILON {
        return Err(DegenerateReason::IllConditioned.into());
    }

    let ra = projection.camera_ray(new_a).direction;
    let rb = projection.camera_ray(new_b).direction;
    let c = ra.dot(rb);
    let det = 1.0 - c * c;
    if det < 1e-12 {
        return Err(DegenerateReason::IllConditioned.into());
    }

    let u = -ra.dot(h);
    let w = rb.dot(h);
    let lambda_a = (u + c * w) / det;
    let lambda_b = (c * u + w) / det;
    if lambda_a <= 0.0 {
        return Err(DegenerateReason::BehindCamera(0).into());
    }
    if lambda_b <= 0.0 {
        return Err(DegenerateReason::BehindCamera(1).into());
    }

    let residual = (rb * lambda_b - ra * lambda_a - h).length() / h_len;
    if residual > settings.max_extend_residual {
        return Err(DegenerateReason::ResidualTooLarge(residual).into());
    }

    let center = projection.center();
    let mid = center + (ra * lambda_a + rb * lambda_b) * 0.5;
    Ok(check_extension_area(edge_a, edge_b, [mid - h * 0.5, mid + h * 0.5])?)
}

/// Extend the edge `A -> B` onto the plane of the face it borders.
///
/// Used when the constrained solve fails: the new picks are intersected
/// with the plane fitted through `face_points`.
pub fn extend_on_plane(
    projection: &ViewProjection,
    face_points: &[DVec3],
    edge: [DVec3; 2],
    new_a: DVec2,
    new_b: DVec2,
    settings: &PickSettings,
) -> Result<[DVec3; 2]> {
    let plane = Plane::fit(face_points).ok_or(DegenerateReason::CollinearSupport)?;
    let points = project_onto_plane(projection, &plane, [new_a, new_b], settings)?;
    Ok(check_extension_area(edge[0], edge[1], points)?)
}
