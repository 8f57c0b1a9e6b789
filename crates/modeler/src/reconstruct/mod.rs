//! Planar face reconstruction
//!
//! Turns camera-space picks from a single view into 3D quads: free faces are
//! fitted to the point cloud, edge extensions are solved against the edge
//! they grow from.

mod face;
mod plane;

pub use face::{extend_on_plane, reconstruct_extension, reconstruct_face, support_plane, Face3D};
pub use plane::Plane;
