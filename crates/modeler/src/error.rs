//! Error types for the picking and reconstruction engine.

use thiserror::Error;

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Why a set of picks could not be turned into a planar face.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DegenerateReason {
    /// Face reconstruction takes 3 or 4 picks.
    #[error("expected 3 or 4 points, got {0}")]
    PickCount(usize),

    /// The picked polygon has (almost) no area.
    #[error("picked points are collinear")]
    CollinearPicks,

    /// Not enough scene points under the picked polygon to fit a plane.
    #[error("{found} support points under the face, {required} required")]
    InsufficientSupport {
        /// Points found inside the polygon.
        found: usize,
        /// Configured minimum.
        required: usize,
    },

    /// The support points do not span a plane.
    #[error("support points do not define a plane")]
    CollinearSupport,

    /// A pick's viewing ray grazes the fitted plane.
    #[error("ray through point {0} is parallel to the face plane")]
    RayParallelToPlane(usize),

    /// A pick's viewing ray meets the plane behind the camera.
    #[error("point {0} lands behind the camera")]
    BehindCamera(usize),

    /// The constrained edge-extend system has no stable solution.
    #[error("edge extension is ill-conditioned")]
    IllConditioned,

    /// The constrained edge-extend solution strays too far from the picks.
    #[error("edge extension residual {0:.3} exceeds tolerance")]
    ResidualTooLarge(f64),

    /// Two corners of the reconstructed face land on the same point.
    #[error("face corners {0} and {1} coincide")]
    CoincidentCorners(usize, usize),

    /// The extended edge did not move off the edge it grows from.
    #[error("extended edge lies on the original edge")]
    ZeroHeight,
}

/// Errors that can occur while picking or building faces.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Camera or viewport cannot be used for projection.
    #[error("invalid camera: {reason}")]
    InvalidCamera {
        /// What is wrong with it.
        reason: String,
    },

    /// No geometry snapshot is held, so nothing can be picked.
    #[error("no active scene context")]
    NoSession,

    /// No camera or viewport is known for the view.
    #[error("no display data for view '{view}'")]
    NoDisplayData {
        /// View identifier.
        view: String,
    },

    /// The host reports the view is not the focused one.
    #[error("view '{view}' is not active")]
    InactiveView {
        /// View identifier.
        view: String,
    },

    /// Picks cannot be reconciled into a planar quad.
    #[error("degenerate geometry: {0}")]
    Degenerate(#[from] DegenerateReason),

    /// The face-creation service refused the geometry.
    #[error("face creation rejected: {0}")]
    CommitRejected(String),

    /// A gesture is running; geometry cannot be swapped under it.
    #[error("cannot replace geometry while view '{view}' is mid-gesture")]
    GestureInProgress {
        /// View holding the gesture.
        view: String,
    },

    /// Cached indices belong to a different geometry snapshot.
    #[error("stale geometry: gesture started on generation {started}, cache is at {current}")]
    StaleGeometry {
        /// Generation recorded at gesture start.
        started: u64,
        /// Generation currently held.
        current: u64,
    },

    /// Mesh not present in the cache or scene.
    #[error("unknown mesh '{0}'")]
    UnknownMesh(String),
}

impl EngineError {
    /// Precondition failures abort silently; everything else is worth surfacing.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            EngineError::NoSession
                | EngineError::NoDisplayData { .. }
                | EngineError::InactiveView { .. }
                | EngineError::InvalidCamera { .. }
        )
    }
}
