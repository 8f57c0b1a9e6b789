// Library crate: the picking and reconstruction engine, plus the headless
// host used by integration tests and scripts.

pub mod build;
pub mod command;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod reconstruct;
pub mod state;
pub mod tool;
pub mod validation;

/// Projection, picking and overlay requests for calibrated camera views.
pub mod viewport {
    pub mod camera;
    pub mod overlays;
    pub mod picking;
}

pub use error::{DegenerateReason, EngineError, Result};
