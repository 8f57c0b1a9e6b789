//! JSON command protocol for scripted picking sessions.
//!
//! Each command maps onto one harness call; a script is a JSON array of
//! commands replayed in order.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use shared::SceneDescription;

use crate::error::EngineError;
use crate::harness::TestHarness;
use crate::tool::{PressOutcome, ReleaseOutcome};
use crate::viewport::picking::IntersectionResult;

/// A command a script can execute.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ScriptCommand {
    /// Button press at a viewport pixel
    Press { view: String, x: f64, y: f64 },
    /// Cursor move without a button held
    Move { view: String, x: f64, y: f64 },
    /// Cursor move with the button held
    Drag { view: String, x: f64, y: f64 },
    /// Button release
    Release { view: String },
    /// Abort the view's gesture
    Cancel { view: String },
    /// Retract the last free-face pick
    UndoPoint { view: String },
    /// Drop the view's session
    DeactivateView { view: String },
    /// Resize a view or bind it to another camera
    SetView {
        view: String,
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        height: Option<f64>,
        #[serde(default)]
        camera: Option<String>,
    },
    /// Change a camera's zoom window
    SetZoom {
        camera: String,
        #[serde(default)]
        zoom: Option<f64>,
        #[serde(default)]
        pan: Option<[f64; 2]>,
    },
    /// Mark a view focused or unfocused
    SetActive { view: String, active: bool },
    /// Replace the scene
    LoadScene { scene: SceneDescription },
    /// Undo the last committed face.
    Undo,
    /// Redo the last undone face.
    Redo,
    /// Inspect a view's session.
    Inspect { view: String },
    /// Export the scene as JSON.
    ExportScene,
}

/// Response from executing a command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResponse {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    fn ok_with_data(data: serde_json::Value) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            data: None,
        }
    }
}

impl From<EngineError> for CommandResponse {
    fn from(e: EngineError) -> Self {
        CommandResponse::err(e.to_string())
    }
}

fn vec2_json(p: DVec2) -> serde_json::Value {
    serde_json::json!([p.x, p.y])
}

fn face_json(face: &[DVec3; 4]) -> serde_json::Value {
    face.iter().map(|p| serde_json::json!([p.x, p.y, p.z])).collect()
}

fn intersection_json(hit: &IntersectionResult) -> serde_json::Value {
    match hit {
        IntersectionResult::None => serde_json::json!({ "kind": "none" }),
        IntersectionResult::Point(p) => serde_json::json!({
            "kind": "point",
            "mesh": p.mesh_id,
            "index": p.point_index,
        }),
        IntersectionResult::Edge(e) => serde_json::json!({
            "kind": "edge",
            "mesh": e.mesh_id,
            "a": e.point_index_a,
            "b": e.point_index_b,
            "distance": e.distance,
            "ratio": e.edge_ratio,
        }),
    }
}

/// Execute a single command on the harness.
pub fn execute_command(harness: &mut TestHarness, cmd: ScriptCommand) -> CommandResponse {
    match cmd {
        ScriptCommand::Press { view, x, y } => match harness.press(&view, x, y) {
            Ok(PressOutcome::PointAdded(count)) => CommandResponse::ok_with_data(
                serde_json::json!({ "outcome": "point_added", "count": count }),
            ),
            Ok(PressOutcome::ExtendStarted(edge)) => {
                CommandResponse::ok_with_data(serde_json::json!({
                    "outcome": "extend_started",
                    "mesh": edge.mesh_id,
                    "a": edge.point_index_a,
                    "b": edge.point_index_b,
                }))
            }
            Ok(PressOutcome::FaceCreated(face)) => CommandResponse::ok_with_data(serde_json::json!({
                "outcome": "face_created",
                "face": face_json(&face),
            })),
            Ok(PressOutcome::Retracted(reason)) => CommandResponse::ok_with_data(serde_json::json!({
                "outcome": "retracted",
                "reason": reason.to_string(),
            })),
            Err(e) => e.into(),
        },

        ScriptCommand::Move { view, x, y } => match harness.move_to(&view, x, y) {
            Ok(hit) => CommandResponse::ok_with_data(intersection_json(&hit)),
            Err(e) => e.into(),
        },

        ScriptCommand::Drag { view, x, y } => match harness.drag(&view, x, y) {
            Ok(preview) => CommandResponse::ok_with_data(serde_json::json!({
                "preview": preview.as_ref().map(face_json),
            })),
            Err(e) => e.into(),
        },

        ScriptCommand::Release { view } => match harness.release(&view) {
            Ok(ReleaseOutcome::Idle) => {
                CommandResponse::ok_with_data(serde_json::json!({ "outcome": "idle" }))
            }
            Ok(ReleaseOutcome::NothingToCommit) => {
                CommandResponse::ok_with_data(serde_json::json!({ "outcome": "nothing_to_commit" }))
            }
            Ok(ReleaseOutcome::Committed(face)) => CommandResponse::ok_with_data(serde_json::json!({
                "outcome": "committed",
                "face": face_json(&face),
            })),
            Err(e) => e.into(),
        },

        ScriptCommand::Cancel { view } => {
            harness.cancel(&view);
            CommandResponse::ok()
        }

        ScriptCommand::UndoPoint { view } => {
            let removed = harness.undo_last_point(&view);
            CommandResponse::ok_with_data(serde_json::json!({ "removed": removed.map(vec2_json) }))
        }

        ScriptCommand::DeactivateView { view } => {
            let removed = harness.deactivate_view(&view);
            CommandResponse::ok_with_data(serde_json::json!({ "removed": removed }))
        }

        ScriptCommand::SetView {
            view,
            width,
            height,
            camera,
        } => match harness.set_view(&view, width, height, camera) {
            Ok(()) => CommandResponse::ok(),
            Err(e) => e.into(),
        },

        ScriptCommand::SetZoom { camera, zoom, pan } => match harness.set_zoom(&camera, zoom, pan) {
            Ok(()) => CommandResponse::ok(),
            Err(e) => e.into(),
        },

        ScriptCommand::SetActive { view, active } => {
            harness.set_active(&view, active);
            CommandResponse::ok()
        }

        ScriptCommand::LoadScene { scene } => match harness.load_scene(scene) {
            Ok(()) => CommandResponse::ok_with_data(
                serde_json::json!({ "mesh_count": harness.mesh_count() }),
            ),
            Err(e) => e.into(),
        },

        ScriptCommand::Undo => {
            let success = harness.undo();
            CommandResponse::ok_with_data(serde_json::json!({ "undone": success }))
        }

        ScriptCommand::Redo => {
            let success = harness.redo();
            CommandResponse::ok_with_data(serde_json::json!({ "redone": success }))
        }

        ScriptCommand::Inspect { view } => {
            let overlays: Vec<&str> = match harness.render_requests(&view) {
                Ok(requests) => requests.iter().map(|r| r.kind()).collect(),
                Err(e) => return e.into(),
            };
            let session = harness.session(&view).map(|s| {
                let build_points: Vec<_> = s.build_points().iter().map(|p| vec2_json(*p)).collect();
                serde_json::json!({
                    "state": format!("{:?}", s.state()),
                    "build_points": build_points,
                    "intersection": intersection_json(s.intersection()),
                    "preview": s.preview().map(face_json),
                    "generation": s.generation(),
                })
            });
            CommandResponse::ok_with_data(serde_json::json!({
                "session": session,
                "overlays": overlays,
                "mesh_count": harness.mesh_count(),
                "face_count": harness.face_count(),
                "errors": harness.errors(),
            }))
        }

        ScriptCommand::ExportScene => {
            let json = harness.export_scene_json();
            CommandResponse::ok_with_data(serde_json::json!({ "scene_json": json }))
        }
    }
}

/// Parse and execute a single JSON command string.
pub fn execute_json(harness: &mut TestHarness, json: &str) -> Result<CommandResponse, String> {
    let cmd: ScriptCommand =
        serde_json::from_str(json).map_err(|e| format!("Invalid command JSON: {e}"))?;
    Ok(execute_command(harness, cmd))
}

/// Parse and execute multiple JSON commands (array).
pub fn execute_json_batch(
    harness: &mut TestHarness,
    json: &str,
) -> Result<Vec<CommandResponse>, String> {
    let cmds: Vec<ScriptCommand> =
        serde_json::from_str(json).map_err(|e| format!("Invalid commands JSON: {e}"))?;
    Ok(cmds.into_iter().map(|cmd| execute_command(harness, cmd)).collect())
}
