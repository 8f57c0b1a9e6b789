//! Integration tests for the ScriptCommand JSON protocol.
//!
//! Tests the full command pipeline: JSON string -> parse -> execute -> response.

use facade_modeler_lib::command::{execute_json, execute_json_batch, CommandResponse};
use facade_modeler_lib::fixtures::*;
use facade_modeler_lib::harness::TestHarness;

fn run(h: &mut TestHarness, json: &str) -> CommandResponse {
    execute_json(h, json).unwrap()
}

#[test]
fn test_command_free_face_via_json_batch() {
    let mut h = TestHarness::with_scene(wall_scene());

    let json = r#"[
        {"command": "press", "view": "front_view", "x": 200, "y": 200},
        {"command": "press", "view": "front_view", "x": 400, "y": 200},
        {"command": "press", "view": "front_view", "x": 400, "y": 400},
        {"command": "press", "view": "front_view", "x": 200, "y": 400},
        {"command": "inspect", "view": "front_view"}
    ]"#;

    let responses = execute_json_batch(&mut h, json).unwrap();
    assert_eq!(responses.len(), 5);
    for resp in &responses {
        assert!(resp.success, "Failed: {:?}", resp.error);
    }

    assert_eq!(responses[2].data.as_ref().unwrap()["count"], 3);
    let created = responses[3].data.as_ref().unwrap();
    assert_eq!(created["outcome"], "face_created");
    assert_eq!(created["face"].as_array().unwrap().len(), 4);

    let inspect = responses[4].data.as_ref().unwrap();
    assert_eq!(inspect["mesh_count"], 1);
    assert_eq!(inspect["face_count"], 1);
    assert!(inspect["session"]["build_points"].as_array().unwrap().is_empty());
}

#[test]
fn test_command_extend_edge_script() {
    let mut h = TestHarness::with_scene(wall_scene_with_quad());

    let json = r#"[
        {"command": "press", "view": "front_view", "x": 550, "y": 500},
        {"command": "drag", "view": "front_view", "x": 550, "y": 560},
        {"command": "inspect", "view": "front_view"},
        {"command": "release", "view": "front_view"}
    ]"#;

    let responses = execute_json_batch(&mut h, json).unwrap();
    for resp in &responses {
        assert!(resp.success, "Failed: {:?}", resp.error);
    }

    let started = responses[0].data.as_ref().unwrap();
    assert_eq!(started["outcome"], "extend_started");
    assert_eq!(started["mesh"], "wall");

    assert!(responses[1].data.as_ref().unwrap()["preview"].is_array());

    let inspect = responses[2].data.as_ref().unwrap();
    assert_eq!(inspect["session"]["state"], "ExtendingEdge");
    assert_eq!(inspect["overlays"], serde_json::json!(["preview_quad", "extend_cursor"]));

    let released = responses[3].data.as_ref().unwrap();
    assert_eq!(released["outcome"], "committed");
    // Commit order starts with the picked edge reversed
    assert_eq!(released["face"][0], serde_json::json!([1.0, 0.0, 0.0]));
    assert_eq!(released["face"][1], serde_json::json!([0.0, 0.0, 0.0]));
    assert_eq!(h.face_count(), 2);
}

#[test]
fn test_command_drag_onto_press_point_commits_nothing() {
    let mut h = TestHarness::with_scene(wall_scene_with_quad());

    let json = r#"[
        {"command": "press", "view": "front_view", "x": 550, "y": 500},
        {"command": "drag", "view": "front_view", "x": 550, "y": 500},
        {"command": "release", "view": "front_view"}
    ]"#;

    let responses = execute_json_batch(&mut h, json).unwrap();
    for resp in &responses {
        assert!(resp.success, "Failed: {:?}", resp.error);
    }
    assert!(responses[1].data.as_ref().unwrap()["preview"].is_null());
    assert_eq!(responses[2].data.as_ref().unwrap()["outcome"], "nothing_to_commit");
    assert_eq!(h.face_count(), 1);
    assert_eq!(h.errors().len(), 1);
}

#[test]
fn test_command_move_reports_intersection() {
    let mut h = TestHarness::with_scene(wall_scene_with_quad());

    let resp = run(&mut h, r#"{"command": "move", "view": "front_view", "x": 501, "y": 499}"#);
    let data = resp.data.unwrap();
    assert_eq!(data["kind"], "point");
    assert_eq!(data["mesh"], "wall");
    assert_eq!(data["index"], 0);

    let resp = run(&mut h, r#"{"command": "move", "view": "front_view", "x": 550, "y": 501}"#);
    let data = resp.data.unwrap();
    assert_eq!(data["kind"], "edge");
    assert_eq!(data["a"], 0);
    assert_eq!(data["b"], 1);

    let resp = run(&mut h, r#"{"command": "move", "view": "front_view", "x": 100, "y": 100}"#);
    assert_eq!(resp.data.unwrap()["kind"], "none");
}

#[test]
fn test_command_undo_redo_via_json() {
    let mut h = TestHarness::with_scene(wall_scene_with_quad());
    execute_json_batch(
        &mut h,
        r#"[
            {"command": "press", "view": "front_view", "x": 550, "y": 500},
            {"command": "drag", "view": "front_view", "x": 550, "y": 560},
            {"command": "release", "view": "front_view"}
        ]"#,
    )
    .unwrap();
    assert_eq!(h.face_count(), 2);

    let resp = run(&mut h, r#"{"command": "undo"}"#);
    assert!(resp.success);
    assert_eq!(resp.data.unwrap()["undone"], true);
    assert_eq!(h.face_count(), 1);

    let resp = run(&mut h, r#"{"command": "redo"}"#);
    assert_eq!(resp.data.unwrap()["redone"], true);
    assert_eq!(h.face_count(), 2);

    let resp = run(&mut h, r#"{"command": "redo"}"#);
    assert_eq!(resp.data.unwrap()["redone"], false);
}

#[test]
fn test_command_inactive_view_rejects_press() {
    let mut h = TestHarness::with_scene(wall_scene());

    let responses = execute_json_batch(
        &mut h,
        r#"[
            {"command": "set_active", "view": "front_view", "active": false},
            {"command": "press", "view": "front_view", "x": 100, "y": 100}
        ]"#,
    )
    .unwrap();
    assert!(responses[0].success);
    assert!(!responses[1].success);
    assert!(responses[1].error.as_ref().unwrap().contains("front_view"));
    assert!(h.session("front_view").is_none());
    assert!(h.errors().is_empty());
}

#[test]
fn test_command_load_scene() {
    let mut h = TestHarness::new();
    let cmd = serde_json::json!({
        "command": "load_scene",
        "scene": wall_scene_with_quad(),
    });

    let resp = execute_json(&mut h, &cmd.to_string()).unwrap();
    assert!(resp.success, "Failed: {:?}", resp.error);
    assert_eq!(resp.data.unwrap()["mesh_count"], 1);

    // The loaded geometry is pickable straight away
    let resp = run(&mut h, r#"{"command": "move", "view": "front_view", "x": 600, "y": 400}"#);
    assert_eq!(resp.data.unwrap()["kind"], "point");
}

#[test]
fn test_command_undo_point() {
    let mut h = TestHarness::with_scene(wall_scene());
    run(&mut h, r#"{"command": "press", "view": "front_view", "x": 100, "y": 120}"#);

    let resp = run(&mut h, r#"{"command": "undo_point", "view": "front_view"}"#);
    assert_eq!(resp.data.unwrap()["removed"], serde_json::json!([100.0, 120.0]));

    let resp = run(&mut h, r#"{"command": "undo_point", "view": "front_view"}"#);
    assert!(resp.data.unwrap()["removed"].is_null());
}

#[test]
fn test_command_set_zoom_changes_snap_target() {
    let mut h = TestHarness::with_scene(wall_scene_with_quad());

    // Zooming in 2x around the centre puts world (1, 1) at pixel (700, 300)
    let resp = run(&mut h, r#"{"command": "set_zoom", "camera": "front", "zoom": 0.5}"#);
    assert!(resp.success, "Failed: {:?}", resp.error);

    let resp = run(&mut h, r#"{"command": "move", "view": "front_view", "x": 700, "y": 300}"#);
    let data = resp.data.unwrap();
    assert_eq!(data["kind"], "point");
    assert_eq!(data["index"], 2);
}

#[test]
fn test_command_unknown_camera_fails() {
    let mut h = TestHarness::with_scene(wall_scene());
    let resp = run(&mut h, r#"{"command": "set_zoom", "camera": "nope", "zoom": 2.0}"#);
    assert!(!resp.success);
    assert!(resp.error.unwrap().contains("nope"));

    // A view bound to a missing camera has nothing to display
    run(&mut h, r#"{"command": "set_view", "view": "front_view", "camera": "nope"}"#);
    let resp = run(&mut h, r#"{"command": "press", "view": "front_view", "x": 1, "y": 1}"#);
    assert!(!resp.success);
}

#[test]
fn test_command_invalid_json_error() {
    let mut h = TestHarness::new();
    let result = execute_json(&mut h, "not valid json");
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Invalid command JSON"));
}
