//! End-to-end command flows through the JSON surface

use mb_server::{Bridge, DispatcherConfig, Response};
use serde_json::{Value, json};

fn send(bridge: &Bridge, payload: Value) -> Response {
    bridge.handle_json(&payload.to_string())
}

fn ok(bridge: &Bridge, payload: Value) -> Response {
    let response = send(bridge, payload);
    assert!(response.success, "command failed: {:?}", response.error);
    response
}

fn rectangle_contour(width: f32, height: f32) -> Value {
    json!([
        { "type": "line", "start": [0.0, 0.0], "end": [width, 0.0] },
        { "type": "line", "start": [width, 0.0], "end": [width, height] },
        { "type": "line", "start": [width, height], "end": [0.0, height] },
        { "type": "line", "start": [0.0, height], "end": [0.0, 0.0] }
    ])
}

#[test]
fn rectangle_sketch_extrudes_into_a_named_solid() {
    let bridge = Bridge::new();
    ok(&bridge, json!({ "command": "create_document", "name": "widget" }));
    ok(
        &bridge,
        json!({ "command": "create_datum_plane", "name": "P1", "type": "base", "plane": "xy" }),
    );

    let sketch = ok(
        &bridge,
        json!({ "command": "create_sketch_on_plane", "plane": "P1" }),
    );
    assert_eq!(sketch.result.unwrap()["name"], "P1_sketch");

    let contour = ok(
        &bridge,
        json!({
            "command": "add_contour_to_sketch",
            "sketch": "P1_sketch",
            "elements": rectangle_contour(100.0, 50.0),
            "fix_first_point_to_origin": true
        }),
    );
    let report = contour.result.unwrap();
    assert_eq!(report["applied_elements"], 4);
    assert_eq!(report["applied_constraints"], 1);

    let solid = ok(
        &bridge,
        json!({ "command": "extrude_sketch", "sketch": "P1_sketch", "distance": 20.0 }),
    );
    assert_eq!(solid.result.unwrap()["name"], "P1_sketch_solid");

    let info = ok(&bridge, json!({ "command": "get_object", "name": "P1_sketch_solid" }))
        .result
        .unwrap();
    let volume = info["volume"].as_f64().unwrap();
    assert!((volume - 100_000.0).abs() < 1.0, "volume was {volume}");
    let max = info["bounding_box"]["max"].as_array().unwrap();
    assert!((max[0].as_f64().unwrap() - 100.0).abs() < 1e-3);
    assert!((max[1].as_f64().unwrap() - 50.0).abs() < 1e-3);
    assert!((max[2].as_f64().unwrap() - 20.0).abs() < 1e-3);

    // The consumed sketch drops out of the default object listing.
    let objects = ok(&bridge, json!({ "command": "get_objects" })).result.unwrap();
    assert_eq!(objects.as_array().unwrap().len(), 1);
}

#[test]
fn failures_render_the_taxonomy_kind() {
    let bridge = Bridge::new();
    ok(&bridge, json!({ "command": "create_document", "name": "d" }));

    let missing = send(&bridge, json!({ "command": "get_object", "name": "nope" }));
    assert!(!missing.success);
    assert!(missing.error.unwrap().starts_with("NotFound: "));

    let unknown = send(&bridge, json!({ "command": "take_screenshot" }));
    assert!(!unknown.success);
    assert!(unknown.error.unwrap().starts_with("InvalidParameter: "));
}

#[test]
fn commands_need_an_active_or_explicit_document() {
    let bridge = Bridge::new();
    let response = send(&bridge, json!({ "command": "get_objects" }));
    assert!(!response.success);
    assert!(response.error.unwrap().starts_with("NotFound: "));

    // An explicit document routes without touching the active marker.
    ok(&bridge, json!({ "command": "create_document", "name": "a" }));
    ok(&bridge, json!({ "command": "create_document", "name": "b" }));
    ok(
        &bridge,
        json!({
            "command": "create_object", "document": "a",
            "primitive": { "shape": "box", "size": [10.0, 10.0, 10.0] },
            "name": "block"
        }),
    );

    let in_a = ok(&bridge, json!({ "command": "get_objects", "document": "a" }));
    assert_eq!(in_a.result.unwrap().as_array().unwrap().len(), 1);
    let in_b = ok(&bridge, json!({ "command": "get_objects" }));
    assert_eq!(in_b.result.unwrap().as_array().unwrap().len(), 0);
}

#[test]
fn explicit_name_conflicts_reject_by_default() {
    let bridge = Bridge::new();
    ok(&bridge, json!({ "command": "create_document", "name": "d" }));
    ok(
        &bridge,
        json!({ "command": "create_datum_plane", "name": "P1", "type": "base", "plane": "xy" }),
    );
    let dup = send(
        &bridge,
        json!({ "command": "create_datum_plane", "name": "P1", "type": "base", "plane": "xz" }),
    );
    assert!(!dup.success);
    assert!(dup.error.unwrap().starts_with("NameConflict: "));
}

#[test]
fn auto_rename_policy_applies_to_explicit_names() {
    let bridge = Bridge::new().with_config(DispatcherConfig {
        name_conflict_policy: mb_model::NamePolicy::AutoRename,
        ..DispatcherConfig::default()
    });
    ok(&bridge, json!({ "command": "create_document", "name": "d" }));
    ok(
        &bridge,
        json!({
            "command": "create_object",
            "primitive": { "shape": "sphere", "radius": 3.0 },
            "name": "ball"
        }),
    );
    let second = ok(
        &bridge,
        json!({
            "command": "create_object",
            "primitive": { "shape": "sphere", "radius": 4.0 },
            "name": "ball"
        }),
    );
    assert_eq!(second.result.unwrap()["name"], "ball_2");
}

#[test]
fn deleting_a_consumed_input_makes_it_an_invalid_reference() {
    let bridge = Bridge::new();
    ok(&bridge, json!({ "command": "create_document", "name": "d" }));
    ok(
        &bridge,
        json!({
            "command": "create_object",
            "primitive": { "shape": "box", "size": [20.0, 20.0, 20.0] },
            "name": "base"
        }),
    );
    ok(
        &bridge,
        json!({
            "command": "create_object",
            "primitive": { "shape": "box", "size": [5.0, 5.0, 5.0] },
            "name": "tool",
            "position": [100.0, 0.0, 0.0]
        }),
    );
    ok(&bridge, json!({ "command": "delete_object", "name": "tool" }));

    let cut = send(
        &bridge,
        json!({ "command": "boolean_cut", "base": "base", "tool": "tool" }),
    );
    assert!(!cut.success);
    assert!(cut.error.unwrap().starts_with("InvalidReference: "));
}

#[test]
fn constraint_assembly_solves_lock_and_distance() {
    let bridge = Bridge::new();
    ok(&bridge, json!({ "command": "create_document", "name": "d" }));
    ok(
        &bridge,
        json!({ "command": "create_assembly", "name": "asm", "model": "constraint" }),
    );
    ok(
        &bridge,
        json!({ "command": "add_assembly_part", "assembly": "asm", "part": "a", "mass": 1.0 }),
    );
    ok(
        &bridge,
        json!({ "command": "add_assembly_part", "assembly": "asm", "part": "b", "mass": 1.0 }),
    );
    ok(
        &bridge,
        json!({
            "command": "add_assembly_constraint", "assembly": "asm", "name": "pin_a",
            "type": "lock",
            "placement": { "position": [10.0, 0.0, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0] },
            "references": ["a.origin"]
        }),
    );
    ok(
        &bridge,
        json!({
            "command": "add_assembly_constraint", "assembly": "asm", "name": "gap",
            "type": "distance", "value": 5.0,
            "references": ["a.origin", "b.origin"]
        }),
    );

    let report = ok(&bridge, json!({ "command": "solve_assembly", "assembly": "asm" }))
        .result
        .unwrap();
    let placements = report["placements"].as_array().unwrap();
    assert_eq!(placements.len(), 2);
    assert_eq!(placements[1][0], "b");
    let bx = placements[1][1]["position"][0].as_f64().unwrap();
    assert!((bx - 15.0).abs() < 1e-3, "b.x was {bx}");

    // A second lock contradicting the distance turns into a solve failure
    // naming the unsatisfied constraint.
    ok(
        &bridge,
        json!({
            "command": "add_assembly_constraint", "assembly": "asm", "name": "pin_b",
            "type": "lock",
            "placement": { "position": [0.0, 0.0, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0] },
            "references": ["b.origin"]
        }),
    );
    let failed = send(&bridge, json!({ "command": "solve_assembly", "assembly": "asm" }));
    assert!(!failed.success);
    let error = failed.error.unwrap();
    assert!(error.starts_with("SolveFailed: "), "got {error}");
    assert!(error.contains("gap"));
}

#[test]
fn assembly_model_mismatch_is_an_invalid_parameter() {
    let bridge = Bridge::new();
    ok(&bridge, json!({ "command": "create_document", "name": "d" }));
    ok(
        &bridge,
        json!({ "command": "create_assembly", "name": "asm", "model": "hierarchy" }),
    );
    let response = send(
        &bridge,
        json!({ "command": "add_assembly_part", "assembly": "asm", "part": "a" }),
    );
    assert!(!response.success);
    let error = response.error.unwrap();
    assert!(error.starts_with("InvalidParameter: "));
    assert!(error.contains("hierarchy"));
}

#[test]
fn hierarchy_assembly_places_parts_and_reports_mass() {
    let bridge = Bridge::new();
    ok(&bridge, json!({ "command": "create_document", "name": "d" }));
    ok(
        &bridge,
        json!({ "command": "create_assembly", "name": "asm", "model": "hierarchy" }),
    );
    ok(
        &bridge,
        json!({ "command": "create_lcs", "assembly": "asm", "name": "root" }),
    );
    ok(
        &bridge,
        json!({
            "command": "insert_assembly_part", "assembly": "asm",
            "part": "base", "mass": 2.0, "target_lcs": "root",
            "material": "steel",
            "geometry": [{ "element": "top", "position": [0.0, 0.0, 50.0] }]
        }),
    );
    ok(
        &bridge,
        json!({ "command": "create_lcs", "assembly": "asm", "name": "mount" }),
    );
    ok(
        &bridge,
        json!({
            "command": "attach_lcs_to_geometry", "assembly": "asm",
            "lcs": "mount", "part": "base", "element": "top"
        }),
    );
    ok(
        &bridge,
        json!({
            "command": "insert_assembly_part", "assembly": "asm",
            "part": "cap", "mass": 1.0, "target_lcs": "mount",
            "position": [0.0, 0.0, 10.0], "material": "steel"
        }),
    );

    let parts = ok(&bridge, json!({ "command": "list_assembly_parts", "assembly": "asm" }))
        .result
        .unwrap();
    let cap = parts
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == "cap")
        .unwrap();
    let cap_z = cap["placement"]["position"][2].as_f64().unwrap();
    assert!((cap_z - 60.0).abs() < 1e-3, "cap.z was {cap_z}");

    let mass = ok(
        &bridge,
        json!({ "command": "calculate_assembly_mass", "assembly": "asm" }),
    )
    .result
    .unwrap();
    assert!((mass["total_mass"].as_f64().unwrap() - 3.0).abs() < 1e-6);
    assert_eq!(mass["part_count"], 2);

    let bom = ok(
        &bridge,
        json!({
            "command": "generate_bom", "assembly": "asm",
            "group_by": "material", "format": "csv"
        }),
    )
    .result
    .unwrap();
    assert!(bom.as_str().unwrap().contains("steel,2,"));

    let export = ok(&bridge, json!({ "command": "export_assembly", "assembly": "asm" }))
        .result
        .unwrap();
    assert_eq!(export["model"], "hierarchy");
    assert_eq!(export["parts"].as_array().unwrap().len(), 2);
}

#[test]
fn deleting_an_lcs_leaves_attached_parts_unresolved() {
    let bridge = Bridge::new();
    ok(&bridge, json!({ "command": "create_document", "name": "d" }));
    ok(
        &bridge,
        json!({ "command": "create_assembly", "name": "asm", "model": "hierarchy" }),
    );
    ok(
        &bridge,
        json!({ "command": "create_lcs", "assembly": "asm", "name": "root" }),
    );
    ok(
        &bridge,
        json!({
            "command": "insert_assembly_part", "assembly": "asm",
            "part": "base", "mass": 2.0, "target_lcs": "root"
        }),
    );
    ok(&bridge, json!({ "command": "delete_lcs", "assembly": "asm", "lcs": "root" }));

    let mass = send(
        &bridge,
        json!({ "command": "calculate_assembly_mass", "assembly": "asm" }),
    );
    assert!(!mass.success);
    assert!(mass.error.unwrap().starts_with("UnresolvedPlacement: "));
}
