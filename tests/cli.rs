//! End-to-end tests for the archplan CLI.
//!
//! Each test runs the built binary against a temp workspace holding a JSON
//! model and plan files.

mod common;

use archplan::archimate::ElementType;
use archplan::model::EntityStore;
use common::{read_model, Workspace};
use serde_json::{json, Value};

fn ready_plan(actions: Value) -> Value {
    json!({
        "schema_version": "2.0",
        "status": "ready",
        "summary": "cli test",
        "questions": null,
        "actions": actions
    })
}

fn portal_plan() -> Value {
    ready_plan(json!([
        { "op": "create_element", "type": "Application Component", "name": "Portal", "ref_id": "portal" },
        { "op": "create_element", "type": "ApplicationService", "name": "Login", "ref_id": "login" },
        { "op": "create_relationship", "relationship_type": "Realization",
          "source_id": "portal", "target_id": "login" },
        { "op": "create_view", "name": "Overview", "ref_id": "overview" },
        { "op": "add_to_view", "view_id": "overview", "element_id": "portal" },
        { "op": "add_to_view", "view_id": "overview", "element_id": "login" }
    ]))
}

#[test]
fn schema_command_prints_flattened_schema() {
    let workspace = Workspace::new();
    let result = workspace.run(&["schema"]);
    assert!(result.success, "stderr: {}", result.stderr);
    let schema = result.json();
    assert_eq!(schema["type"], "object");
    assert!(schema["properties"]["actions"]["items"]["properties"]["op"]["enum"]
        .as_array()
        .expect("op enum")
        .contains(&json!("add_to_view")));

    let out = workspace.path("schema/plan.schema.json");
    let result = workspace.run(&["schema", "--out", out.to_str().expect("utf8 path")]);
    assert!(result.success);
    assert!(result.stderr.contains("wrote"));
    assert!(out.is_file());
}

#[test]
fn config_command_writes_a_loadable_default_config() {
    let workspace = Workspace::new();
    let result = workspace.run(&["config"]);
    assert!(result.success, "stderr: {}", result.stderr);
    let config = result.json();
    assert_eq!(config["schema_version"], "2.0");
    assert_eq!(config["stop_on_error"], true);
    assert_eq!(config["auto_connect"], true);

    let out = workspace.path("archplan/config.json");
    let result = workspace.run(&["config", "--out", out.to_str().expect("utf8 path")]);
    assert!(result.success, "stderr: {}", result.stderr);

    let plan = workspace.write_plan("plan.json", &portal_plan());
    let model = workspace.model_path();
    let result = workspace.run(&[
        "validate",
        "--plan",
        plan.to_str().expect("utf8 path"),
        "--model",
        model.to_str().expect("utf8 path"),
        "--config",
        out.to_str().expect("utf8 path"),
    ]);
    assert!(result.success, "stdout: {}\nstderr: {}", result.stdout, result.stderr);
    assert!(!result.stderr.contains("differs from configured"));
}

#[test]
fn normalize_unwraps_envelopes_and_nulls_foreign_fields() {
    let workspace = Workspace::new();
    let inner = ready_plan(json!([
        { "op": "rename_element", "id": "x", "name": "New", "type": "Node", "key": "k" }
    ]));
    let envelope = json!({
        "result": format!("Here is the plan:\n```json\n{inner}\n```")
    });
    let path = workspace.write_plan("response.json", &envelope);

    let result = workspace.run(&["normalize", "--plan", path.to_str().expect("utf8 path")]);
    assert!(result.success, "stderr: {}", result.stderr);
    let action = &result.json()["actions"][0];
    assert_eq!(action["op"], "rename_element");
    assert_eq!(action["name"], "New");
    assert_eq!(action["type"], Value::Null);
    assert_eq!(action["key"], Value::Null);
}

#[test]
fn validate_reports_failures_with_nonzero_exit() {
    let workspace = Workspace::new();
    let plan = workspace.write_plan(
        "plan.json",
        &ready_plan(json!([
            { "op": "create_element", "type": "Unicorn", "name": "X" },
            { "op": "teleport_element", "id": "x" }
        ])),
    );
    let plan = plan.to_str().expect("utf8 path");
    let model = workspace.model_path();
    let model = model.to_str().expect("utf8 path");

    let result = workspace.run(&["validate", "--plan", plan, "--model", model]);
    assert!(!result.success);
    assert!(result.stdout.contains("schema: failed"));
    assert!(result.stdout.contains("semantic: skipped"));
    assert!(result
        .stdout
        .contains("actions[0].type: unknown element type 'Unicorn'"));
    assert!(result.stdout.contains("actions[1].op: unknown op 'teleport_element'"));

    let result = workspace.run(&["validate", "--plan", plan, "--model", model, "--json"]);
    assert!(!result.success);
    let report = result.json();
    assert_eq!(report["schema_valid"], false);
    assert_eq!(report["semantic_valid"], false);
    assert_eq!(report["errors"].as_array().expect("errors").len(), 2);
}

#[test]
fn validate_scope_rejects_ids_outside_selection() {
    let workspace = Workspace::new();
    let mut model = workspace.model();
    let crm = model
        .create_element(ElementType::ApplicationComponent, "CRM")
        .expect("create crm");
    let billing = model
        .create_element(ElementType::ApplicationComponent, "Billing")
        .expect("create billing");
    workspace.write_model(&model);

    let plan = workspace.write_plan(
        "plan.json",
        &ready_plan(json!([
            { "op": "rename_element", "id": crm, "name": "CRM 2" },
            { "op": "rename_element", "id": billing, "name": "Billing 2" }
        ])),
    );
    let model_path = workspace.model_path();
    let result = workspace.run(&[
        "validate",
        "--plan",
        plan.to_str().expect("utf8 path"),
        "--model",
        model_path.to_str().expect("utf8 path"),
        "--scope",
        crm.as_str(),
    ]);
    assert!(!result.success);
    assert!(result.stdout.contains("semantic: failed"));
    assert!(result
        .stdout
        .contains(&format!("actions[1].id: '{billing}' is outside the selected scope")));
}

#[test]
fn preview_describes_without_writing() {
    let workspace = Workspace::new();
    let before = workspace.model();
    let plan = workspace.write_plan("plan.json", &portal_plan());
    let model = workspace.model_path();

    let result = workspace.run(&[
        "preview",
        "--plan",
        plan.to_str().expect("utf8 path"),
        "--model",
        model.to_str().expect("utf8 path"),
    ]);
    assert!(result.success, "stderr: {}", result.stderr);
    assert!(result
        .stdout
        .contains("+ [0] Create Application Component \"Portal\""));
    assert!(result.stdout.contains("+ [3] Create view \"Overview\""));
    assert!(result.stdout.contains("applied=6 failed=0 skipped=0"));
    assert_eq!(workspace.model(), before);
}

#[test]
fn apply_writes_model_and_connects_view() {
    let workspace = Workspace::new();
    let plan = workspace.write_plan("plan.json", &portal_plan());
    let model = workspace.model_path();
    let out = workspace.path("out/model.next.json");

    let result = workspace.run(&[
        "apply",
        "--plan",
        plan.to_str().expect("utf8 path"),
        "--model",
        model.to_str().expect("utf8 path"),
        "--out",
        out.to_str().expect("utf8 path"),
        "--json",
    ]);
    assert!(result.success, "stderr: {}", result.stderr);
    let summary = result.json();
    assert_eq!(summary["ok"], true);
    assert_eq!(summary["applied"], 6);
    assert_eq!(summary["auto_connected"], 1);

    let updated = read_model(&out);
    assert_eq!(updated.elements.len(), 2);
    assert_eq!(updated.relationships.len(), 1);
    let view = &updated.views[0];
    assert_eq!(view.name, "Overview");
    assert_eq!(view.children.len(), 2);
    assert_eq!(view.connections.len(), 1);
    assert_eq!(view.connections[0].relationship_id, updated.relationships[0].id);

    // --out leaves the input model untouched.
    assert!(workspace.model().elements.is_empty());
}

#[test]
fn config_can_disable_auto_connect() {
    let workspace = Workspace::new();
    let plan = workspace.write_plan("plan.json", &portal_plan());
    let config = workspace.write_text("config.json", r#"{"auto_connect": false}"#);
    let model = workspace.model_path();

    let result = workspace.run(&[
        "apply",
        "--plan",
        plan.to_str().expect("utf8 path"),
        "--model",
        model.to_str().expect("utf8 path"),
        "--config",
        config.to_str().expect("utf8 path"),
    ]);
    assert!(result.success, "stderr: {}", result.stderr);
    assert!(result.stdout.contains("auto_connected=0"));
    let updated = workspace.model();
    assert_eq!(updated.relationships.len(), 1);
    assert!(updated.views[0].connections.is_empty());
}

#[test]
fn apply_refuses_plans_needing_clarification() {
    let workspace = Workspace::new();
    let before = workspace.model();
    let plan = workspace.write_plan(
        "plan.json",
        &json!({
            "schema_version": "2.0",
            "status": "needs_clarification",
            "summary": "Which system?",
            "questions": ["Which CRM should be renamed?"],
            "actions": []
        }),
    );
    let model = workspace.model_path();

    let result = workspace.run(&[
        "apply",
        "--plan",
        plan.to_str().expect("utf8 path"),
        "--model",
        model.to_str().expect("utf8 path"),
    ]);
    assert!(!result.success);
    assert!(result
        .stdout
        .contains("plan needs clarification before it can run"));
    assert!(result.stdout.contains("  ? Which CRM should be renamed?"));
    assert!(result.stderr.contains("plan not executed"));
    assert_eq!(workspace.model(), before);
}

#[test]
fn apply_refuses_invalid_plans_before_touching_the_model() {
    let workspace = Workspace::new();
    let before = workspace.model();
    let plan = workspace.write_plan(
        "plan.json",
        &ready_plan(json!([
            { "op": "create_element", "type": "Node", "name": "Server", "ref_id": "srv" },
            { "op": "rename_element", "id": "ghost", "name": "Nobody" }
        ])),
    );
    let model = workspace.model_path();

    let result = workspace.run(&[
        "apply",
        "--plan",
        plan.to_str().expect("utf8 path"),
        "--model",
        model.to_str().expect("utf8 path"),
    ]);
    assert!(!result.success);
    assert!(result
        .stderr
        .contains("actions[1].id: 'ghost' not found in the model or earlier ref_ids"));
    assert!(result.stderr.contains("plan failed validation (1 error(s))"));
    assert_eq!(workspace.model(), before);
}
