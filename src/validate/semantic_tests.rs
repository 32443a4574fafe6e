use crate::archimate::{ElementType, RelationshipType};
use crate::model::{EntityStore, MemoryModel, ViewStore};
use crate::oracle::ArchimateRules;
use crate::validate::{validate, Phase, Scope, ValidationReport};
use serde_json::{json, Value};

struct Fixture {
    model: MemoryModel,
    crm: String,
    billing: String,
    serving: String,
    view: String,
}

fn fixture() -> Fixture {
    let mut model = MemoryModel::new("fixture");
    let crm = model
        .create_element(ElementType::ApplicationComponent, "CRM")
        .expect("crm");
    let billing = model
        .create_element(ElementType::ApplicationComponent, "Billing")
        .expect("billing");
    let serving = model
        .create_relationship(RelationshipType::Serving, &crm, &billing, "")
        .expect("serving");
    let view = model.create_view("Landscape").expect("view");
    Fixture {
        model,
        crm,
        billing,
        serving,
        view,
    }
}

fn check(model: &MemoryModel, actions: Value) -> ValidationReport {
    check_scoped(model, actions, None)
}

fn check_scoped(model: &MemoryModel, actions: Value, scope: Option<&Scope>) -> ValidationReport {
    let raw = json!({
        "schema_version": "2.0",
        "status": "ready",
        "summary": "semantic test",
        "questions": null,
        "actions": actions
    });
    let report = validate(&raw, model, &ArchimateRules, scope);
    assert!(report.schema_valid, "schema errors: {:?}", report.errors);
    report
}

fn messages(issues: &[crate::validate::Issue]) -> Vec<String> {
    issues.iter().map(ToString::to_string).collect()
}

#[test]
fn forward_refs_resolve_in_order() {
    let fx = fixture();
    let report = check(
        &fx.model,
        json!([
            { "op": "create_element", "type": "Application Component", "name": "X", "ref_id": "e1" },
            { "op": "create_element", "type": "Application Component", "name": "Y", "ref_id": "e2" },
            { "op": "create_relationship", "relationship_type": "Serving",
              "source_id": "e1", "target_id": "e2" },
            { "op": "create_view", "name": "New", "ref_id": "v1" },
            { "op": "add_to_view", "view_id": "v1", "element_id": "e1" }
        ]),
    );
    assert!(report.is_valid(), "{:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
}

#[test]
fn use_before_declaration_is_an_error() {
    let fx = fixture();
    let report = check(
        &fx.model,
        json!([
            { "op": "rename_element", "id": "e1", "name": "Early" },
            { "op": "create_element", "type": "Node", "name": "Late", "ref_id": "e1" }
        ]),
    );
    assert!(!report.semantic_valid);
    assert_eq!(
        messages(&report.errors),
        vec!["actions[0].id: 'e1' not found in the model or earlier ref_ids"]
    );
    assert_eq!(report.errors[0].phase, Phase::Semantic);
}

#[test]
fn duplicate_refs_are_blocking_across_namespaces() {
    let fx = fixture();
    for actions in [
        json!([
            { "op": "create_element", "type": "Node", "name": "A", "ref_id": "dup" },
            { "op": "create_view", "name": "V", "ref_id": "dup" }
        ]),
        json!([
            { "op": "create_view", "name": "V", "ref_id": "dup" },
            { "op": "create_element", "type": "Node", "name": "A", "ref_id": "dup" }
        ]),
    ] {
        let report = check(&fx.model, actions);
        assert_eq!(
            messages(&report.errors),
            vec!["actions[1].ref_id: duplicate ref_id 'dup'"]
        );
    }
}

#[test]
fn ref_outranks_live_id_with_the_same_string() {
    let fx = fixture();
    let report = check(
        &fx.model,
        json!([
            { "op": "create_view", "name": "Shadow", "ref_id": fx.crm },
            { "op": "add_to_view", "view_id": fx.crm, "element_id": fx.billing }
        ]),
    );
    assert!(report.is_valid(), "{:?}", report.errors);
    assert_eq!(
        messages(&report.warnings),
        vec![format!(
            "actions[0].ref_id: ref_id '{}' shadows an existing model id",
            fx.crm
        )]
    );
}

#[test]
fn deleted_ids_cannot_be_referenced_by_any_later_op() {
    let fx = fixture();
    let later_ops = [
        json!({ "op": "rename_element", "id": fx.crm, "name": "Gone" }),
        json!({ "op": "set_property", "id": fx.crm, "key": "k", "value": "v" }),
        json!({ "op": "remove_property", "id": fx.crm, "key": "k" }),
        json!({ "op": "set_documentation", "id": fx.crm, "documentation": "" }),
        json!({ "op": "move_to_folder", "id": fx.crm, "folder_path": "Application" }),
        json!({ "op": "delete_element", "id": fx.crm }),
        json!({ "op": "add_to_view", "view_id": fx.view, "element_id": fx.crm }),
        json!({ "op": "create_relationship", "relationship_type": "Serving",
                "source_id": fx.billing, "target_id": fx.crm }),
        json!({ "op": "delete_relationship", "id": fx.serving }),
    ];
    for later in later_ops {
        let op = later["op"].clone();
        let report = check(
            &fx.model,
            json!([{ "op": "delete_element", "id": fx.crm }, later]),
        );
        assert!(!report.semantic_valid, "{op} should fail");
        assert!(
            report.errors[0].message.contains("was deleted by action 0"),
            "{op}: {:?}",
            report.errors
        );
    }
}

#[test]
fn delete_element_warns_about_cascade_and_rejects_relationships() {
    let fx = fixture();
    let report = check(&fx.model, json!([{ "op": "delete_element", "id": fx.billing }]));
    assert!(report.is_valid());
    assert_eq!(
        messages(&report.warnings),
        vec![format!(
            "actions[0].id: deleting '{}' also deletes 1 attached relationship(s)",
            fx.billing
        )]
    );

    let report = check(&fx.model, json!([{ "op": "delete_element", "id": fx.serving }]));
    assert_eq!(
        messages(&report.errors),
        vec![format!(
            "actions[0].id: '{}' is a relationship; use delete_relationship",
            fx.serving
        )]
    );
}

#[test]
fn cascade_reaches_relationships_attached_to_relationships() {
    let mut fx = fixture();
    let goal = fx
        .model
        .create_element(ElementType::Goal, "Faster billing")
        .expect("goal");
    let on_serving = fx
        .model
        .create_relationship(RelationshipType::Association, &goal, &fx.serving, "")
        .expect("association");

    let report = check(
        &fx.model,
        json!([
            { "op": "delete_element", "id": fx.crm },
            { "op": "set_property", "id": on_serving, "key": "k", "value": "v" }
        ]),
    );
    assert_eq!(
        messages(&report.warnings),
        vec![format!(
            "actions[0].id: deleting '{}' also deletes 2 attached relationship(s)",
            fx.crm
        )]
    );
    assert_eq!(
        messages(&report.errors),
        vec![format!("actions[1].id: '{on_serving}' was deleted by action 0")]
    );
}

#[test]
fn delete_relationship_consults_only_the_live_model() {
    let fx = fixture();
    let report = check(
        &fx.model,
        json!([
            { "op": "create_element", "type": "Node", "name": "N", "ref_id": "n1" },
            { "op": "delete_relationship", "id": "n1" },
            { "op": "delete_relationship", "id": fx.crm },
            { "op": "delete_relationship", "id": fx.serving }
        ]),
    );
    assert_eq!(
        messages(&report.errors),
        vec![
            "actions[1].id: relationship 'n1' not found in the model".to_string(),
            format!(
                "actions[2].id: '{}' is not a relationship (Application Component)",
                fx.crm
            ),
        ]
    );
}

#[test]
fn incompatible_relationship_is_only_a_warning() {
    let fx = fixture();
    let report = check(
        &fx.model,
        json!([
            { "op": "create_element", "type": "Goal", "name": "Grow", "ref_id": "g" },
            { "op": "create_element", "type": "Node", "name": "Server", "ref_id": "n" },
            { "op": "create_relationship", "relationship_type": "Triggering",
              "source_id": "g", "target_id": "n" }
        ]),
    );
    assert!(report.semantic_valid, "{:?}", report.errors);
    assert_eq!(report.warnings.len(), 1);
    let warning = &report.warnings[0];
    assert_eq!(warning.field.as_deref(), Some("relationship_type"));
    assert!(
        warning
            .message
            .starts_with("Triggering is not permitted from Goal to Node; permitted: "),
        "{}",
        warning.message
    );
    assert!(warning.message.contains("Association"));
}

#[test]
fn relationship_endpoints_are_labelled_and_views_rejected() {
    let fx = fixture();
    let report = check(
        &fx.model,
        json!([
            { "op": "create_relationship", "relationship_type": "Flow",
              "source_id": "ghost", "target_id": fx.view }
        ]),
    );
    assert_eq!(
        messages(&report.errors),
        vec![
            "actions[0].source_id: 'ghost' not found in the model or earlier ref_ids".to_string(),
            format!(
                "actions[0].target_id: '{}' is a view and cannot be a relationship endpoint",
                fx.view
            ),
        ]
    );
}

#[test]
fn add_to_view_checks_both_sides() {
    let fx = fixture();
    let report = check(
        &fx.model,
        json!([
            { "op": "create_element", "type": "Node", "name": "N", "ref_id": "n1" },
            { "op": "add_to_view", "view_id": "n1", "element_id": fx.crm },
            { "op": "add_to_view", "view_id": fx.crm, "element_id": "n1" },
            { "op": "add_to_view", "view_id": fx.view, "element_id": fx.serving },
            { "op": "add_to_view", "view_id": fx.view, "element_id": fx.view }
        ]),
    );
    let errors = messages(&report.errors);
    assert_eq!(errors.len(), 4, "{errors:?}");
    assert_eq!(errors[0], "actions[1].view_id: ref_id 'n1' names an element, not a view");
    assert_eq!(
        errors[1],
        format!("actions[2].view_id: '{}' is not a view (Application Component)", fx.crm)
    );
    assert!(errors[2].contains("connected automatically"), "{errors:?}");
    assert!(errors[3].contains("cannot be placed on a view"), "{errors:?}");
}

#[test]
fn repeated_mutations_warn_without_blocking() {
    let fx = fixture();
    let report = check(
        &fx.model,
        json!([
            { "op": "rename_element", "id": fx.crm, "name": "A" },
            { "op": "rename_element", "id": fx.crm, "name": "B" },
            { "op": "set_property", "id": fx.crm, "key": "owner", "value": "x" },
            { "op": "set_property", "id": fx.crm, "key": "owner", "value": "y" },
            { "op": "set_property", "id": fx.crm, "key": "tier", "value": "1" },
            { "op": "set_documentation", "id": fx.crm, "documentation": "one" },
            { "op": "set_documentation", "id": fx.crm, "documentation": "two" }
        ]),
    );
    assert!(report.is_valid());
    let warned: Vec<Option<usize>> = report.warnings.iter().map(|w| w.action_index).collect();
    assert_eq!(warned, vec![Some(1), Some(3), Some(6)]);
}

#[test]
fn scope_limits_elements_but_not_views() {
    let fx = fixture();
    let scope = Scope::new([fx.crm.clone()]);
    let report = check_scoped(
        &fx.model,
        json!([
            { "op": "rename_element", "id": fx.crm, "name": "ok" },
            { "op": "rename_element", "id": fx.billing, "name": "no" },
            { "op": "add_to_view", "view_id": fx.view, "element_id": fx.crm }
        ]),
        Some(&scope),
    );
    assert_eq!(
        messages(&report.errors),
        vec![format!(
            "actions[1].id: '{}' is outside the selected scope",
            fx.billing
        )]
    );
}

#[test]
fn semantic_phase_reports_every_action() {
    let mut model = MemoryModel::new("empty");
    let view = model.create_view("V").expect("view");
    let report = check(
        &model,
        json!([
            { "op": "rename_element", "id": "a", "name": "A" },
            { "op": "rename_element", "id": "b", "name": "B" },
            { "op": "add_to_view", "view_id": view, "element_id": "c" }
        ]),
    );
    assert_eq!(report.errors.len(), 3);
    assert!(model.view_children(&view).expect("children").is_empty());
}
