use super::*;

fn sample_model() -> (MemoryModel, String, String, String) {
    let mut model = MemoryModel::new("sample");
    let crm = model
        .create_element(ElementType::ApplicationComponent, "CRM")
        .expect("create crm");
    let billing = model
        .create_element(ElementType::ApplicationComponent, "Billing")
        .expect("create billing");
    let rel = model
        .create_relationship(RelationshipType::Serving, &crm, &billing, "")
        .expect("create relationship");
    (model, crm, billing, rel)
}

#[test]
fn new_elements_land_in_layer_folder() {
    let (model, crm, _, rel) = sample_model();
    assert_eq!(model.folder_of(&crm), Some("folder-application"));
    assert_eq!(model.folder_of(&rel), Some("folder-relations"));
}

#[test]
fn delete_refuses_while_relationships_are_attached() {
    let (mut model, crm, _, rel) = sample_model();
    let err = model.delete(&crm).expect_err("attached relationship blocks delete");
    assert_eq!(
        err,
        StoreError::StillConnected {
            id: crm.clone(),
            count: 1
        }
    );
    model.delete(&rel).expect("delete relationship");
    model.delete(&crm).expect("delete element");
    assert!(model.entity(&crm).is_none());
    assert!(model.folder_of(&crm).is_none());
}

#[test]
fn cascade_lists_relationships_on_relationships_deepest_first() {
    let (mut model, crm, billing, rel) = sample_model();
    let note = model
        .create_element(ElementType::Goal, "Keep CRM fed")
        .expect("create goal");
    let on_rel = model
        .create_relationship(RelationshipType::Association, &note, &rel, "")
        .expect("associate goal with relationship");

    assert_eq!(model.attached_relationships(&crm), vec![rel.clone()]);
    assert_eq!(model.cascade_relationships(&crm), vec![on_rel.clone(), rel.clone()]);
    assert_eq!(model.cascade_relationships(&note), vec![on_rel.clone()]);

    for id in model.cascade_relationships(&crm) {
        model.delete(&id).expect("delete in cascade order");
    }
    model.delete(&crm).expect("delete crm");
    assert!(model.relationships.is_empty());
    assert!(model.element(&billing).is_some());
}

#[test]
fn deleting_an_element_removes_its_visuals_and_connections() {
    let (mut model, crm, billing, rel) = sample_model();
    let view = model.create_view("Landscape").expect("create view");
    let bounds = Bounds {
        x: 30,
        y: 30,
        width: 120,
        height: 55,
    };
    let a = model.add_to_view(&view, &crm, bounds).expect("place crm");
    let b = model.add_to_view(&view, &billing, bounds).expect("place billing");
    model
        .connect_in_view(&view, &rel, &a, &b)
        .expect("connect");

    model.delete(&rel).expect("delete relationship");
    assert!(model.view_connections(&view).expect("connections").is_empty());
    model.delete(&crm).expect("delete crm");
    let children = model.view_children(&view).expect("children");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].entity_id, billing);
}

#[test]
fn connect_in_view_requires_visuals_on_that_view() {
    let (mut model, crm, billing, rel) = sample_model();
    let first = model.create_view("First").expect("view");
    let second = model.create_view("Second").expect("view");
    let bounds = Bounds {
        x: 0,
        y: 0,
        width: 120,
        height: 55,
    };
    let a = model.add_to_view(&first, &crm, bounds).expect("place");
    let b = model.add_to_view(&second, &billing, bounds).expect("place");
    let err = model
        .connect_in_view(&first, &rel, &a, &b)
        .expect_err("visual on other view");
    assert!(matches!(err, StoreError::VisualNotOnView { .. }));
}

#[test]
fn add_to_view_rejects_relationships() {
    let (mut model, _, _, rel) = sample_model();
    let view = model.create_view("V").expect("view");
    let err = model
        .add_to_view(
            &view,
            &rel,
            Bounds {
                x: 0,
                y: 0,
                width: 120,
                height: 55,
            },
        )
        .expect_err("relationship placement");
    assert!(matches!(err, StoreError::WrongKind { expected: "element", .. }));
}

#[test]
fn move_to_folder_reparents_entity() {
    let (mut model, crm, _, _) = sample_model();
    let core = model
        .add_folder("folder-application", "Core")
        .expect("add folder");
    model.move_to_folder(&core, &crm).expect("move");
    assert_eq!(model.folder_of(&crm), Some(core.as_str()));
    let children = model.child_folders("folder-application").expect("children");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name, "Core");
}

#[test]
fn properties_round_through_any_entity_kind() {
    let (mut model, crm, _, rel) = sample_model();
    model.set_property(&crm, "owner", "ops").expect("set");
    model.set_property(&rel, "protocol", "https").expect("set");
    assert_eq!(model.property(&crm, "owner").as_deref(), Some("ops"));
    assert!(model.remove_property(&crm, "owner").expect("remove"));
    assert!(!model.remove_property(&crm, "owner").expect("remove again"));
    assert_eq!(
        model.set_property("missing", "k", "v"),
        Err(StoreError::NotFound("missing".to_string()))
    );
}

#[test]
fn model_file_round_trips_through_disk() {
    let (model, _, _, _) = sample_model();
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("model.json");
    model.write(&path).expect("write model");
    let loaded = MemoryModel::load(&path).expect("load model");
    assert_eq!(loaded, model);
}

#[test]
fn allocated_ids_skip_ids_already_in_use() {
    let mut model = MemoryModel::new("ids");
    model.elements.push(Element {
        id: "element-1".to_string(),
        element_type: ElementType::Node,
        name: "Existing".to_string(),
        documentation: String::new(),
        properties: BTreeMap::new(),
    });
    let id = model
        .create_element(ElementType::Node, "New")
        .expect("create");
    assert_eq!(id, "element-2");
}
