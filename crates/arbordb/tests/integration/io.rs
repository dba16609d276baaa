//! Import/export integration tests.

use arbordb::{Database, Entity, Value};

use crate::common;

#[test]
fn export_then_import_reproduces_the_database() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let trial = common::trial_type(&db);
    let observer = common::observer_type(&db);

    let e1 = common::insert_experiment(&db, &experiment, "E1");
    let t1 = common::insert_trial(&db, &trial, 2, e1);
    let mut alice = Entity::new(observer);
    alice.set_attribute("name", "Alice").expect("valid");
    let o = db.insert(&mut alice).expect("insert");
    db.attach(t1, "observed", o).expect("attach");
    db.put_data(t1, "raw", Some("text/plain"), b"samples".to_vec()).expect("put data");

    let mut buffer = Vec::new();
    let exported = db.export_json(&mut buffer).expect("export");
    assert_eq!(exported.types, 3);
    assert_eq!(exported.entities, 3);
    assert_eq!(exported.relations, 1);

    let fresh = Database::in_memory().expect("fresh db");
    let imported = fresh.import_json(buffer.as_slice()).expect("import");
    assert_eq!(imported.types, exported.types);
    assert_eq!(imported.entities, exported.entities);
    assert_eq!(imported.relations, exported.relations);

    // Hierarchy survives.
    let experiments = fresh.find_all("Experiment").expect("find");
    assert_eq!(experiments.len(), 1);
    assert_eq!(experiments[0].attribute("project"), Some(&Value::from("E1")));
    let e_id = experiments[0].id.expect("saved");
    let children = fresh.children(e_id).expect("children");
    assert_eq!(children.len(), 1);

    // Attributes, attachments, and data survive.
    let trial_entity = fresh.get(children[0]).expect("get").expect("present");
    assert_eq!(trial_entity.attribute("rt"), Some(&Value::from(2i64)));
    let attachments = fresh.attachments(children[0]).expect("attachments");
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].label, "observed");
    let attached = fresh
        .get(attachments[0].target)
        .expect("get")
        .expect("present");
    assert_eq!(attached.attribute("name"), Some(&Value::from("Alice")));

    let record = fresh.get_data(children[0], "raw").expect("get").expect("present");
    assert_eq!(record.bytes, b"samples");
    assert_eq!(record.mimetype.as_deref(), Some("text/plain"));

    // Unique ids travel with the entities.
    let original = db.get(t1).expect("get").expect("present");
    assert!(fresh
        .get_by_unique_id(&original.unique_id)
        .expect("lookup")
        .is_some());
}

#[test]
fn malformed_documents_are_rejected_atomically() {
    let db = common::db();
    common::experiment_type(&db);

    // The second object references an unregistered type, so the whole
    // import rolls back, including the first object.
    let doc = r#"{
        "objects": [
            { "type": "Experiment", "parameters": { "project": "E1" } },
            { "type": "Unregistered" }
        ]
    }"#;

    db.import_json(doc.as_bytes()).expect_err("unknown type");
    assert_eq!(db.count("Experiment", &[]).expect("count"), 0);
}

#[test]
fn import_resolves_id_references_against_existing_entities() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    common::observer_type(&db);
    let e = common::insert_experiment(&db, &experiment, "E1");

    let doc = format!(
        r#"{{
            "objects": [
                {{ "type": "Observer", "ref": "alice", "parameters": {{ "name": "Alice" }} }}
            ],
            "relations": [
                {{ "relation": "context", "name": "observed", "from": "id:{}", "to": "alice" }}
            ]
        }}"#,
        e.as_u64()
    );

    db.import_json(doc.as_bytes()).expect("import");
    let attachments = db.attachments(e).expect("attachments");
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].label, "observed");
}
