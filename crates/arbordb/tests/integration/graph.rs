//! Graph structure integration tests: hierarchy, attachments, data
//! payloads, and deletion semantics.

use arbordb::{Entity, Error, GraphError, Value};

use crate::common;

#[test]
fn parent_and_children_round_trip() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let trial = common::trial_type(&db);

    let e1 = common::insert_experiment(&db, &experiment, "E1");
    let t1 = common::insert_trial(&db, &trial, 1, e1);
    let t2 = common::insert_trial(&db, &trial, 2, e1);

    assert_eq!(db.parent(t1).expect("parent"), Some(e1));
    assert_eq!(db.children(e1).expect("children"), vec![t1, t2]);
    assert_eq!(db.parent(e1).expect("parent"), None);
}

#[test]
fn mutual_parent_cycle_is_rejected_and_leaves_no_trace() {
    let db = common::db();
    let experiment = common::experiment_type(&db);

    let a = common::insert_experiment(&db, &experiment, "A");
    let b = common::insert_experiment(&db, &experiment, "B");

    db.set_parent(a, b, false).expect("first link");
    let err = db.set_parent(b, a, false).expect_err("cycle");
    assert!(matches!(err, Error::Graph(GraphError::Circularity { .. })));

    // The failed unit of work rolled back; the first link survives.
    assert_eq!(db.parent(a).expect("parent"), Some(b));
    assert_eq!(db.parent(b).expect("parent"), None);
}

#[test]
fn reparenting_requires_force() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let trial = common::trial_type(&db);

    let e1 = common::insert_experiment(&db, &experiment, "E1");
    let e2 = common::insert_experiment(&db, &experiment, "E2");
    let t = common::insert_trial(&db, &trial, 1, e1);

    let err = db.set_parent(t, e2, false).expect_err("already has parent");
    assert!(matches!(err, Error::Graph(GraphError::AlreadyHasParent { .. })));

    db.set_parent(t, e2, true).expect("forced reparent");
    assert_eq!(db.parent(t).expect("parent"), Some(e2));
    assert!(db.children(e1).expect("children").is_empty());
}

#[test]
fn relinking_the_current_parent_requires_force() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let trial = common::trial_type(&db);

    let e1 = common::insert_experiment(&db, &experiment, "E1");
    let t = common::insert_trial(&db, &trial, 1, e1);

    let err = db.set_parent(t, e1, false).expect_err("already has parent");
    assert!(matches!(err, Error::Graph(GraphError::AlreadyHasParent { .. })));
    assert_eq!(db.parent(t).expect("parent"), Some(e1));
}

#[test]
fn duplicate_attachment_is_rejected() {
    let db = common::db();
    let trial = common::trial_type(&db);
    let observer = common::observer_type(&db);

    let experiment = common::experiment_type(&db);
    let e = common::insert_experiment(&db, &experiment, "E1");
    let t = common::insert_trial(&db, &trial, 1, e);
    let mut alice = Entity::new(observer);
    alice.set_attribute("name", "Alice").expect("valid");
    let o = db.insert(&mut alice).expect("insert observer");

    db.attach(t, "observed", o).expect("attach");
    let err = db.attach(t, "observed", o).expect_err("duplicate");
    assert!(matches!(err, Error::Graph(GraphError::DuplicateAttachment { .. })));
}

#[test]
fn detach_label_clears_every_target_and_the_label() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let observer = common::observer_type(&db);

    let e = common::insert_experiment(&db, &experiment, "E1");
    let mut o1 = Entity::new(observer.clone());
    o1.set_attribute("name", "Alice").expect("valid");
    let o1 = db.insert(&mut o1).expect("insert");
    let mut o2 = Entity::new(observer);
    o2.set_attribute("name", "Bob").expect("valid");
    let o2 = db.insert(&mut o2).expect("insert");

    db.attach(e, "observed", o1).expect("attach");
    db.attach(e, "observed", o2).expect("attach");
    db.attach(e, "reviewed", o1).expect("attach");

    assert_eq!(db.detach_label(e, "observed").expect("detach_label"), 2);
    assert!(db
        .attachments(e)
        .expect("attachments")
        .iter()
        .all(|a| a.label != "observed"));
    assert_eq!(db.labels(e).expect("labels"), vec!["reviewed".to_owned()]);
}

#[test]
fn deleting_a_holder_preserves_attached_entities() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let observer = common::observer_type(&db);

    let e = common::insert_experiment(&db, &experiment, "E1");
    let mut alice = Entity::new(observer);
    alice.set_attribute("name", "Alice").expect("valid");
    let o = db.insert(&mut alice).expect("insert");
    db.attach(e, "observed", o).expect("attach");

    let before = db.count("Observer", &[]).expect("count");
    assert!(db.delete(e).expect("delete"));
    assert_eq!(db.count("Observer", &[]).expect("count"), before);
    assert!(db.holders(o).expect("holders").is_empty());
}

#[test]
fn deleting_a_parent_orphans_its_children() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let trial = common::trial_type(&db);

    let e = common::insert_experiment(&db, &experiment, "E1");
    let t = common::insert_trial(&db, &trial, 1, e);

    assert!(db.delete(e).expect("delete"));
    assert_eq!(db.parent(t).expect("parent"), None);
    assert!(db.get(t).expect("get").is_some());
}

#[test]
fn related_unions_both_directions() {
    let db = common::db();
    let experiment = common::experiment_type(&db);

    let a = common::insert_experiment(&db, &experiment, "A");
    let b = common::insert_experiment(&db, &experiment, "B");
    let c = common::insert_experiment(&db, &experiment, "C");

    db.attach(a, "uses", b).expect("attach");
    db.attach(c, "uses", a).expect("attach");

    assert_eq!(db.related(a).expect("related"), vec![b, c]);
}

#[test]
fn data_payloads_round_trip() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let e = common::insert_experiment(&db, &experiment, "E1");

    db.put_data(e, "raw", Some("text/plain"), b"hello".to_vec()).expect("put");
    let record = db.get_data(e, "raw").expect("get").expect("present");
    assert_eq!(record.bytes, b"hello");
    assert_eq!(record.mimetype.as_deref(), Some("text/plain"));

    let info = db.data_info(e, "raw").expect("info").expect("present");
    assert_eq!(info.size, 5);

    assert!(db.delete_data(e, "raw").expect("delete"));
    assert!(db.get_data(e, "raw").expect("get").is_none());
}

#[test]
fn unique_ids_are_enforced() {
    let db = common::db();
    let experiment = common::experiment_type(&db);

    let mut first = Entity::new(experiment.clone());
    first.set_attribute("project", "E1").expect("valid");
    db.insert(&mut first).expect("insert");

    let mut clone = Entity::new(experiment);
    clone.unique_id = first.unique_id.clone();
    let err = db.insert(&mut clone).expect_err("duplicate unique id");
    assert!(matches!(err, Error::Graph(GraphError::DuplicateUniqueId(_))));

    let found = db
        .get_by_unique_id(&first.unique_id)
        .expect("lookup")
        .expect("present");
    assert_eq!(found.attribute("project"), Some(&Value::from("E1")));
}
