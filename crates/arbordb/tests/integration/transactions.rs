//! Transaction semantics: rollback on drop, handle consumption, and
//! on-disk durability across reopen.

use arbordb::{Database, Entity, Error, TransactionError, ValueKind};

use crate::common;

#[test]
fn dropped_transaction_leaves_no_trace() {
    let db = common::db();
    let experiment = common::experiment_type(&db);

    {
        let mut tx = db.begin().expect("begin");
        let mut entity = Entity::new(experiment.clone());
        entity.set_attribute("project", "E1").expect("valid");
        tx.insert(&mut entity).expect("insert");
        // Dropped without commit.
    }

    assert_eq!(db.count("Experiment", &[]).expect("count"), 0);
}

#[test]
fn explicit_rollback_discards_changes() {
    let db = common::db();
    let experiment = common::experiment_type(&db);

    let mut tx = db.begin().expect("begin");
    let mut entity = Entity::new(experiment);
    entity.set_attribute("project", "E1").expect("valid");
    tx.insert(&mut entity).expect("insert");
    tx.rollback().expect("rollback");

    assert_eq!(db.count("Experiment", &[]).expect("count"), 0);
}

#[test]
fn read_only_transactions_reject_writes() {
    let db = common::db();
    let experiment = common::experiment_type(&db);

    let mut tx = db.begin_read().expect("begin read");
    let mut entity = Entity::new(experiment);
    let err = tx.insert(&mut entity).expect_err("read-only");
    assert!(matches!(err, Error::Transaction(TransactionError::ReadOnly)));
}

#[test]
fn multi_step_unit_of_work_commits_atomically() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let trial = common::trial_type(&db);

    let mut tx = db.begin().expect("begin");
    let mut e = Entity::new(experiment);
    e.set_attribute("project", "E1").expect("valid");
    let parent = tx.insert(&mut e).expect("insert");

    let mut t = Entity::new(trial);
    t.set_attribute("rt", 2i64).expect("valid");
    let child = tx.insert(&mut t).expect("insert");
    tx.set_parent(child, parent, false).expect("set parent");

    // Nothing visible before commit.
    assert_eq!(db.count("Experiment", &[]).expect("count"), 0);

    tx.commit().expect("commit");
    assert_eq!(db.count("Experiment", &[]).expect("count"), 1);
    assert_eq!(db.parent(child).expect("parent"), Some(parent));
}

#[test]
fn database_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("experiments.arbor");

    let unique_id = {
        let db = Database::open(&path).expect("open");
        let observer = db
            .register_type("Observer", &[("name", ValueKind::String)])
            .expect("register");
        let mut alice = Entity::new(observer);
        alice.set_attribute("name", "Alice").expect("valid");
        db.insert(&mut alice).expect("insert");
        alice.unique_id
    };

    let db = Database::open(&path).expect("reopen");
    let loaded = db
        .get_by_unique_id(&unique_id)
        .expect("lookup")
        .expect("present after reopen");
    assert_eq!(loaded.type_name(), "Observer");
}
