//! Shared fixtures: an in-memory database seeded with the experiment
//! schema used across the test modules.

use arbordb::{Database, Entity, EntityId, EntityType, ValueKind};

/// An in-memory database.
pub fn db() -> Database {
    Database::in_memory().expect("failed to create db")
}

/// Register the `Experiment` type.
pub fn experiment_type(db: &Database) -> EntityType {
    db.register_type(
        "Experiment",
        &[("project", ValueKind::String), ("author", ValueKind::String)],
    )
    .expect("failed to register Experiment")
}

/// Register the `Trial` type.
pub fn trial_type(db: &Database) -> EntityType {
    db.register_type(
        "Trial",
        &[("rt", ValueKind::Integer), ("response", ValueKind::String)],
    )
    .expect("failed to register Trial")
}

/// Register the `Observer` type.
pub fn observer_type(db: &Database) -> EntityType {
    db.register_type(
        "Observer",
        &[("name", ValueKind::String), ("handedness", ValueKind::String)],
    )
    .expect("failed to register Observer")
}

/// Insert an experiment with the given project name.
pub fn insert_experiment(db: &Database, kind: &EntityType, project: &str) -> EntityId {
    let mut entity = Entity::new(kind.clone());
    entity.set_attribute("project", project).expect("valid attribute");
    db.insert(&mut entity).expect("failed to insert experiment")
}

/// Insert a trial with the given reaction time, under the given parent.
pub fn insert_trial(db: &Database, kind: &EntityType, rt: i64, parent: EntityId) -> EntityId {
    let mut entity = Entity::new(kind.clone());
    entity.set_attribute("rt", rt).expect("valid attribute");
    let id = db.insert(&mut entity).expect("failed to insert trial");
    db.set_parent(id, parent, false).expect("failed to set parent");
    id
}
