//! Query integration tests over the Trial/Experiment hierarchy.

use arbordb::{Entity, Error, Filter, FilterError, GraphError, SubSpec, Target, Value, ValueKind};

use crate::common;

#[test]
fn attribute_operator_filter() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let trial = common::trial_type(&db);

    let e1 = common::insert_experiment(&db, &experiment, "E1");
    common::insert_trial(&db, &trial, 1, e1);
    common::insert_trial(&db, &trial, 3, e1);
    common::insert_trial(&db, &trial, 5, e1);

    let slow = db.find("Trial", &[Filter::greater_than("rt", 2i64)]).expect("find");
    assert_eq!(slow.len(), 2);
    assert!(slow
        .iter()
        .all(|t| t.attribute("rt").and_then(Value::as_int).unwrap_or(0) > 2));
}

#[test]
fn parent_filter_with_nested_spec() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let trial = common::trial_type(&db);

    let e1 = common::insert_experiment(&db, &experiment, "E1");
    let e2 = common::insert_experiment(&db, &experiment, "E2");
    let t1 = common::insert_trial(&db, &trial, 1, e1);
    common::insert_trial(&db, &trial, 2, e2);

    let found = db
        .find(
            "Trial",
            &[Filter::parent(Target::spec(SubSpec::new(
                "Experiment",
                vec![Filter::eq("project", "E1")],
            )))],
        )
        .expect("find");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, Some(t1));
}

#[test]
fn parent_filter_with_literal_entity() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let trial = common::trial_type(&db);

    let e1 = common::insert_experiment(&db, &experiment, "E1");
    let e2 = common::insert_experiment(&db, &experiment, "E2");
    let t1 = common::insert_trial(&db, &trial, 1, e1);
    common::insert_trial(&db, &trial, 2, e2);

    let found = db.find("Trial", &[Filter::parent(Target::id(e1))]).expect("find");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, Some(t1));
}

#[test]
fn any_disjunction_across_two_parent_specs() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let trial = common::trial_type(&db);

    let e1 = common::insert_experiment(&db, &experiment, "E1");
    let e2 = common::insert_experiment(&db, &experiment, "E2");
    let e3 = common::insert_experiment(&db, &experiment, "E3");
    common::insert_trial(&db, &trial, 1, e1);
    common::insert_trial(&db, &trial, 2, e2);
    common::insert_trial(&db, &trial, 3, e3);

    let parent_is = |project: &str| {
        Filter::parent(Target::spec(SubSpec::new(
            "Experiment",
            vec![Filter::eq("project", project)],
        )))
    };

    let found = db
        .find("Trial", &[Filter::any(vec![parent_is("E1"), parent_is("E3")])])
        .expect("find");
    assert_eq!(found.len(), 2);
}

#[test]
fn child_and_context_filters() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let trial = common::trial_type(&db);
    let observer = common::observer_type(&db);

    let e1 = common::insert_experiment(&db, &experiment, "E1");
    let e2 = common::insert_experiment(&db, &experiment, "E2");
    let t = common::insert_trial(&db, &trial, 5, e1);

    let mut alice = Entity::new(observer);
    alice.set_attribute("name", "Alice").expect("valid");
    let o = db.insert(&mut alice).expect("insert");
    db.attach(t, "observed", o).expect("attach");

    // Experiments with at least one slow trial below them.
    let with_slow_child = db
        .find(
            "Experiment",
            &[Filter::child(Target::spec(SubSpec::new(
                "Trial",
                vec![Filter::at_least("rt", 5i64)],
            )))],
        )
        .expect("find");
    assert_eq!(with_slow_child.len(), 1);
    assert_eq!(with_slow_child[0].id, Some(e1));

    // Trials observed by Alice.
    let observed = db
        .find(
            "Trial",
            &[Filter::context(
                "observed",
                Target::spec(SubSpec::new("Observer", vec![Filter::eq("name", "Alice")])),
            )],
        )
        .expect("find");
    assert_eq!(observed.len(), 1);

    // e2 has no children, so the relational filter is simply unsatisfied.
    let none = db
        .find("Experiment", &[Filter::eq("project", "E2"), Filter::child(Target::Any)])
        .expect("find");
    assert!(none.is_empty());
    assert!(db.get(e2).expect("get").is_some());
}

#[test]
fn with_predicate_runs_on_structural_survivors() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let trial = common::trial_type(&db);

    let e1 = common::insert_experiment(&db, &experiment, "E1");
    common::insert_trial(&db, &trial, 1, e1);
    common::insert_trial(&db, &trial, 3, e1);
    common::insert_trial(&db, &trial, 5, e1);

    let found = db
        .find(
            "Trial",
            &[
                Filter::greater_than("rt", 1i64),
                Filter::with(|e| e.attribute("rt").and_then(Value::as_int) == Some(5)),
            ],
        )
        .expect("find");
    assert_eq!(found.len(), 1);
}

#[test]
fn predicate_inside_any_is_rejected() {
    let db = common::db();
    common::trial_type(&db);

    let err = db
        .find("Trial", &[Filter::any(vec![Filter::with(|_| true)])])
        .expect_err("predicate in disjunction");
    assert!(matches!(err, Error::Filter(FilterError::PredicateInDisjunction)));
}

#[test]
fn malformed_filters_fail_before_evaluation() {
    let db = common::db();
    common::trial_type(&db);

    let err = db.find("Trial", &[Filter::eq("bogus", 1i64)]).expect_err("unknown attribute");
    assert!(matches!(err, Error::Filter(FilterError::UnknownAttribute { .. })));

    let err = db.find("Trial", &[Filter::eq("rt", "fast")]).expect_err("kind mismatch");
    assert!(matches!(err, Error::Filter(FilterError::KindMismatch { .. })));
}

#[test]
fn find_one_not_found_and_ambiguous() {
    let db = common::db();
    let experiment = common::experiment_type(&db);
    let trial = common::trial_type(&db);

    let e1 = common::insert_experiment(&db, &experiment, "E1");
    common::insert_trial(&db, &trial, 1, e1);
    common::insert_trial(&db, &trial, 1, e1);

    let err = db
        .find_one("Trial", &[Filter::eq("rt", 9i64)])
        .expect_err("nothing matches");
    assert!(matches!(err, Error::NotFound(_)));

    let err = db
        .find_one("Trial", &[Filter::eq("rt", 1i64)])
        .expect_err("two match");
    assert!(matches!(err, Error::AmbiguousResult(_)));

    let one = db
        .find_one("Experiment", &[Filter::eq("project", "E1")])
        .expect("exactly one");
    assert_eq!(one.id, Some(e1));
}

#[test]
fn find_roots_excludes_entities_with_parents() {
    let db = common::db();
    let experiment = common::experiment_type(&db);

    let root = common::insert_experiment(&db, &experiment, "E1");
    let nested = common::insert_experiment(&db, &experiment, "E2");
    db.set_parent(nested, root, false).expect("set parent");

    let roots = db.find_roots("Experiment", &[]).expect("roots");
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].id, Some(root));
}

#[test]
fn type_names_resolve_by_unique_prefix() {
    let db = common::db();
    common::experiment_type(&db);
    common::trial_type(&db);

    let resolved = db.entity_type("Exp").expect("unique prefix");
    assert_eq!(resolved.name(), "Experiment");

    // Two registered names share the prefix "T"? Only Trial does, so add
    // a sibling to make the prefix ambiguous.
    db.register_type("Trajectory", &[("length", ValueKind::Float)]).expect("register");
    let err = db.entity_type("Tr").expect_err("ambiguous prefix");
    assert!(matches!(err, Error::Graph(GraphError::AmbiguousTypeName { .. })));
}

#[test]
fn query_by_example_seeds_equality_filters() {
    let db = common::db();
    let trial = common::trial_type(&db);
    let experiment = common::experiment_type(&db);

    let e1 = common::insert_experiment(&db, &experiment, "E1");
    common::insert_trial(&db, &trial, 1, e1);
    let target = common::insert_trial(&db, &trial, 2, e1);

    let mut example = Entity::new(trial);
    example.set_attribute("rt", 2i64).expect("valid");
    let found = db.find(example, &[]).expect("find by example");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, Some(target));
}
