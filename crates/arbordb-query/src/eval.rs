//! The recursive filter evaluator.
//!
//! Evaluation has three phases. The target type is resolved and every
//! filter is validated against its schema up front, so a malformed query
//! fails before any entity is touched. Candidates then come from the
//! per-type index and pass through the structural and attribute filters,
//! conjoined, with `any` as the only disjunction. Opaque predicates run
//! last, against the candidate set that survived everything else.

use std::cmp::Ordering;

use arbordb_core::{Entity, EntityType, Value, ValueKind};
use arbordb_graph::store::{ContextStore, EntityStore, HierarchyStore, TypeStore};
use arbordb_storage::Transaction;

use crate::error::{FilterError, QueryResult};
use crate::filter::{Compare, EntityRef, Filter, Target, TypeSpec};

/// Find all entities of the resolved type satisfying every filter.
///
/// Results are returned in ascending [`EntityId`](arbordb_core::EntityId)
/// order. The empty filter list matches every entity of the type.
///
/// # Errors
///
/// Returns a [`FilterError`] for a filter that cannot be validated against
/// the target type, a predicate nested inside `any`, or a failing graph
/// operation.
pub fn find_complex<T: Transaction>(
    tx: &T,
    spec: &TypeSpec,
    filters: &[Filter],
) -> QueryResult<Vec<Entity>> {
    let (entity_type, seeded) = resolve_spec(tx, spec)?;
    let filters: Vec<&Filter> = seeded.iter().chain(filters).collect();

    for filter in &filters {
        validate_filter(tx, &entity_type, filter, false)?;
    }

    // Predicates at the top level run after everything else, against the
    // structurally filtered survivors.
    let (predicates, structural): (Vec<&Filter>, Vec<&Filter>) =
        filters.into_iter().partition(|f| matches!(f, Filter::With(_)));

    let mut results = Vec::new();
    'candidates: for id in EntityStore::ids_by_type(tx, entity_type.id())? {
        let entity = EntityStore::get_or_error(tx, id)?;
        for filter in &structural {
            if !matches_filter(tx, &entity, filter)? {
                continue 'candidates;
            }
        }
        results.push(entity);
    }

    for filter in predicates {
        if let Filter::With(predicate) = filter {
            results.retain(|entity| predicate.test(entity));
        }
    }
    Ok(results)
}

/// Count the entities matching the query without materializing them.
///
/// # Errors
///
/// Same conditions as [`find_complex`].
pub fn count<T: Transaction>(
    tx: &T,
    spec: &TypeSpec,
    filters: &[Filter],
) -> QueryResult<usize> {
    Ok(find_complex(tx, spec, filters)?.len())
}

/// Resolve the target type, seeding equality filters from an example
/// entity's set attributes.
fn resolve_spec<T: Transaction>(
    tx: &T,
    spec: &TypeSpec,
) -> QueryResult<(EntityType, Vec<Filter>)> {
    match spec {
        TypeSpec::Name(name) => Ok((TypeStore::resolve(tx, name)?, Vec::new())),
        TypeSpec::Type(entity_type) => Ok((entity_type.clone(), Vec::new())),
        TypeSpec::Example(example) => {
            let seeded = example
                .attributes()
                .iter()
                .map(|(attribute, value)| Filter::Eq {
                    attribute: attribute.clone(),
                    value: value.clone(),
                })
                .collect();
            Ok((example.entity_type().clone(), seeded))
        }
    }
}

/// Check one filter against the target type's schema.
///
/// Walks nested targets and `any` branches; `in_any` marks positions where
/// a predicate filter would be evaluated per-branch and is therefore
/// rejected.
fn validate_filter<T: Transaction>(
    tx: &T,
    entity_type: &EntityType,
    filter: &Filter,
    in_any: bool,
) -> QueryResult<()> {
    match filter {
        Filter::Eq { attribute, value } => {
            let expected = declared_kind(entity_type, attribute)?;
            check_kind(attribute, expected, value)
        }
        Filter::OneOf { attribute, values } => {
            let expected = declared_kind(entity_type, attribute)?;
            values.iter().try_for_each(|value| check_kind(attribute, expected, value))
        }
        Filter::Cmp { attribute, compare } => {
            let expected = declared_kind(entity_type, attribute)?;
            if !expected.is_ordered() {
                return Err(FilterError::Unordered {
                    attribute: attribute.clone(),
                    kind: expected,
                });
            }
            compare.operands().try_for_each(|value| check_kind(attribute, expected, value))
        }
        Filter::Like { attribute, pattern: _ } => {
            let expected = declared_kind(entity_type, attribute)?;
            if expected == ValueKind::String {
                Ok(())
            } else {
                Err(FilterError::PatternOnNonString {
                    attribute: attribute.clone(),
                    kind: expected,
                })
            }
        }
        Filter::Parent(target) | Filter::Child(target)
        | Filter::Context { target, .. } => validate_target(tx, target, in_any),
        Filter::Any(branches) => branches
            .iter()
            .try_for_each(|branch| validate_filter(tx, entity_type, branch, true)),
        Filter::With(_) => {
            if in_any {
                Err(FilterError::PredicateInDisjunction)
            } else {
                Ok(())
            }
        }
    }
}

fn validate_target<T: Transaction>(
    tx: &T,
    target: &Target,
    in_any: bool,
) -> QueryResult<()> {
    match target {
        Target::Spec(sub) => {
            let (entity_type, _) = resolve_spec(tx, &sub.spec)?;
            sub.filters
                .iter()
                .try_for_each(|filter| validate_filter(tx, &entity_type, filter, in_any))
        }
        Target::Entity(_) | Target::Any => Ok(()),
    }
}

fn declared_kind(entity_type: &EntityType, attribute: &str) -> QueryResult<ValueKind> {
    entity_type.schema().kind_of(attribute).ok_or_else(|| FilterError::UnknownAttribute {
        type_name: entity_type.name().to_owned(),
        attribute: attribute.to_owned(),
    })
}

fn check_kind(attribute: &str, expected: ValueKind, value: &Value) -> QueryResult<()> {
    if value.kind() == expected {
        Ok(())
    } else {
        Err(FilterError::KindMismatch {
            attribute: attribute.to_owned(),
            expected,
            actual: value.kind(),
        })
    }
}

/// Evaluate one structural filter against a materialized entity.
///
/// An unset attribute or an absent relation leaves the filter unsatisfied,
/// never in error. Predicates reached here sit inside a relational
/// sub-spec and apply to the related entity directly.
fn matches_filter<T: Transaction>(
    tx: &T,
    entity: &Entity,
    filter: &Filter,
) -> QueryResult<bool> {
    match filter {
        Filter::Eq { attribute, value } => Ok(entity.attribute(attribute) == Some(value)),
        Filter::OneOf { attribute, values } => {
            Ok(entity.attribute(attribute).is_some_and(|value| values.contains(value)))
        }
        Filter::Cmp { attribute, compare } => {
            Ok(entity.attribute(attribute).is_some_and(|value| compare_matches(value, compare)))
        }
        Filter::Like { attribute, pattern } => Ok(entity
            .attribute(attribute)
            .and_then(Value::as_str)
            .is_some_and(|text| like_match(pattern, text))),
        Filter::Parent(target) => {
            let Some(id) = entity.id else {
                return Ok(false);
            };
            match HierarchyStore::parent(tx, id)? {
                Some(parent) => target_matches(tx, parent, target),
                None => Ok(false),
            }
        }
        Filter::Child(target) => {
            let Some(id) = entity.id else {
                return Ok(false);
            };
            for child in HierarchyStore::children(tx, id)? {
                if target_matches(tx, child, target)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Filter::Context { label, target } => {
            let Some(id) = entity.id else {
                return Ok(false);
            };
            for attached in ContextStore::targets(tx, id, label)? {
                if target_matches(tx, attached, target)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Filter::Any(branches) => {
            for branch in branches {
                if matches_filter(tx, entity, branch)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Filter::With(predicate) => Ok(predicate.test(entity)),
    }
}

/// Check whether the related entity satisfies the target.
fn target_matches<T: Transaction>(
    tx: &T,
    related: arbordb_core::EntityId,
    target: &Target,
) -> QueryResult<bool> {
    match target {
        Target::Any => Ok(true),
        Target::Entity(EntityRef::Id(id)) => Ok(*id == related),
        Target::Entity(EntityRef::UniqueId(uid)) => {
            let entity = EntityStore::get_or_error(tx, related)?;
            Ok(entity.unique_id == *uid)
        }
        Target::Spec(sub) => {
            let entity = EntityStore::get_or_error(tx, related)?;
            let (entity_type, seeded) = resolve_spec(tx, &sub.spec)?;
            if entity.entity_type().id() != entity_type.id() {
                return Ok(false);
            }
            for filter in seeded.iter().chain(&sub.filters) {
                if !matches_filter(tx, &entity, filter)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

fn compare_matches(value: &Value, compare: &Compare) -> bool {
    match compare {
        Compare::Eq(other) => value.compare(other) == Some(Ordering::Equal),
        Compare::Gt(other) => value.compare(other) == Some(Ordering::Greater),
        Compare::Lt(other) => value.compare(other) == Some(Ordering::Less),
        Compare::Ge(other) => {
            matches!(value.compare(other), Some(Ordering::Greater | Ordering::Equal))
        }
        Compare::Le(other) => {
            matches!(value.compare(other), Some(Ordering::Less | Ordering::Equal))
        }
        Compare::Between(lo, hi) => {
            matches!(value.compare(lo), Some(Ordering::Greater | Ordering::Equal))
                && matches!(value.compare(hi), Some(Ordering::Less | Ordering::Equal))
        }
    }
}

/// Match `text` against `pattern`, where `%` matches any run of characters
/// (including the empty run) and everything else matches literally.
fn like_match(pattern: &str, text: &str) -> bool {
    let segments: Vec<&str> = pattern.split('%').collect();
    if segments.len() == 1 {
        return pattern == text;
    }

    let mut pos = 0;
    let last = segments.len() - 1;
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        if i == 0 {
            if !text.starts_with(segment) {
                return false;
            }
            pos = segment.len();
        } else if i == last {
            return text.len() >= pos + segment.len() && text[pos..].ends_with(segment);
        } else {
            match text[pos..].find(segment) {
                Some(found) => pos += found + segment.len(),
                None => return false,
            }
        }
    }
    true
}
