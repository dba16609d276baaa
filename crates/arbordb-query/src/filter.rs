//! The structured filter AST.
//!
//! A query is a [`TypeSpec`] naming the target entity type plus a list of
//! [`Filter`]s, all of which must hold (`any` is the only disjunction).
//! Filters form a closed grammar: attribute constraints, relational
//! constraints against a nested [`Target`], the `any` combinator, and
//! opaque [`Predicate`]s over materialized entities.
//!
//! # Example
//!
//! ```
//! use arbordb_query::{Filter, SubSpec, Target, TypeSpec};
//!
//! // Trials with rt > 2 whose parent is the E1 experiment.
//! let filters = vec![
//!     Filter::greater_than("rt", 2i64),
//!     Filter::parent(Target::spec(SubSpec::new(
//!         TypeSpec::name("Experiment"),
//!         vec![Filter::eq("project", "E1")],
//!     ))),
//! ];
//! # let _ = filters;
//! ```

use std::fmt;
use std::sync::Arc;

use arbordb_core::{Entity, EntityId, EntityType, Value};

/// The target entity type of a query.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    /// A type name, resolved by identity name, exact declared name, or
    /// unique prefix.
    Name(String),
    /// A concrete registered type.
    Type(EntityType),
    /// An example entity: its type is the target and every set attribute
    /// seeds an equality filter.
    Example(Box<Entity>),
}

impl TypeSpec {
    /// Target a type by name.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Target a concrete type.
    #[must_use]
    pub fn of(entity_type: EntityType) -> Self {
        Self::Type(entity_type)
    }

    /// Target by example.
    #[must_use]
    pub fn example(entity: Entity) -> Self {
        Self::Example(Box::new(entity))
    }
}

impl From<&str> for TypeSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<EntityType> for TypeSpec {
    fn from(entity_type: EntityType) -> Self {
        Self::Type(entity_type)
    }
}

impl From<Entity> for TypeSpec {
    fn from(entity: Entity) -> Self {
        Self::Example(Box::new(entity))
    }
}

/// A reference to one specific entity, by storage ID or unique id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    /// Reference by storage ID.
    Id(EntityId),
    /// Reference by unique id.
    UniqueId(String),
}

/// A nested query: a target type plus filters, used inside relational
/// constraints.
#[derive(Debug, Clone)]
pub struct SubSpec {
    /// The related entity's type.
    pub spec: TypeSpec,
    /// Filters the related entity must satisfy.
    pub filters: Vec<Filter>,
}

impl SubSpec {
    /// Build a nested query.
    #[must_use]
    pub fn new(spec: impl Into<TypeSpec>, filters: Vec<Filter>) -> Self {
        Self { spec: spec.into(), filters }
    }
}

/// The required shape of a related entity in a relational constraint.
#[derive(Debug, Clone)]
pub enum Target {
    /// The related entity must satisfy a nested query.
    Spec(Box<SubSpec>),
    /// The related entity must be exactly this one (identity match, no
    /// recursive filtering).
    Entity(EntityRef),
    /// Any related entity satisfies the constraint; only existence is
    /// required.
    Any,
}

impl Target {
    /// Require a nested query match.
    #[must_use]
    pub fn spec(sub: SubSpec) -> Self {
        Self::Spec(Box::new(sub))
    }

    /// Require a specific entity by storage ID.
    #[must_use]
    pub const fn id(id: EntityId) -> Self {
        Self::Entity(EntityRef::Id(id))
    }

    /// Require a specific entity by unique id.
    pub fn unique_id(uid: impl Into<String>) -> Self {
        Self::Entity(EntityRef::UniqueId(uid.into()))
    }

    /// Require a specific, already-saved entity.
    #[must_use]
    pub fn entity(entity: &Entity) -> Self {
        match entity.id {
            Some(id) => Self::Entity(EntityRef::Id(id)),
            None => Self::Entity(EntityRef::UniqueId(entity.unique_id.clone())),
        }
    }
}

/// A comparison against an attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Compare {
    /// Equal.
    Eq(Value),
    /// Strictly greater.
    Gt(Value),
    /// Strictly less.
    Lt(Value),
    /// Greater or equal.
    Ge(Value),
    /// Less or equal.
    Le(Value),
    /// Within the inclusive range `[lo, hi]`.
    Between(Value, Value),
}

impl Compare {
    /// The value(s) the comparison carries, for kind validation.
    pub(crate) fn operands(&self) -> impl Iterator<Item = &Value> {
        let (a, b) = match self {
            Self::Eq(v) | Self::Gt(v) | Self::Lt(v) | Self::Ge(v) | Self::Le(v) => (v, None),
            Self::Between(lo, hi) => (lo, Some(hi)),
        };
        std::iter::once(a).chain(b)
    }
}

/// An opaque predicate over a materialized entity.
///
/// Predicates run after every structural and attribute filter, against the
/// surviving candidate set.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Entity) -> bool + Send + Sync>);

impl Predicate {
    /// Wrap a closure as a predicate.
    pub fn new(f: impl Fn(&Entity) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Apply the predicate.
    #[must_use]
    pub fn test(&self, entity: &Entity) -> bool {
        (self.0)(entity)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// One filter clause.
///
/// All clauses of a query are conjoined; [`Filter::Any`] is the only
/// disjunction.
#[derive(Debug, Clone)]
pub enum Filter {
    /// The attribute equals the literal value.
    Eq {
        /// Attribute name.
        attribute: String,
        /// Required value.
        value: Value,
    },
    /// The attribute equals one of the listed values.
    OneOf {
        /// Attribute name.
        attribute: String,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// The attribute satisfies a comparison (orderable kinds only).
    Cmp {
        /// Attribute name.
        attribute: String,
        /// The comparison.
        compare: Compare,
    },
    /// The string attribute matches a `%`-wildcard pattern.
    Like {
        /// Attribute name.
        attribute: String,
        /// Pattern with `%` matching any run of characters.
        pattern: String,
    },
    /// The entity's parent satisfies the target.
    Parent(Target),
    /// At least one child satisfies the target.
    Child(Target),
    /// At least one attachment under the label satisfies the target.
    Context {
        /// The attachment label.
        label: String,
        /// The required attached entity.
        target: Target,
    },
    /// At least one of the nested filters holds.
    Any(Vec<Filter>),
    /// The materialized entity satisfies an opaque predicate, evaluated
    /// after all other filters.
    With(Predicate),
}

impl Filter {
    /// The attribute equals `value`.
    pub fn eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq { attribute: attribute.into(), value: value.into() }
    }

    /// The attribute equals one of `values`.
    pub fn one_of<V: Into<Value>>(
        attribute: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::OneOf {
            attribute: attribute.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// The attribute compares equal to `value`.
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Cmp { attribute: attribute.into(), compare: Compare::Eq(value.into()) }
    }

    /// The attribute is strictly greater than `value`.
    pub fn greater_than(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Cmp { attribute: attribute.into(), compare: Compare::Gt(value.into()) }
    }

    /// The attribute is strictly less than `value`.
    pub fn less_than(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Cmp { attribute: attribute.into(), compare: Compare::Lt(value.into()) }
    }

    /// The attribute is at least `value`.
    pub fn at_least(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Cmp { attribute: attribute.into(), compare: Compare::Ge(value.into()) }
    }

    /// The attribute is at most `value`.
    pub fn at_most(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Cmp { attribute: attribute.into(), compare: Compare::Le(value.into()) }
    }

    /// The attribute lies in the inclusive range `[lo, hi]`.
    pub fn between(
        attribute: impl Into<String>,
        lo: impl Into<Value>,
        hi: impl Into<Value>,
    ) -> Self {
        Self::Cmp {
            attribute: attribute.into(),
            compare: Compare::Between(lo.into(), hi.into()),
        }
    }

    /// The string attribute matches `pattern`, with `%` matching any run
    /// of characters.
    pub fn like(attribute: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like { attribute: attribute.into(), pattern: pattern.into() }
    }

    /// The parent satisfies `target`.
    #[must_use]
    pub fn parent(target: Target) -> Self {
        Self::Parent(target)
    }

    /// At least one child satisfies `target`.
    #[must_use]
    pub fn child(target: Target) -> Self {
        Self::Child(target)
    }

    /// At least one attachment under `label` satisfies `target`.
    pub fn context(label: impl Into<String>, target: Target) -> Self {
        Self::Context { label: label.into(), target }
    }

    /// At least one of `filters` holds.
    #[must_use]
    pub fn any(filters: Vec<Filter>) -> Self {
        Self::Any(filters)
    }

    /// The entity satisfies an opaque predicate, evaluated after all
    /// structural and attribute filters.
    pub fn with(predicate: impl Fn(&Entity) -> bool + Send + Sync + 'static) -> Self {
        Self::With(Predicate::new(predicate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_produce_expected_variants() {
        assert!(matches!(Filter::eq("rt", 1i64), Filter::Eq { .. }));
        assert!(matches!(Filter::one_of("rt", [1i64, 2]), Filter::OneOf { .. }));
        assert!(matches!(
            Filter::between("rt", 1i64, 3i64),
            Filter::Cmp { compare: Compare::Between(_, _), .. }
        ));
        assert!(matches!(Filter::like("name", "Al%"), Filter::Like { .. }));
        assert!(matches!(Filter::with(|_| true), Filter::With(_)));
    }

    #[test]
    fn target_for_unsaved_entity_uses_unique_id() {
        use arbordb_core::{EntityType, Schema};

        let kind = EntityType::new("T", Schema::new()).expect("valid");
        let entity = Entity::new(kind);
        match Target::entity(&entity) {
            Target::Entity(EntityRef::UniqueId(uid)) => assert_eq!(uid, entity.unique_id),
            other => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn predicate_is_callable_and_debuggable() {
        let p = Predicate::new(|e: &Entity| e.id.is_some());
        assert_eq!(format!("{p:?}"), "Predicate(..)");
    }
}
