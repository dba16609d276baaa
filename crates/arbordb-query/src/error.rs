//! Error types for filter validation and evaluation.

use arbordb_core::ValueKind;
use arbordb_graph::GraphError;
use thiserror::Error;

/// Errors raised while validating or evaluating a filter.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A filter names an attribute the target type does not declare.
    #[error("type {type_name:?} declares no attribute {attribute:?}")]
    UnknownAttribute {
        /// The target type's declared name.
        type_name: String,
        /// The undeclared attribute.
        attribute: String,
    },

    /// A filter value's kind differs from the declared attribute kind.
    #[error("attribute {attribute:?} is declared {expected}, filter value is {actual}")]
    KindMismatch {
        /// The filtered attribute.
        attribute: String,
        /// The declared kind.
        expected: ValueKind,
        /// The kind of the filter value.
        actual: ValueKind,
    },

    /// A comparison operator was applied to an unordered kind.
    #[error("attribute {attribute:?} is {kind}, which has no order")]
    Unordered {
        /// The filtered attribute.
        attribute: String,
        /// The unordered kind.
        kind: ValueKind,
    },

    /// A pattern was applied to a non-string attribute.
    #[error("pattern match requires a string attribute, {attribute:?} is {kind}")]
    PatternOnNonString {
        /// The filtered attribute.
        attribute: String,
        /// The declared kind.
        kind: ValueKind,
    },

    /// A predicate filter was nested inside `any`.
    ///
    /// Predicates run after structural filtering against the full surviving
    /// candidate set, which has no meaning per disjunction branch.
    #[error("predicate filters cannot be nested inside any")]
    PredicateInDisjunction,

    /// A graph operation failed during evaluation.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, FilterError>;
