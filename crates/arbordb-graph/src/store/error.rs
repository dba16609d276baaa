//! Error types for graph storage operations.

use arbordb_core::{CoreError, EntityId, TypeId, ValueKind};
use arbordb_storage::StorageError;
use thiserror::Error;

/// Errors that can occur in graph storage operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// An entity was not found.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// No entity carries the given unique id.
    #[error("entity not found for unique id {0:?}")]
    UniqueIdNotFound(String),

    /// A registered type was not found.
    #[error("entity type not found: {0}")]
    TypeNotFound(TypeId),

    /// No registered type matches the given name.
    #[error("no registered entity type matches {0:?}")]
    UnknownTypeName(String),

    /// A name matches more than one registered type.
    #[error("entity type name {name:?} is ambiguous between {candidates:?}")]
    AmbiguousTypeName {
        /// The name or prefix that was looked up.
        name: String,
        /// Identity names of the matching types.
        candidates: Vec<String>,
    },

    /// A declaration clashes with an existing registration.
    #[error(
        "attribute {attribute:?} of type {type_name:?} is registered as \
         {existing}, cannot redeclare as {requested}"
    )]
    SchemaConflict {
        /// The declared type name.
        type_name: String,
        /// The conflicting attribute.
        attribute: String,
        /// The kind already registered.
        existing: ValueKind,
        /// The kind being declared.
        requested: ValueKind,
    },

    /// An entity with the given unique id already exists.
    #[error("an entity with unique id {0:?} already exists")]
    DuplicateUniqueId(String),

    /// The child already has a parent and reparenting was not forced.
    #[error("entity {child} already has parent {parent}")]
    AlreadyHasParent {
        /// The child entity.
        child: EntityId,
        /// Its current parent.
        parent: EntityId,
    },

    /// The requested parent link would create a cycle.
    #[error("setting {parent} as parent of {child} would create a cycle")]
    Circularity {
        /// The child entity.
        child: EntityId,
        /// The proposed parent.
        parent: EntityId,
    },

    /// The attachment triple already exists.
    #[error("entity {holder} already has {target} attached under label {label:?}")]
    DuplicateAttachment {
        /// The holding entity.
        holder: EntityId,
        /// The attachment label.
        label: String,
        /// The attached entity.
        target: EntityId,
    },

    /// A core validation or encoding error occurred.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// A storage backend error occurred.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GraphError::EntityNotFound(EntityId::new(42));
        assert!(err.to_string().contains("42"));

        let err = GraphError::AlreadyHasParent {
            child: EntityId::new(3),
            parent: EntityId::new(9),
        };
        assert!(err.to_string().contains('3'));
        assert!(err.to_string().contains('9'));
    }

    #[test]
    fn from_core_error() {
        let core_err = CoreError::Encoding("bad record".to_owned());
        let graph_err: GraphError = core_err.into();
        assert!(matches!(graph_err, GraphError::Core(_)));
    }
}
