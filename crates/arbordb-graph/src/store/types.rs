//! Registered entity type storage.
//!
//! Types are keyed by their derived [`TypeId`], so registering the same
//! declaration twice is idempotent while a changed schema registers as a
//! distinct type that coexists with the old one. Name lookups therefore
//! resolve through the declared names of all registered types, with the
//! identity name (`"<name>_<hash>"`) available to disambiguate.

use arbordb_core::encoding::keys::type_key;
use arbordb_core::encoding::{Decoder, Encoder};
use arbordb_core::{CoreError, EntityType, Schema, TypeId, ValueKind};
use arbordb_storage::{Cursor, Transaction};

use super::error::{GraphError, GraphResult};
use super::TABLE_ENTITY_TYPES;

/// Entity type storage operations.
pub struct TypeStore;

impl TypeStore {
    /// Register an entity type.
    ///
    /// Registering an identical declaration again is a no-op; a declaration
    /// with the same name but a different attribute set registers a separate
    /// type that coexists with the old one. Redeclaring an attribute of an
    /// existing same-named type with a different kind is rejected, so the
    /// (type name, attribute) pair always maps to one kind.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::SchemaConflict`] on a kind clash, or an error
    /// if the type cannot be stored.
    pub fn register<T: Transaction>(tx: &mut T, entity_type: &EntityType) -> GraphResult<()> {
        for existing in Self::all(tx)? {
            if existing.name() != entity_type.name() {
                continue;
            }
            for (attribute, requested) in entity_type.schema().iter() {
                if let Some(registered) = existing.schema().kind_of(attribute) {
                    if registered != requested {
                        return Err(GraphError::SchemaConflict {
                            type_name: entity_type.name().to_owned(),
                            attribute: attribute.to_owned(),
                            existing: registered,
                            requested,
                        });
                    }
                }
            }
        }

        let key = type_key(entity_type.id());
        let value = entity_type.encode()?;
        tx.put(TABLE_ENTITY_TYPES, &key, &value)?;
        Ok(())
    }

    /// Declare and register an entity type from `(attribute, kind)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for malformed name tokens and
    /// [`GraphError::SchemaConflict`] on a kind clash.
    pub fn register_type<T: Transaction>(
        tx: &mut T,
        name: &str,
        attributes: &[(&str, ValueKind)],
    ) -> GraphResult<EntityType> {
        let schema: Schema = attributes
            .iter()
            .map(|(attribute, kind)| ((*attribute).to_owned(), *kind))
            .collect();
        let entity_type = EntityType::new(name, schema)?;
        Self::register(tx, &entity_type)?;
        Ok(entity_type)
    }

    /// The declared kind of `(type_name, attribute)` across registered types.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownTypeName`] if no type carries the name
    /// and [`CoreError::UnknownAttribute`] if none of them declares the
    /// attribute.
    pub fn lookup<T: Transaction>(
        tx: &T,
        type_name: &str,
        attribute: &str,
    ) -> GraphResult<ValueKind> {
        let mut name_seen = false;
        for entity_type in Self::all(tx)? {
            if entity_type.name() != type_name {
                continue;
            }
            name_seen = true;
            // Kinds are consistent across same-named types per register.
            if let Some(kind) = entity_type.schema().kind_of(attribute) {
                return Ok(kind);
            }
        }
        if name_seen {
            Err(CoreError::unknown_attribute(type_name, attribute).into())
        } else {
            Err(GraphError::UnknownTypeName(type_name.to_owned()))
        }
    }

    /// Get a registered type by its identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be decoded.
    pub fn get<T: Transaction>(tx: &T, id: TypeId) -> GraphResult<Option<EntityType>> {
        match tx.get(TABLE_ENTITY_TYPES, &type_key(id))? {
            Some(value) => Ok(Some(EntityType::decode(&value)?)),
            None => Ok(None),
        }
    }

    /// Get a registered type by its identity, or fail.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::TypeNotFound`] if the type is not registered.
    pub fn get_or_error<T: Transaction>(tx: &T, id: TypeId) -> GraphResult<EntityType> {
        Self::get(tx, id)?.ok_or(GraphError::TypeNotFound(id))
    }

    /// Check whether a type is registered.
    pub fn exists<T: Transaction>(tx: &T, id: TypeId) -> GraphResult<bool> {
        Ok(tx.get(TABLE_ENTITY_TYPES, &type_key(id))?.is_some())
    }

    /// All registered types.
    ///
    /// # Errors
    ///
    /// Returns an error if any record cannot be decoded.
    pub fn all<T: Transaction>(tx: &T) -> GraphResult<Vec<EntityType>> {
        let mut cursor = tx.cursor(TABLE_ENTITY_TYPES)?;
        let mut types = Vec::new();
        while let Some((_, value)) = cursor.next()? {
            types.push(EntityType::decode(&value)?);
        }
        Ok(types)
    }

    /// Resolve a type by name.
    ///
    /// Resolution tries, in order: the identity name (`"<name>_<hash>"`),
    /// the exact declared name, and finally a unique prefix of a declared
    /// name. A lookup matching more than one registered type fails with
    /// [`GraphError::AmbiguousTypeName`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownTypeName`] if nothing matches.
    pub fn resolve<T: Transaction>(tx: &T, name: &str) -> GraphResult<EntityType> {
        let types = Self::all(tx)?;

        if let Some(t) = types.iter().find(|t| t.identity_name() == name) {
            return Ok(t.clone());
        }

        let exact: Vec<&EntityType> = types.iter().filter(|t| t.name() == name).collect();
        match exact.as_slice() {
            [single] => return Ok((*single).clone()),
            [] => {}
            many => {
                return Err(GraphError::AmbiguousTypeName {
                    name: name.to_owned(),
                    candidates: many.iter().map(|t| t.identity_name()).collect(),
                })
            }
        }

        let by_prefix: Vec<&EntityType> =
            types.iter().filter(|t| t.name().starts_with(name)).collect();
        match by_prefix.as_slice() {
            [single] => Ok((*single).clone()),
            [] => Err(GraphError::UnknownTypeName(name.to_owned())),
            many => Err(GraphError::AmbiguousTypeName {
                name: name.to_owned(),
                candidates: many.iter().map(|t| t.identity_name()).collect(),
            }),
        }
    }

    /// Remove a registered type.
    ///
    /// Callers are responsible for migrating or deleting the type's members
    /// first; this only removes the registration record.
    pub fn remove<T: Transaction>(tx: &mut T, id: TypeId) -> GraphResult<bool> {
        Ok(tx.delete(TABLE_ENTITY_TYPES, &type_key(id))?)
    }
}
