//! Core data types for the entity graph.

mod entity;
mod id;
mod schema;
mod value;

pub use entity::Entity;
pub use id::{EntityId, TypeId};
pub use schema::{validate_name_token, EntityType, Schema};
pub use value::{Value, ValueKind};
