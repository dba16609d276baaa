//! Structured query layer for ArborDB.
//!
//! This crate provides the closed filter grammar and the recursive
//! evaluator that interprets it over a graph transaction. Queries name a
//! target entity type (by name, by value, or by example) and conjoin any
//! number of filters; `any` is the only disjunction and opaque predicates
//! always run last.
//!
//! # Example
//!
//! ```no_run
//! use arbordb_query::{find_complex, Filter, SubSpec, Target, TypeSpec};
//! # use arbordb_storage::backends::RedbEngine;
//! # use arbordb_storage::StorageEngine;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let engine = RedbEngine::in_memory()?;
//! # let tx = engine.begin_read()?;
//! // Trials slower than 2 under the E1 experiment.
//! let slow = find_complex(
//!     &tx,
//!     &TypeSpec::name("Trial"),
//!     &[
//!         Filter::greater_than("rt", 2i64),
//!         Filter::parent(Target::spec(SubSpec::new(
//!             TypeSpec::name("Experiment"),
//!             vec![Filter::eq("project", "E1")],
//!         ))),
//!     ],
//! )?;
//! # let _ = slow;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]

mod error;
mod eval;
mod filter;

pub use error::{FilterError, QueryResult};
pub use eval::{count, find_complex};
pub use filter::{Compare, EntityRef, Filter, Predicate, SubSpec, Target, TypeSpec};
