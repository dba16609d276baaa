//! Integration tests for ArborDB.
//!
//! These tests exercise the database across crates: registry, graph,
//! queries, rebranding, import/export, and transaction semantics.

mod common;
mod graph;
mod io;
mod query;
mod rebrand;
mod transactions;
