//! Transaction management.
//!
//! This module provides the unit-of-work layer:
//!
//! - [`TransactionManager`] - hands out transaction handles over a storage
//!   engine
//! - [`DatabaseTransaction`] - a handle carrying every graph operation,
//!   consumed by commit or rollback and rolled back on drop
//! - [`TransactionError`] - errors during transaction operations

mod error;
mod handle;
mod manager;

pub use error::TransactionError;
pub use handle::DatabaseTransaction;
pub use manager::TransactionManager;
