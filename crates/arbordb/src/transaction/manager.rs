//! Transaction manager coordinating storage transactions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arbordb_storage::StorageEngine;

use super::error::TransactionError;
use super::handle::DatabaseTransaction;

/// Coordinates transactions over a storage engine.
///
/// The manager hands out [`DatabaseTransaction`] handles with unique ids.
/// Write transactions serialize at the storage layer; read transactions
/// see a consistent snapshot.
#[derive(Debug)]
pub struct TransactionManager<E: StorageEngine> {
    /// The underlying storage engine.
    engine: Arc<E>,
    /// Counter for transaction ids.
    next_tx_id: AtomicU64,
}

impl<E: StorageEngine> TransactionManager<E> {
    /// Create a new transaction manager over the given engine.
    pub fn new(engine: E) -> Self {
        Self { engine: Arc::new(engine), next_tx_id: AtomicU64::new(1) }
    }

    /// Begin a read-only transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage engine cannot start a transaction.
    pub fn begin_read(
        &self,
    ) -> Result<DatabaseTransaction<E::Transaction<'_>>, TransactionError> {
        let tx_id = self.next_tx_id.fetch_add(1, Ordering::SeqCst);
        let storage = self.engine.begin_read()?;
        Ok(DatabaseTransaction::new_read(tx_id, storage))
    }

    /// Begin a read-write transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage engine cannot start a transaction.
    pub fn begin_write(
        &self,
    ) -> Result<DatabaseTransaction<E::Transaction<'_>>, TransactionError> {
        let tx_id = self.next_tx_id.fetch_add(1, Ordering::SeqCst);
        let storage = self.engine.begin_write()?;
        Ok(DatabaseTransaction::new_write(tx_id, storage))
    }

    /// Flush any buffered writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage engine fails to flush.
    pub fn flush(&self) -> Result<(), TransactionError> {
        self.engine.flush()?;
        Ok(())
    }

    /// The underlying storage engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// A shared handle to the underlying storage engine.
    pub fn engine_arc(&self) -> Arc<E> {
        Arc::clone(&self.engine)
    }
}
