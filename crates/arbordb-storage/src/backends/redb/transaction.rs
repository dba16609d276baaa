//! Redb transaction implementation.
//!
//! This module provides the `RedbTransaction` type which implements the
//! `Transaction` trait for both read-only and read-write transactions.
//!
//! # Memory-efficient cursors
//!
//! The cursor implementation streams entries in batches instead of
//! materializing whole tables. Each batch resumes from the successor of the
//! last key seen, so a table with a million entries uses about the same
//! cursor memory as one with a thousand.

use std::ops::Bound;

use redb::{ReadTransaction, ReadableTable, WriteTransaction};

use crate::engine::{Cursor, CursorResult, KeyValue, StorageError, Transaction};

use super::tables::{decode_key, encode_key, table_end_key, table_start_key, DATA_TABLE};

/// Default number of entries fetched per cursor batch.
const DEFAULT_BATCH_SIZE: usize = 1000;

/// A transaction for the Redb storage engine.
///
/// Wraps both read-only and read-write Redb transactions behind the
/// `Transaction` trait. Boxing the write transaction would add indirection
/// on every operation, so the size difference between variants is accepted.
#[allow(clippy::large_enum_variant)]
pub enum RedbTransaction {
    /// A read-only transaction.
    Read(ReadTransaction),
    /// A read-write transaction.
    Write(WriteTransaction),
}

/// A handle on the physical data table, opened from either transaction kind.
enum DataTable<'a> {
    Read(redb::ReadOnlyTable<&'static [u8], &'static [u8]>),
    Write(redb::Table<'a, &'static [u8], &'static [u8]>),
}

impl DataTable<'_> {
    fn read_value(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        match self {
            Self::Read(t) => read_value(t, key),
            Self::Write(t) => read_value(t, key),
        }
    }

    fn collect_span(
        &self,
        start: &[u8],
        end: &[u8],
        limit: usize,
        reverse: bool,
    ) -> Result<Vec<KeyValue>, StorageError> {
        match self {
            Self::Read(t) => collect_span(t, start, end, limit, reverse),
            Self::Write(t) => collect_span(t, start, end, limit, reverse),
        }
    }
}

fn read_value<T>(table: &T, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    match table.get(key) {
        Ok(Some(value)) => Ok(Some(value.value().to_vec())),
        Ok(None) => Ok(None),
        Err(e) => Err(StorageError::Internal(e.to_string())),
    }
}

/// Collect up to `limit` entries from the physical range `[start, end)`,
/// stripping the logical-table prefix. Entries are returned in ascending key
/// order; `reverse` selects the `limit` entries closest to the end of the
/// span instead of the beginning.
fn collect_span<T>(
    table: &T,
    start: &[u8],
    end: &[u8],
    limit: usize,
    reverse: bool,
) -> Result<Vec<KeyValue>, StorageError>
where
    T: ReadableTable<&'static [u8], &'static [u8]>,
{
    let range = table.range(start..end).map_err(|e| StorageError::Internal(e.to_string()))?;
    let mut entries = Vec::with_capacity(limit.min(1024));

    if reverse {
        for result in range.rev() {
            let (k, v) = result.map_err(|e| StorageError::Internal(e.to_string()))?;
            if let Some((_, logical_key)) = decode_key(k.value()) {
                entries.push((logical_key.to_vec(), v.value().to_vec()));
            }
            if entries.len() >= limit {
                break;
            }
        }
        entries.reverse();
    } else {
        for result in range {
            let (k, v) = result.map_err(|e| StorageError::Internal(e.to_string()))?;
            if let Some((_, logical_key)) = decode_key(k.value()) {
                entries.push((logical_key.to_vec(), v.value().to_vec()));
            }
            if entries.len() >= limit {
                break;
            }
        }
    }

    Ok(entries)
}

/// The smallest physical key strictly greater than `key`.
fn successor(mut key: Vec<u8>) -> Vec<u8> {
    key.push(0x00);
    key
}

impl RedbTransaction {
    /// Create a new read-only transaction.
    pub const fn new_read(tx: ReadTransaction) -> Self {
        Self::Read(tx)
    }

    /// Create a new read-write transaction.
    pub const fn new_write(tx: WriteTransaction) -> Self {
        Self::Write(tx)
    }

    /// Open the physical data table.
    ///
    /// Returns `Ok(None)` when the table has never been written, which reads
    /// as an empty database rather than an error.
    fn open_data(&self) -> Result<Option<DataTable<'_>>, StorageError> {
        let result = match self {
            Self::Read(tx) => tx.open_table(DATA_TABLE).map(DataTable::Read),
            Self::Write(tx) => tx.open_table(DATA_TABLE).map(DataTable::Write),
        };
        match result {
            Ok(table) => Ok(Some(table)),
            Err(redb::TableError::TableDoesNotExist(_)) => Ok(None),
            Err(e) => Err(StorageError::Internal(e.to_string())),
        }
    }

    /// Fetch one batch of logical entries from `table`.
    ///
    /// `resume_after` / the bounds are logical keys; the batch continues
    /// strictly after `resume_after` when scanning forward, or strictly
    /// before it when `reverse` is set.
    fn fetch_batch(
        &self,
        table: &str,
        resume_at: Option<&[u8]>,
        start: &Bound<Vec<u8>>,
        end: &Bound<Vec<u8>>,
        batch_size: usize,
        reverse: bool,
    ) -> Result<Vec<KeyValue>, StorageError> {
        let phys_start = match (reverse, resume_at) {
            (false, Some(after)) => successor(encode_key(table, after)),
            _ => match start {
                Bound::Included(k) => encode_key(table, k),
                Bound::Excluded(k) => successor(encode_key(table, k)),
                Bound::Unbounded => table_start_key(table),
            },
        };
        let phys_end = match (reverse, resume_at) {
            (true, Some(before)) => encode_key(table, before),
            _ => match end {
                Bound::Included(k) => successor(encode_key(table, k)),
                Bound::Excluded(k) => encode_key(table, k),
                Bound::Unbounded => table_end_key(table),
            },
        };

        if phys_start >= phys_end {
            return Ok(Vec::new());
        }

        match self.open_data()? {
            Some(data) => data.collect_span(&phys_start, &phys_end, batch_size, reverse),
            None => Ok(Vec::new()),
        }
    }
}

impl Transaction for RedbTransaction {
    type Cursor<'a>
        = RedbCursor<'a>
    where
        Self: 'a;

    fn get(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let Some(data) = self.open_data()? else {
            return Ok(None);
        };
        data.read_value(&encode_key(table, key))
    }

    fn put(&mut self, table: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        match self {
            Self::Read(_) => Err(StorageError::ReadOnly),
            Self::Write(tx) => {
                let mut t =
                    tx.open_table(DATA_TABLE).map_err(|e| StorageError::Internal(e.to_string()))?;
                t.insert(encode_key(table, key).as_slice(), value)
                    .map_err(|e| StorageError::Internal(e.to_string()))?;
                Ok(())
            }
        }
    }

    fn delete(&mut self, table: &str, key: &[u8]) -> Result<bool, StorageError> {
        match self {
            Self::Read(_) => Err(StorageError::ReadOnly),
            Self::Write(tx) => match tx.open_table(DATA_TABLE) {
                Ok(mut t) => match t.remove(encode_key(table, key).as_slice()) {
                    Ok(removed) => Ok(removed.is_some()),
                    Err(e) => Err(StorageError::Internal(e.to_string())),
                },
                // Table never created, so the key cannot exist.
                Err(redb::TableError::TableDoesNotExist(_)) => Ok(false),
                Err(e) => Err(StorageError::Internal(e.to_string())),
            },
        }
    }

    fn cursor(&self, table: &str) -> Result<Self::Cursor<'_>, StorageError> {
        Ok(RedbCursor::new(
            self,
            table.to_string(),
            Bound::Unbounded,
            Bound::Unbounded,
            DEFAULT_BATCH_SIZE,
        ))
    }

    fn range(
        &self,
        table: &str,
        start: Bound<&[u8]>,
        end: Bound<&[u8]>,
    ) -> Result<Self::Cursor<'_>, StorageError> {
        Ok(RedbCursor::new(
            self,
            table.to_string(),
            bound_to_owned(start),
            bound_to_owned(end),
            DEFAULT_BATCH_SIZE,
        ))
    }

    fn commit(self) -> Result<(), StorageError> {
        match self {
            // Read transactions don't need an explicit commit.
            Self::Read(_) => Ok(()),
            Self::Write(tx) => tx.commit().map_err(|e| StorageError::Transaction(e.to_string())),
        }
    }

    fn rollback(self) -> Result<(), StorageError> {
        match self {
            Self::Read(_) => Ok(()),
            Self::Write(tx) => {
                // The abort result is irrelevant when discarding changes.
                drop(tx.abort());
                Ok(())
            }
        }
    }

    fn is_read_only(&self) -> bool {
        matches!(self, Self::Read(_))
    }
}

/// Convert a `Bound<&[u8]>` to `Bound<Vec<u8>>`.
fn bound_to_owned(bound: Bound<&[u8]>) -> Bound<Vec<u8>> {
    match bound {
        Bound::Included(b) => Bound::Included(b.to_vec()),
        Bound::Excluded(b) => Bound::Excluded(b.to_vec()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// A batched streaming cursor over one logical table.
///
/// At any time the cursor holds at most `batch_size` entries in memory and
/// resumes from the last key seen when crossing a batch boundary.
pub struct RedbCursor<'a> {
    tx: &'a RedbTransaction,
    table: String,
    batch: Vec<KeyValue>,
    /// Position within the current batch, `None` when unpositioned.
    pos: Option<usize>,
    start: Bound<Vec<u8>>,
    end: Bound<Vec<u8>>,
    batch_size: usize,
    more_forward: bool,
    more_backward: bool,
}

impl<'a> RedbCursor<'a> {
    /// Create an unpositioned cursor over a logical table.
    pub const fn new(
        tx: &'a RedbTransaction,
        table: String,
        start: Bound<Vec<u8>>,
        end: Bound<Vec<u8>>,
        batch_size: usize,
    ) -> Self {
        Self {
            tx,
            table,
            batch: Vec::new(),
            pos: None,
            start,
            end,
            batch_size,
            more_forward: true,
            more_backward: true,
        }
    }

    fn entry_at(&self, pos: usize) -> Option<KeyValue> {
        self.batch.get(pos).cloned()
    }

    fn position_at(&mut self, pos: Option<usize>) -> CursorResult {
        self.pos = pos.filter(|&p| p < self.batch.len());
        Ok(self.pos.and_then(|p| self.entry_at(p)))
    }

    /// Replace the batch with the next one, continuing after the last key.
    fn load_next_batch(&mut self) -> Result<bool, StorageError> {
        if !self.more_forward {
            return Ok(false);
        }
        let after = self.batch.last().map(|(k, _)| k.clone());
        let batch = self.tx.fetch_batch(
            &self.table,
            after.as_deref(),
            &self.start,
            &self.end,
            self.batch_size,
            false,
        )?;
        if batch.is_empty() {
            self.more_forward = false;
            return Ok(false);
        }
        self.more_forward = batch.len() >= self.batch_size;
        self.more_backward = true;
        self.batch = batch;
        Ok(true)
    }

    /// Replace the batch with the previous one, ending before the first key.
    fn load_prev_batch(&mut self) -> Result<bool, StorageError> {
        if !self.more_backward {
            return Ok(false);
        }
        let before = self.batch.first().map(|(k, _)| k.clone());
        let batch = self.tx.fetch_batch(
            &self.table,
            before.as_deref(),
            &self.start,
            &self.end,
            self.batch_size,
            true,
        )?;
        if batch.is_empty() {
            self.more_backward = false;
            return Ok(false);
        }
        self.more_backward = batch.len() >= self.batch_size;
        self.more_forward = true;
        self.batch = batch;
        Ok(true)
    }
}

impl Cursor for RedbCursor<'_> {
    fn seek(&mut self, key: &[u8]) -> CursorResult {
        // The effective start is the later of the seek key and the cursor's
        // own start bound.
        let seek_start = match &self.start {
            Bound::Included(s) if s.as_slice() > key => Bound::Included(s.clone()),
            Bound::Excluded(s) if s.as_slice() >= key => Bound::Excluded(s.clone()),
            _ => Bound::Included(key.to_vec()),
        };
        self.batch =
            self.tx.fetch_batch(&self.table, None, &seek_start, &self.end, self.batch_size, false)?;
        self.more_forward = self.batch.len() >= self.batch_size;
        // Entries may exist before the seek position.
        self.more_backward = true;
        self.position_at(Some(0))
    }

    fn seek_first(&mut self) -> CursorResult {
        self.batch =
            self.tx.fetch_batch(&self.table, None, &self.start, &self.end, self.batch_size, false)?;
        self.more_forward = self.batch.len() >= self.batch_size;
        self.more_backward = false;
        self.position_at(Some(0))
    }

    fn seek_last(&mut self) -> CursorResult {
        self.batch =
            self.tx.fetch_batch(&self.table, None, &self.start, &self.end, self.batch_size, true)?;
        self.more_backward = self.batch.len() >= self.batch_size;
        self.more_forward = false;
        self.position_at(self.batch.len().checked_sub(1))
    }

    fn next(&mut self) -> CursorResult {
        match self.pos {
            None => self.seek_first(),
            Some(pos) => {
                if pos + 1 < self.batch.len() {
                    self.position_at(Some(pos + 1))
                } else if self.load_next_batch()? {
                    self.position_at(Some(0))
                } else {
                    self.position_at(None)
                }
            }
        }
    }

    fn prev(&mut self) -> CursorResult {
        match self.pos {
            None => self.seek_last(),
            Some(0) => {
                if self.load_prev_batch()? {
                    self.position_at(self.batch.len().checked_sub(1))
                } else {
                    self.position_at(None)
                }
            }
            Some(pos) => self.position_at(Some(pos - 1)),
        }
    }

    fn current(&self) -> Option<(&[u8], &[u8])> {
        self.pos.and_then(|p| self.batch.get(p)).map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}
