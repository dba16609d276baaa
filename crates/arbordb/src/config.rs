//! Database configuration and builder.

use std::path::{Path, PathBuf};

use crate::database::Database;
use crate::error::Result;

/// Configuration for opening a database.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Path to the database file. Ignored for in-memory databases.
    pub path: PathBuf,
    /// Whether to create an in-memory database.
    pub in_memory: bool,
    /// Storage cache size in bytes. Unset uses the backend default.
    pub cache_size: Option<usize>,
}

/// Builder for opening a database with custom options.
///
/// # Example
///
/// ```no_run
/// use arbordb::DatabaseBuilder;
///
/// # fn main() -> arbordb::Result<()> {
/// let db = DatabaseBuilder::new()
///     .path("experiments.arbor")
///     .cache_size(64 * 1024 * 1024)
///     .open()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DatabaseBuilder {
    config: Config,
}

impl DatabaseBuilder {
    /// Create a builder with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for an in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        let mut builder = Self::new();
        builder.config.in_memory = true;
        builder
    }

    /// Set the database file path.
    #[must_use]
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.path = path.as_ref().to_path_buf();
        self
    }

    /// Set the storage cache size in bytes.
    #[must_use]
    pub const fn cache_size(mut self, size: usize) -> Self {
        self.config.cache_size = Some(size);
        self
    }

    /// Open the database with the configured options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Open`](crate::Error::Open) if the database cannot
    /// be opened or created.
    pub fn open(self) -> Result<Database> {
        Database::open_with_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_options() {
        let builder = DatabaseBuilder::new().path("graph.arbor").cache_size(1024);

        assert_eq!(builder.config.path, PathBuf::from("graph.arbor"));
        assert_eq!(builder.config.cache_size, Some(1024));
        assert!(!builder.config.in_memory);
    }
}
