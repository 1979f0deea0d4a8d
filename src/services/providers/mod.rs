//! Reference table providers
//!
//! The recommendation engines never own data. Calendar, categories and shiurim
//! snapshots come from a pluggable provider (CSV exports, Postgres, or tables
//! built in memory), injected as `Arc<dyn TableProvider>`.

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Table, TableName},
};

pub mod csv_files;
pub mod memory;
pub mod postgres;

pub use csv_files::CsvTableProvider;
pub use memory::InMemoryTableProvider;
pub use postgres::{PostgresTableProvider, RelationNames};

/// Trait for reference table providers
///
/// Each call returns the current full snapshot of the table. Snapshots are
/// immutable, so a request can hold one across awaits without locking.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TableProvider: Send + Sync {
    /// Load the current snapshot of `table`
    async fn load_table(&self, table: TableName) -> AppResult<Arc<Table>>;

    /// Identity of the data currently served, when the provider can tell.
    ///
    /// The value must change whenever any table changes. Cached results are keyed
    /// on it, and `None` means results from this provider are never cached.
    async fn snapshot_version(&self) -> AppResult<Option<String>> {
        Ok(None)
    }

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
