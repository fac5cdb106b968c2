//! Loader trait for writing tables to destinations

use crate::table::RecordTable;
use eyre::Result;

/// Loader trait for loading a table to a destination
///
/// Implementors:
/// - [`CsvWriter`](crate::storage::CsvWriter) writes a delimited file
/// - [`BulkLoader`](crate::postgres::BulkLoader) inserts into PostgreSQL
pub trait Loader: Send + Sync {
    /// Load every row of `table` to the destination
    ///
    /// Returns the number of rows loaded
    ///
    /// # Errors
    /// Returns an error if loading fails; loaders that write transactionally
    /// leave the destination unchanged in that case
    fn load(&self, table: &RecordTable) -> impl std::future::Future<Output = Result<usize>> + Send;
}
