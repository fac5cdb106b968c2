//! Extractor trait for reading tables from a source

use crate::table::RecordTable;
use eyre::Result;

/// Extractor trait for extracting a table from a source
///
/// # Example
/// ```no_run
/// use dataset_loader::etl::Extractor;
/// use dataset_loader::table::RecordTable;
/// use eyre::Result;
///
/// struct Fixture(RecordTable);
///
/// impl Extractor for Fixture {
///     async fn extract(&self) -> Result<RecordTable> {
///         Ok(self.0.clone())
///     }
///
///     fn describe(&self) -> String {
///         "fixture".to_string()
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// Extract a table from the source
    ///
    /// # Errors
    /// Returns an error if extraction fails (I/O, parsing, malformed rows)
    fn extract(&self) -> impl std::future::Future<Output = Result<RecordTable>> + Send;

    /// Human-readable name of the source, used in logs
    fn describe(&self) -> String;
}
