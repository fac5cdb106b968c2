//! Transformer trait for data transformation

use eyre::Result;

/// Transformer trait for transforming data
///
/// # Example
/// ```no_run
/// use dataset_loader::etl::Transformer;
/// use dataset_loader::table::RecordTable;
/// use eyre::Result;
///
/// struct RowCounter;
///
/// impl Transformer for RowCounter {
///     type Input = RecordTable;
///     type Output = usize;
///
///     fn transform(&self, input: Self::Input) -> Result<Self::Output> {
///         Ok(input.len())
///     }
/// }
/// ```
pub trait Transformer: Send + Sync {
    /// Input type
    type Input: Send;

    /// Output type after transformation
    type Output: Send;

    /// Transform the input
    ///
    /// # Errors
    /// Returns an error if transformation fails (validation, conversion, etc.)
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;
}
