//! Pipeline orchestration for the merge stage

use super::{Extractor, Loader, Transformer};
use crate::table::RecordTable;
use crate::transform::MergeInput;
use eyre::{Context, Result};

/// Pipeline that extracts the three input tables, merges them and hands the
/// combined table to a sink
///
/// # Type Parameters
/// - `E`: Extractor type for the three inputs
/// - `T`: Transformer turning a [`MergeInput`] into a combined table
/// - `S`: Loader the combined table is persisted with
///
/// # Example
/// ```no_run
/// use dataset_loader::etl::MergePipeline;
/// use dataset_loader::storage::{CsvReader, CsvWriter};
/// use dataset_loader::transform::DatasetMerger;
///
/// # async fn example() -> eyre::Result<()> {
/// let pipeline = MergePipeline::new(
///     CsvReader::new("data/train.csv"),
///     CsvReader::new("data/test.csv"),
///     CsvReader::new("data/gender_submission.csv"),
///     DatasetMerger::new("PassengerId"),
///     CsvWriter::new("data/titanic_data.csv"),
/// );
///
/// let combined = pipeline.run().await?;
/// println!("Merged {} rows", combined.len());
/// # Ok(())
/// # }
/// ```
pub struct MergePipeline<E, T, S> {
    training: E,
    unlabeled: E,
    labels: E,
    merger: T,
    sink: S,
}

impl<E, T, S> MergePipeline<E, T, S>
where
    E: Extractor,
    T: Transformer<Input = MergeInput, Output = RecordTable>,
    S: Loader,
{
    /// Create a new pipeline
    pub fn new(training: E, unlabeled: E, labels: E, merger: T, sink: S) -> Self {
        Self {
            training,
            unlabeled,
            labels,
            merger,
            sink,
        }
    }

    /// Run the merge stage
    ///
    /// Steps:
    /// 1. Extract the training, unlabeled and labels tables
    /// 2. Merge them into the combined table
    /// 3. Persist the combined table to the sink
    ///
    /// Returns the combined table for the load stage
    ///
    /// # Errors
    /// Returns an error if any stage fails
    pub async fn run(&self) -> Result<RecordTable> {
        log::info!("Starting merge pipeline");

        let training = extract(&self.training, "training").await?;
        let unlabeled = extract(&self.unlabeled, "unlabeled").await?;
        let labels = extract(&self.labels, "labels").await?;

        log::debug!("Merging tables...");
        let combined = self
            .merger
            .transform(MergeInput {
                training,
                unlabeled,
                labels,
            })
            .context("Failed to merge datasets")?;

        log::debug!("Writing combined table...");
        let count = self
            .sink
            .load(&combined)
            .await
            .context("Failed to persist combined dataset")?;
        log::info!("Persisted {} combined rows", count);

        Ok(combined)
    }
}

async fn extract<E: Extractor>(extractor: &E, role: &str) -> Result<RecordTable> {
    let table = extractor
        .extract()
        .await
        .with_context(|| format!("Failed to read {} data from {}", role, extractor.describe()))?;
    log::info!(
        "Extracted {} {} rows ({} columns)",
        table.len(),
        role,
        table.width()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use crate::transform::DatasetMerger;
    use std::sync::{Arc, Mutex};

    struct MockExtractor(RecordTable);

    impl Extractor for MockExtractor {
        async fn extract(&self) -> Result<RecordTable> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "mock".to_string()
        }
    }

    struct CapturingLoader(Arc<Mutex<Option<RecordTable>>>);

    impl Loader for CapturingLoader {
        async fn load(&self, table: &RecordTable) -> Result<usize> {
            *self.0.lock().unwrap() = Some(table.clone());
            Ok(table.len())
        }
    }

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> MockExtractor {
        MockExtractor(
            RecordTable::new(columns.iter().map(|c| c.to_string()).collect(), rows).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_pipeline() {
        let captured = Arc::new(Mutex::new(None));

        let pipeline = MergePipeline::new(
            table(&["id", "label"], vec![vec![1.into(), 0.into()]]),
            table(&["id"], vec![vec![2.into()]]),
            table(&["id", "label"], vec![vec![2.into(), 1.into()]]),
            DatasetMerger::new("id"),
            CapturingLoader(captured.clone()),
        );

        let combined = pipeline.run().await.unwrap();
        assert_eq!(combined.len(), 2);
        assert_eq!(captured.lock().unwrap().as_ref(), Some(&combined));
    }

    #[tokio::test]
    async fn test_merge_failure_skips_sink() {
        let captured = Arc::new(Mutex::new(None));

        let pipeline = MergePipeline::new(
            table(&["id", "label"], vec![]),
            table(&["id"], vec![vec![3.into()]]),
            table(&["id", "label"], vec![vec![2.into(), 1.into()]]),
            DatasetMerger::new("id"),
            CapturingLoader(captured.clone()),
        );

        let err = pipeline.run().await.unwrap_err();
        assert!(format!("{:?}", err).contains("join integrity violated"));
        assert!(captured.lock().unwrap().is_none());
    }
}
