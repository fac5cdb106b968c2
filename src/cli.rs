//! CLI helper functions

use crate::{
    config::{LoadConfig, MergeConfig},
    etl::MergePipeline,
    postgres::{BulkLoader, Connection},
    storage::{CsvReader, CsvWriter},
    table::RecordTable,
    transform::DatasetMerger,
};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;

/// Merge the training, unlabeled and label files and write the combined file
///
/// Pipeline: CsvReader ×3 → DatasetMerger → CsvWriter
pub async fn merge_datasets(config: &MergeConfig) -> Result<RecordTable> {
    log::info!(
        "Merging {} + {} labeled by {} on {}",
        config.training.display().bright_black(),
        config.unlabeled.display().bright_black(),
        config.labels.display().bright_black(),
        config.join_key.cyan()
    );
    log::debug!("Join policy: {}", config.join_policy);

    let pipeline = MergePipeline::new(
        CsvReader::new(&config.training),
        CsvReader::new(&config.unlabeled),
        CsvReader::new(&config.labels),
        DatasetMerger::new(&config.join_key).with_policy(config.join_policy),
        CsvWriter::new(&config.output),
    );
    let combined = pipeline.run().await?;

    log::info!(
        "✓ Wrote {} combined row(s) to {}",
        combined.len().cyan(),
        config.output.display().bright_black()
    );
    Ok(combined)
}

/// Read a previously combined file for loading
pub fn read_dataset(path: impl AsRef<Path>) -> Result<RecordTable> {
    let path = path.as_ref();
    log::info!("Reading dataset from {}", path.display().bright_black());
    let table = CsvReader::new(path).read()?;
    log::info!("Read {} row(s)", table.len().cyan());
    Ok(table)
}

/// Insert `table` into the configured destination and close the connection
///
/// The connection is closed whether or not the insert succeeds.
pub async fn load_dataset(
    connection: Connection,
    config: &LoadConfig,
    table: &RecordTable,
) -> Result<u64> {
    let loader = BulkLoader::new(connection, &config.table).with_page_size(config.page_size);
    let inserted = loader.insert(table).await;
    loader.close().await;

    let inserted = inserted.with_context(|| {
        format!("Failed to load dataset into table {}", config.table)
    })?;
    log::info!(
        "✓ Inserted {} row(s) into {}",
        inserted.cyan(),
        config.table.bright_black()
    );
    Ok(inserted)
}
