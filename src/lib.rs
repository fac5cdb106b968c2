//! Dataset Loader
//!
//! Merges a training CSV with an unlabeled CSV and its label CSV into one
//! labeled dataset, then bulk-loads it into a PostgreSQL table

pub mod cli;
pub mod config;
pub mod etl;
pub mod postgres;
pub mod storage;
pub mod table;
pub mod transform;

// Re-exports for convenience
pub use config::{ConfigError, LoadConfig, MergeConfig};
pub use etl::{Extractor, Loader, MergePipeline, Transformer};
pub use postgres::{BulkLoader, ConnectionParams, LoadError};
pub use storage::{CsvReader, CsvWriter};
pub use table::{RecordTable, Value};
pub use transform::{DatasetMerger, JoinPolicy, MergeError};
