//! File system storage operations
//!
//! Record tables are exchanged with the file system as comma-separated
//! files: the three input datasets are read with [`CsvReader`] and the
//! combined dataset is persisted with [`CsvWriter`].

mod csv_file;

pub use csv_file::{CsvError, CsvReader, CsvWriter, read_table, write_table};
