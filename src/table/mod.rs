//! In-memory tabular data
//!
//! A [`RecordTable`] is the unit of data passed between the pipeline
//! stages: CSV files are read into tables, tables are merged, and the
//! combined table is written back to CSV and loaded into PostgreSQL.

mod record_table;
mod value;

pub use record_table::{RecordTable, Row, TableError};
pub use value::{ColumnType, Value};
