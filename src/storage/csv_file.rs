//! Comma-separated file operations
//!
//! Files have a header row, UTF-8 content and no index column. Column types
//! are inferred when reading (see [`ColumnType::infer`]).

use crate::etl::{Extractor, Loader};
use crate::table::{ColumnType, RecordTable, TableError, Value};

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Errors raised while reading or writing CSV files
#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed table in {}: {source}", .path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: TableError,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Read a CSV file into a [`RecordTable`]
pub struct CsvReader {
    path: PathBuf,
}

impl CsvReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read the whole file
    pub fn read(&self) -> Result<RecordTable, CsvError> {
        let file = File::open(&self.path).map_err(|source| CsvError::Open {
            path: self.path.clone(),
            source,
        })?;
        read_table(BufReader::new(file), &self.path)
    }
}

/// Parse CSV content from any reader; `origin` only labels errors.
pub fn read_table(reader: impl Read, origin: &Path) -> Result<RecordTable, CsvError> {
    let parse_error = |source| CsvError::Parse {
        path: origin.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let columns: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .enumerate()
        .map(|(i, name)| match i {
            0 => name.trim_start_matches('\u{feff}').to_string(),
            _ => name.to_string(),
        })
        .collect();

    let records = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(parse_error)?;

    let types: Vec<ColumnType> = (0..columns.len())
        .map(|i| ColumnType::infer(records.iter().filter_map(|r| r.get(i))))
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            record
                .iter()
                .zip(&types)
                .map(|(field, column_type)| Value::parse(field, *column_type))
                .collect()
        })
        .collect();

    log::debug!(
        "Read {} rows x {} columns from {}",
        records.len(),
        columns.len(),
        origin.display()
    );

    RecordTable::new(columns, rows).map_err(|source| CsvError::Table {
        path: origin.to_path_buf(),
        source,
    })
}

impl Extractor for CsvReader {
    async fn extract(&self) -> eyre::Result<RecordTable> {
        Ok(self.read()?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Write a [`RecordTable`] as a CSV file
pub struct CsvWriter {
    path: PathBuf,
}

impl CsvWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Write the header and every row, replacing any existing file
    ///
    /// Missing parent directories are created.
    pub fn write(&self, table: &RecordTable) -> Result<(), CsvError> {
        let open_error = |source| CsvError::Open {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(open_error)?;
        }
        let file = File::create(&self.path).map_err(open_error)?;

        write_table(BufWriter::new(file), table).map_err(|source| CsvError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Serialize a table as CSV to any writer
pub fn write_table(writer: impl Write, table: &RecordTable) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().from_writer(writer);
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|v| v.to_field().into_owned()))?;
    }
    writer.flush()?;
    Ok(())
}

impl Loader for CsvWriter {
    async fn load(&self, table: &RecordTable) -> eyre::Result<usize> {
        self.write(table)?;
        Ok(table.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    const TRAIN: &str = "\
PassengerId,Survived,Pclass,Name,Age,Ticket,Fare
1,0,3,\"Braund, Mr. Owen Harris\",22,A/5 21171,7.25
2,1,1,\"Cumings, Mrs. John Bradley (Florence Briggs Thayer)\",38,PC 17599,71.2833
6,0,3,\"Moran, Mr. James\",,330877,8.4583
";

    #[test]
    fn test_read_infers_types() {
        let table = read_table(TRAIN.as_bytes(), Path::new("train.csv")).unwrap();

        assert_eq!(table.shape(), (3, 7));
        assert_eq!(table.get(0, "PassengerId"), Some(&Value::Integer(1)));
        assert_eq!(
            table.get(0, "Name"),
            Some(&Value::from("Braund, Mr. Owen Harris"))
        );
        assert_eq!(table.get(2, "Age"), Some(&Value::Null));
        assert_eq!(table.get(0, "Age"), Some(&Value::Integer(22)));
        assert_eq!(table.get(2, "Ticket"), Some(&Value::from("330877")));
        assert_eq!(table.get(0, "Fare"), Some(&Value::Float(7.25)));
    }

    #[test]
    fn test_read_strips_byte_order_mark() {
        let content = "\u{feff}id,label\n1,0\n";
        let table = read_table(content.as_bytes(), Path::new("bom.csv")).unwrap();
        assert_eq!(table.columns(), ["id", "label"]);
    }

    #[test]
    fn test_ragged_row_is_a_parse_error() {
        let content = "id,label\n1,0\n2\n";
        let err = read_table(content.as_bytes(), Path::new("ragged.csv")).unwrap_err();
        assert!(matches!(err, CsvError::Parse { .. }));
        assert!(err.to_string().contains("ragged.csv"));
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = CsvReader::new(temp.path().join("absent.csv"))
            .read()
            .unwrap_err();
        assert!(matches!(err, CsvError::Open { .. }));
    }

    #[test]
    fn test_write_read_preserves_rows_and_columns() {
        let temp = NamedTempFile::new().unwrap();
        let table = read_table(TRAIN.as_bytes(), Path::new("train.csv")).unwrap();

        CsvWriter::new(temp.path()).write(&table).unwrap();
        let read_back = CsvReader::new(temp.path()).read().unwrap();

        assert_eq!(table, read_back);
    }

    #[test]
    fn test_write_formats_fields() {
        let table = RecordTable::new(
            vec!["id".into(), "fare".into(), "cabin".into()],
            vec![vec![1.into(), 8.0.into(), Value::Null]],
        )
        .unwrap();

        let mut buffer = Vec::new();
        write_table(&mut buffer, &table).unwrap();

        assert_eq!(String::from_utf8(buffer).unwrap(), "id,fare,cabin\n1,8.0,\n");
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data").join("out.csv");
        let table = RecordTable::new(vec!["id".into()], vec![vec![1.into()]]).unwrap();

        CsvWriter::new(&path).write(&table).unwrap();
        assert!(path.exists());
    }
}
