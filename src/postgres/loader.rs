//! Transactional bulk insertion of record tables

use super::Connection;
use crate::etl::Loader;
use crate::table::RecordTable;
use std::ops::Range;
use tokio::sync::Mutex;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Statement, Transaction};

/// Rows per INSERT statement unless configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// PostgreSQL's limit on bind parameters in one statement
const MAX_PARAMETERS: usize = u16::MAX as usize;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot insert into `{table}`: the table has no columns")]
    NoColumns { table: String },

    #[error("failed to insert rows {rows:?} into `{table}`, transaction rolled back: {source}")]
    Failed {
        table: String,
        rows: Range<usize>,
        #[source]
        source: tokio_postgres::Error,
    },
}

/// Render an identifier for SQL
///
/// Plain identifiers are left bare so PostgreSQL folds them to lower case,
/// the same way as the `CREATE TABLE` that made the destination. Anything
/// else is double-quoted.
pub fn identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Render a possibly schema-qualified table name
pub fn table_name(name: &str) -> String {
    name.split('.').map(identifier).collect::<Vec<_>>().join(".")
}

/// Build a multi-row INSERT with one bind parameter per cell
pub fn insert_statement(destination: &str, columns: &[String], rows: usize) -> String {
    let width = columns.len();
    let columns = columns
        .iter()
        .map(|c| identifier(c))
        .collect::<Vec<_>>()
        .join(",");
    let values = (0..rows)
        .map(|row| {
            let params = (1..=width)
                .map(|col| format!("${}", row * width + col))
                .collect::<Vec<_>>()
                .join(",");
            format!("({})", params)
        })
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "INSERT INTO {}({}) VALUES {}",
        table_name(destination),
        columns,
        values
    )
}

/// Rows per statement, bounded by the bind parameter limit
pub fn rows_per_statement(page_size: usize, width: usize) -> usize {
    page_size.min(MAX_PARAMETERS / width.max(1)).max(1)
}

/// Insert every row of `table` into `destination` in one transaction
///
/// The destination must already exist with matching columns. On any error
/// the transaction is rolled back, nothing is committed and the error is
/// returned; the call is never retried.
pub async fn load(
    connection: &mut Connection,
    table: &RecordTable,
    destination: &str,
    page_size: usize,
) -> Result<u64, LoadError> {
    if table.is_empty() {
        log::warn!("No rows to insert into {}", destination);
        return Ok(0);
    }
    if table.width() == 0 {
        return Err(LoadError::NoColumns {
            table: destination.to_string(),
        });
    }

    let per_statement = rows_per_statement(page_size, table.width());
    log::info!(
        "Inserting {} rows into {} ({} rows per statement)",
        table.len(),
        destination,
        per_statement
    );

    let failed = |rows: Range<usize>| {
        move |source| LoadError::Failed {
            table: destination.to_string(),
            rows,
            source,
        }
    };
    let all_rows = 0..table.len();

    let transaction = connection
        .client_mut()
        .transaction()
        .await
        .map_err(failed(all_rows.clone()))?;

    let inserted = insert_pages(&transaction, table, destination, per_statement).await;
    match inserted {
        Ok(inserted) => {
            transaction.commit().await.map_err(failed(all_rows))?;
            log::info!("Committed {} rows to {}", inserted, destination);
            Ok(inserted)
        }
        Err((rows, source)) => {
            log::error!(
                "Insert into {} failed at rows {:?}: {}",
                destination,
                rows,
                source
            );
            if let Err(e) = transaction.rollback().await {
                log::warn!("Rollback failed, the server discards the transaction: {}", e);
            }
            Err(failed(rows)(source))
        }
    }
}

async fn insert_pages(
    transaction: &Transaction<'_>,
    table: &RecordTable,
    destination: &str,
    per_statement: usize,
) -> Result<u64, (Range<usize>, tokio_postgres::Error)> {
    let mut inserted = 0;
    let mut prepared: Option<(usize, Statement)> = None;

    for (page, rows) in table.rows().chunks(per_statement).enumerate() {
        let start = page * per_statement;
        let range = start..start + rows.len();

        let statement = match &prepared {
            Some((len, statement)) if *len == rows.len() => statement.clone(),
            _ => {
                let sql = insert_statement(destination, table.columns(), rows.len());
                let statement = transaction
                    .prepare(&sql)
                    .await
                    .map_err(|e| (range.clone(), e))?;
                prepared = Some((rows.len(), statement.clone()));
                statement
            }
        };

        let params: Vec<&(dyn ToSql + Sync)> = rows
            .iter()
            .flatten()
            .map(|value| value as &(dyn ToSql + Sync))
            .collect();

        inserted += transaction
            .execute(&statement, &params)
            .await
            .map_err(|e| (range.clone(), e))?;
        log::debug!("Inserted rows {:?}", range);
    }

    Ok(inserted)
}

/// [`Loader`] writing tables into one PostgreSQL destination table
pub struct BulkLoader {
    connection: Mutex<Connection>,
    destination: String,
    page_size: usize,
}

impl BulkLoader {
    pub fn new(connection: Connection, destination: impl Into<String>) -> Self {
        Self {
            connection: Mutex::new(connection),
            destination: destination.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Insert all rows in one transaction, see [`load`]
    pub async fn insert(&self, table: &RecordTable) -> Result<u64, LoadError> {
        let mut connection = self.connection.lock().await;
        load(&mut connection, table, &self.destination, self.page_size).await
    }

    /// Release the loader and close its connection
    pub async fn close(self) {
        self.connection.into_inner().close().await;
    }
}

impl Loader for BulkLoader {
    async fn load(&self, table: &RecordTable) -> eyre::Result<usize> {
        let inserted = self.insert(table).await?;
        Ok(inserted as usize)
    }
}
