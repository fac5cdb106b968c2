//! PostgreSQL bulk loading
//!
//! - [`connect`] opens a session from explicit [`ConnectionParams`]
//! - [`load`] inserts a whole [`RecordTable`](crate::table::RecordTable) in
//!   one transaction, committing every row or none
//! - [`BulkLoader`] wraps both as an ETL [`Loader`](crate::etl::Loader)
//!
//! Cells are bound as statement parameters typed after the destination
//! columns (see the `ToSql` impl for [`Value`](crate::table::Value)).

mod connection;
mod loader;
mod types;

pub use connection::{Connection, ConnectError, ConnectionParams, DEFAULT_PORT, connect};
pub use loader::{
    BulkLoader, DEFAULT_PAGE_SIZE, LoadError, identifier, insert_statement, load,
    rows_per_statement, table_name,
};
