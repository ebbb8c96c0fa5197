pub mod memory;
pub mod postgres;
pub mod schema;
pub mod sql;

use diesel::{Connection, ConnectionError, PgConnection};

use crate::{
    config::DbConfig,
    error::LoadError,
    models::{Row, TableSpec},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Destination the loader writes into.
pub trait UpsertStore {
    /// Create-if-absent DDL for `table`. Safe to call on every run.
    fn ensure_table(&mut self, table: &TableSpec) -> Result<(), LoadError>;

    /// Upserts one batch and commits it. Returns the number of rows submitted.
    fn upsert_batch(&mut self, table: &TableSpec, rows: &[Row]) -> Result<usize, LoadError>;
}

pub fn establish_connection(config: &DbConfig) -> Result<PgConnection, ConnectionError> {
    PgConnection::establish(&config.connection_string())
}

/// Opens a [`PgStore`] for `config`.
pub fn connect(config: &DbConfig) -> Result<PgStore, ConnectionError> {
    establish_connection(config).map(PgStore::new)
}
