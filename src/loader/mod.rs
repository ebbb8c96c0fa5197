//! Chunked CSV to upsert loading.
//!
//! A load reads the source CSV in chunks of `chunk_size` records, converts every record
//! of a chunk, then upserts the chunk in batches of `batch_size` rows. Each batch is
//! committed on its own, so a failure leaves every earlier batch applied and nothing
//! after it.

pub mod chunks;
pub mod convert;

use std::{
    fs::File,
    io::Read,
    path::Path,
    time::{Duration, Instant},
};

use csv::{ReaderBuilder, StringRecord};
use diesel::ConnectionError;
use log::{debug, error, info, warn};

use crate::{
    db::{sql, UpsertStore},
    error::LoadError,
    models::{Row, TableSpec},
};

pub use chunks::CsvChunks;
pub use convert::convert_record;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Records read from the CSV at once.
    pub chunk_size: usize,
    /// Rows per upsert statement and commit.
    pub batch_size: usize,
}

impl LoadOptions {
    pub fn for_table(table: &TableSpec) -> Self {
        Self {
            chunk_size: table.default_chunk_size,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Rejects sizes of zero and batches that would exceed the bind parameter limit
    /// of a single upsert into `table`.
    pub fn validate(&self, table: &TableSpec) -> Result<(), LoadError> {
        if self.chunk_size == 0 || self.batch_size == 0 {
            return Err(LoadError::InvalidOptions(format!(
                "chunk size and batch size must be positive (got {} and {})",
                self.chunk_size, self.batch_size
            )));
        }
        let max_rows = sql::max_batch_rows(table);
        if self.batch_size > max_rows {
            return Err(LoadError::InvalidOptions(format!(
                "batch size {} for {} needs {} bind parameters; at most {} rows fit in one \
                 statement",
                self.batch_size,
                table.name,
                self.batch_size * table.columns.len(),
                max_rows
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    pub chunks: usize,
    pub batches: usize,
    pub elapsed: Duration,
}

/// Loads every record of `reader` into `table`. The table must already exist.
pub fn load_reader<S, R>(
    store: &mut S,
    table: &TableSpec,
    reader: R,
    options: LoadOptions,
) -> Result<LoadReport, LoadError>
where
    S: UpsertStore + ?Sized,
    R: Read,
{
    options.validate(table)?;
    let start = Instant::now();

    let rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let mut chunks = CsvChunks::new(rdr, options.chunk_size);
    check_headers(table, chunks.headers()?);

    let mut report = LoadReport::default();
    for chunk in chunks {
        let records = chunk?;
        report.chunks += 1;
        debug!(
            "Read chunk {} of {} records for {}",
            report.chunks,
            records.len(),
            table.name
        );

        let rows = convert_chunk(table, &records)?;
        for batch in rows.chunks(options.batch_size) {
            report.rows += store.upsert_batch(table, batch)?;
            report.batches += 1;
            info!("Inserted {} records so far into {}...", report.rows, table.name);
        }
    }

    report.elapsed = start.elapsed();
    Ok(report)
}

pub fn load_file<S>(
    store: &mut S,
    table: &TableSpec,
    path: &Path,
    options: LoadOptions,
) -> Result<LoadReport, LoadError>
where
    S: UpsertStore + ?Sized,
{
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loading {} from {}", table.name, path.display());
    load_reader(store, table, file, options)
}

/// Full run for one table: connect, ensure the table, load the file. A connection
/// failure is logged and returns `Ok(None)` without touching the table or the file.
/// The store is dropped on every path out of here.
pub fn run<S, F>(
    table: &TableSpec,
    path: &Path,
    options: LoadOptions,
    connect: F,
) -> Result<Option<LoadReport>, LoadError>
where
    S: UpsertStore,
    F: FnOnce() -> Result<S, ConnectionError>,
{
    options.validate(table)?;
    let mut store = match connect() {
        Ok(store) => {
            info!("Connected to database.");
            store
        }
        Err(e) => {
            error!("Connection error: {e}");
            return Ok(None);
        }
    };

    store.ensure_table(table)?;
    let report = load_file(&mut store, table, path, options)?;
    info!(
        "All {} inserted successfully ({} records in {}).",
        table.label,
        report.rows,
        humantime::format_duration(Duration::from_millis(report.elapsed.as_millis() as u64))
    );
    Ok(Some(report))
}

fn convert_chunk(table: &TableSpec, records: &[StringRecord]) -> Result<Vec<Row>, LoadError> {
    records
        .iter()
        .map(|record| {
            convert_record(table, record).map_err(|source| LoadError::Convert {
                line: record.position().map_or(0, |p| p.line()),
                source,
            })
        })
        .collect()
}

fn check_headers(table: &TableSpec, headers: &StringRecord) {
    let expected = table.column_names();
    let found: Vec<&str> = headers.iter().map(str::trim).collect();
    if found != expected {
        warn!(
            "CSV header for {} does not match the table columns; mapping by position. \
             expected {:?}, found {:?}",
            table.name, expected, found
        );
    }
}
