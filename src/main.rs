use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Parser;
use dotenvy::dotenv;
use log::{info, LevelFilter};

use rental_ingest::{
    config::{DbConfig, Settings},
    db::{self, schema, MemoryStore, UpsertStore},
    loader::{self, LoadOptions},
    logger::setup_logger,
    models::TableSpec,
};

#[derive(Parser)]
#[command(name = "rental-ingest")]
#[command(about = "Upsert rental listing CSV exports into PostgreSQL")]
#[command(version)]
struct Cli {
    /// Tables to load, in order. Defaults to all of them.
    #[arg(value_parser = parse_table)]
    tables: Vec<&'static TableSpec>,

    /// CSV to read instead of the configured path (single table only)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Records read from the CSV at once
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Rows per upsert statement and commit
    #[arg(long)]
    batch_size: Option<usize>,

    /// Parse and convert the CSV without connecting to the database
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Accepts a table name, with `-` allowed in place of `_`.
fn parse_table(name: &str) -> Result<&'static TableSpec, String> {
    schema::find(&name.replace('-', "_")).ok_or_else(|| {
        let known: Vec<&str> = schema::ALL_TABLES.iter().map(|t| t.name).collect();
        format!("unknown table `{name}` (expected one of: {})", known.join(", "))
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logger(if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    })?;

    dotenv().ok();
    let settings = Settings::read()?;

    let tables: Vec<&'static TableSpec> = if cli.tables.is_empty() {
        schema::ALL_TABLES.to_vec()
    } else {
        cli.tables.clone()
    };
    if cli.csv.is_some() && tables.len() != 1 {
        bail!("--csv needs exactly one table");
    }

    let db_config = if cli.dry_run {
        None
    } else {
        Some(DbConfig::from_env()?)
    };

    let plan = tables
        .into_iter()
        .map(|table| -> Result<_> {
            let path = cli.csv.clone().unwrap_or_else(|| settings.csv_path(table));
            let defaults = settings.load_options(table);
            let options = LoadOptions {
                chunk_size: cli.chunk_size.unwrap_or(defaults.chunk_size),
                batch_size: cli.batch_size.unwrap_or(defaults.batch_size),
            };
            options.validate(table)?;
            Ok((table, path, options))
        })
        .collect::<Result<Vec<_>>>()?;

    for (table, path, options) in plan {
        match &db_config {
            Some(config) => {
                loader::run(table, &path, options, || db::connect(config))?;
            }
            None => dry_run(table, &path, options)?,
        }
    }

    Ok(())
}

fn dry_run(table: &TableSpec, path: &Path, options: LoadOptions) -> Result<()> {
    let mut store = MemoryStore::new();
    store.ensure_table(table)?;
    let report = loader::load_file(&mut store, table, path, options)?;
    info!(
        "Dry run for {}: {} records read, {} distinct keys, {} batches",
        table.name,
        report.rows,
        store.len(table.name),
        report.batches
    );
    Ok(())
}
