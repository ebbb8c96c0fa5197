use std::path::PathBuf;

use thiserror::Error;

/// Failure converting a single CSV field into its column's type.
#[derive(Debug, Error, PartialEq)]
pub enum ConvertError {
    #[error("column `{column}`: cannot parse {value:?} as {expected}")]
    InvalidValue {
        column: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("expected at most {expected} fields, found {found}")]
    TooManyFields { expected: usize, found: usize },
}

/// Anything that aborts a load once the connection is up.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: {source}")]
    Convert {
        line: u64,
        #[source]
        source: ConvertError,
    },

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("table `{0}` has not been created")]
    UnknownTable(String),

    #[error("invalid load options: {0}")]
    InvalidOptions(String),
}
