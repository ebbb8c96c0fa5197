use std::{collections::HashMap, env, fmt, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::{
    loader::{LoadOptions, DEFAULT_BATCH_SIZE},
    models::TableSpec,
};

pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
const DEFAULT_DB_PORT: u16 = 5432;

/// Database credentials, read once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub connect_timeout_seconds: Option<u32>,
}

impl DbConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        let port = match lookup("DB_PORT") {
            Some(port) => port
                .parse::<u16>()
                .with_context(|| format!("DB_PORT is not a valid port: {port}"))?,
            None => DEFAULT_DB_PORT,
        };
        let connect_timeout_seconds = lookup("DB_CONNECT_TIMEOUT")
            .map(|t| {
                t.parse::<u32>()
                    .with_context(|| format!("DB_CONNECT_TIMEOUT is not a number: {t}"))
            })
            .transpose()?;

        Ok(Self {
            host: required("DB_HOST")?,
            port,
            user: required("DB_USER")?,
            password: required("DB_PASSWORD")?,
            name: required("DB_NAME")?,
            connect_timeout_seconds,
        })
    }

    /// libpq keyword/value connection string.
    pub fn connection_string(&self) -> String {
        let mut parts = vec![
            format!("host={}", quote(&self.host)),
            format!("port={}", self.port),
            format!("user={}", quote(&self.user)),
            format!("password={}", quote(&self.password)),
            format!("dbname={}", quote(&self.name)),
        ];
        if let Some(timeout) = self.connect_timeout_seconds {
            parts.push(format!("connect_timeout={timeout}"));
        }
        parts.join(" ")
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("name", &self.name)
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .finish()
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Optional TOML settings file pointed to by `CONFIG_PATH`.
///
/// ```toml
/// batch_size = 1000
///
/// [tables.apartments]
/// csv_path = "/data/apartment.csv"
/// chunk_size = 10000
/// ```
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Settings {
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub tables: HashMap<String, TableSettings>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct TableSettings {
    pub csv_path: Option<PathBuf>,
    pub chunk_size: Option<usize>,
}

impl Settings {
    pub fn parse(source: &str) -> Result<Self> {
        toml::from_str(source).context("invalid settings file")
    }

    /// Settings from `CONFIG_PATH`, or the defaults when it is unset.
    pub fn read() -> Result<Self> {
        match env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                let source = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config {path}"))?;
                Self::parse(&source)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn csv_path(&self, table: &TableSpec) -> PathBuf {
        self.tables
            .get(table.name)
            .and_then(|t| t.csv_path.clone())
            .unwrap_or_else(|| PathBuf::from(table.default_csv_path))
    }

    pub fn load_options(&self, table: &TableSpec) -> LoadOptions {
        let defaults = LoadOptions::for_table(table);
        LoadOptions {
            chunk_size: self
                .tables
                .get(table.name)
                .and_then(|t| t.chunk_size)
                .unwrap_or(defaults.chunk_size),
            batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
        }
    }
}
