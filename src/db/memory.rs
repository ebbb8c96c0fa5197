use std::collections::{BTreeMap, HashMap};

use diesel::result::{DatabaseErrorKind, Error::DatabaseError};

use super::UpsertStore;
use crate::{
    error::LoadError,
    models::{Row, TableSpec},
};

/// A statement the store was asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    CreateTable(&'static str),
    Upsert { table: &'static str, rows: usize },
}

/// In-process store with the same upsert semantics as the database: rows are keyed by
/// the table key and the last write for a key replaces the whole row.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: HashMap<&'static str, BTreeMap<Vec<String>, Row>>,
    statements: Vec<Statement>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Rows of `table` ordered by their rendered key.
    pub fn rows(&self, table: &str) -> Vec<&Row> {
        self.tables
            .get(table)
            .map(|rows| rows.values().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// Looks a row up by its rendered key parts, e.g. `&["1", "7", "2024-01-01"]`.
    pub fn get(&self, table: &str, key: &[&str]) -> Option<&Row> {
        let key: Vec<String> = key.iter().map(|k| k.to_string()).collect();
        self.tables.get(table)?.get(&key)
    }
}

impl UpsertStore for MemoryStore {
    fn ensure_table(&mut self, table: &TableSpec) -> Result<(), LoadError> {
        self.tables.entry(table.name).or_default();
        self.statements.push(Statement::CreateTable(table.name));
        Ok(())
    }

    fn upsert_batch(&mut self, table: &TableSpec, rows: &[Row]) -> Result<usize, LoadError> {
        let stored = self
            .tables
            .get_mut(table.name)
            .ok_or_else(|| LoadError::UnknownTable(table.name.to_string()))?;

        let key_indices = table.key_indices();
        for row in rows {
            if key_indices.iter().any(|&i| row.get(i).map_or(true, Option::is_none)) {
                return Err(LoadError::Database(DatabaseError(
                    DatabaseErrorKind::NotNullViolation,
                    Box::new(format!("null value in key of relation \"{}\"", table.name)),
                )));
            }
        }

        for row in rows {
            stored.insert(table.key_of(row), row.clone());
        }
        self.statements.push(Statement::Upsert {
            table: table.name,
            rows: rows.len(),
        });
        Ok(rows.len())
    }
}
