use std::fmt;

use super::value::{Row, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Int,
    Float,
    Bool,
    Date,
    Varchar(u16),
    Text,
}

impl ColumnType {
    /// Human name used in conversion errors.
    pub fn describe(&self) -> &'static str {
        match self {
            ColumnType::BigInt | ColumnType::Int => "integer",
            ColumnType::Float => "float",
            ColumnType::Bool => "boolean",
            ColumnType::Date => "date",
            ColumnType::Varchar(_) | ColumnType::Text => "text",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::BigInt => f.write_str("BIGINT"),
            ColumnType::Int => f.write_str("INT"),
            // PostgreSQL reads a bare FLOAT as double precision.
            ColumnType::Float => f.write_str("FLOAT"),
            ColumnType::Bool => f.write_str("BOOLEAN"),
            ColumnType::Date => f.write_str("DATE"),
            ColumnType::Varchar(n) => write!(f, "VARCHAR({n})"),
            ColumnType::Text => f.write_str("TEXT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

impl Column {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self { name, ty }
    }
}

/// Declarative description of one destination table and where its rows come from.
#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    /// Used in the final success line, e.g. "apartment attributes".
    pub label: &'static str,
    /// Column order matches the source CSV exactly.
    pub columns: &'static [Column],
    pub key: &'static [&'static str],
    pub default_csv_path: &'static str,
    pub default_chunk_size: usize,
}

impl TableSpec {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn is_key(&self, column: &str) -> bool {
        self.key.contains(&column)
    }

    /// Positions of the key columns, in key order.
    pub fn key_indices(&self) -> Vec<usize> {
        self.key
            .iter()
            .filter_map(|k| self.columns.iter().position(|c| c.name == *k))
            .collect()
    }

    pub fn non_key_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.iter().filter(move |c| !self.is_key(c.name))
    }

    /// Key of a converted row. NULL key parts render as an empty string.
    pub fn key_of(&self, row: &Row) -> Vec<String> {
        self.key_indices()
            .into_iter()
            .map(|i| {
                row.get(i)
                    .and_then(|cell| cell.as_ref())
                    .map(Value::to_string)
                    .unwrap_or_default()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static PAIRS: TableSpec = TableSpec {
        name: "pairs",
        label: "pairs",
        columns: &[
            Column::new("left_id", ColumnType::BigInt),
            Column::new("note", ColumnType::Varchar(20)),
            Column::new("right_id", ColumnType::BigInt),
        ],
        key: &["left_id", "right_id"],
        default_csv_path: "pairs.csv",
        default_chunk_size: 10,
    };

    #[test]
    fn key_indices_follow_key_order() {
        assert_eq!(PAIRS.key_indices(), vec![0, 2]);
        let non_key: Vec<_> = PAIRS.non_key_columns().map(|c| c.name).collect();
        assert_eq!(non_key, vec!["note"]);
    }

    #[test]
    fn key_of_renders_values() {
        let row: Row = vec![Some(Value::BigInt(1)), None, Some(Value::BigInt(7))];
        assert_eq!(PAIRS.key_of(&row), vec!["1".to_string(), "7".to_string()]);
    }

    #[test]
    fn ddl_type_names() {
        assert_eq!(ColumnType::Varchar(255).to_string(), "VARCHAR(255)");
        assert_eq!(ColumnType::Bool.to_string(), "BOOLEAN");
        assert_eq!(ColumnType::Float.to_string(), "FLOAT");
    }
}
