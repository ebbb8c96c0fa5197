use std::collections::HashMap;

use crate::models::{Column, Row, TableSpec, Value};

/// Bind parameters one statement may carry over the PostgreSQL wire protocol.
pub const MAX_BIND_PARAMS: usize = u16::MAX as usize;

/// Largest batch of `table` rows that fits in one upsert statement.
pub fn max_batch_rows(table: &TableSpec) -> usize {
    MAX_BIND_PARAMS / table.columns.len().max(1)
}

/// A rendered upsert with its parameters in placeholder order.
#[derive(Debug)]
pub struct UpsertStatement {
    pub sql: String,
    pub params: Vec<(&'static Column, Option<Value>)>,
    /// Rows left after collapsing duplicate keys.
    pub rows: usize,
}

/// Renders one upsert for `rows`, duplicate keys collapsed to their last occurrence.
pub fn build_upsert(table: &TableSpec, rows: &[Row]) -> UpsertStatement {
    let unique = dedupe_last_wins(table, rows);
    let sql = upsert_sql(table, unique.len());
    let rows = unique.len();
    let columns: &'static [Column] = table.columns;
    let params = unique
        .into_iter()
        .flat_map(move |row| columns.iter().zip(row))
        .collect();

    UpsertStatement { sql, params, rows }
}

pub fn create_table_sql(table: &TableSpec) -> String {
    let mut definitions: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.ty))
        .collect();
    definitions.push(format!("PRIMARY KEY ({})", table.key.join(", ")));

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        table.name,
        definitions.join(",\n    ")
    )
}

/// Multi-row upsert for `row_count` rows. Placeholders are numbered row-major.
pub fn upsert_sql(table: &TableSpec, row_count: usize) -> String {
    let width = table.columns.len();
    let values: Vec<String> = (0..row_count)
        .map(|r| {
            let params: Vec<String> = (1..=width).map(|c| format!("${}", r * width + c)).collect();
            format!("({})", params.join(", "))
        })
        .collect();

    let updates: Vec<String> = table
        .non_key_columns()
        .map(|c| format!("{0} = EXCLUDED.{0}", c.name))
        .collect();
    let conflict_action = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    format!(
        "INSERT INTO {} ({}) VALUES {} ON CONFLICT ({}) {}",
        table.name,
        table.column_names().join(", "),
        values.join(", "),
        table.key.join(", "),
        conflict_action
    )
}

/// Collapses rows sharing a key to the last one, keeping the position of that last
/// occurrence. One `ON CONFLICT DO UPDATE` statement may not touch a key twice.
pub fn dedupe_last_wins(table: &TableSpec, rows: &[Row]) -> Vec<Row> {
    let mut last_seen: HashMap<Vec<String>, usize> = HashMap::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        last_seen.insert(table.key_of(row), i);
    }

    rows.iter()
        .enumerate()
        .filter(|(i, row)| last_seen.get(&table.key_of(row)) == Some(i))
        .map(|(_, row)| row.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::{APARTMENTS, USER_VIEWINGS};
    use crate::db::schema::{ALL_TABLES, APARTMENTS_ATTRIBUTES, BOOKINGS};
    use crate::models::ColumnType;

    fn placeholders(sql: &str) -> usize {
        sql.matches('$').count()
    }

    fn booking(id: i64, status: &str) -> Row {
        let mut r: Row = vec![None; BOOKINGS.columns.len()];
        r[0] = Some(Value::BigInt(id));
        r[8] = Some(Value::Text(status.to_string()));
        r
    }

    #[test]
    fn create_table_for_composite_key() {
        let sql = create_table_sql(&USER_VIEWINGS);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS user_viewings ("));
        assert!(sql.contains("call_to_action VARCHAR(100)"));
        assert!(sql.contains("PRIMARY KEY (user_id, apartment_id, viewed_at)"));
    }

    #[test]
    fn upsert_lists_every_non_key_column() {
        let sql = upsert_sql(&APARTMENTS, 2);
        assert!(sql.contains("VALUES ($1, $2, $3, $4, $5, $6, $7, $8), ($9, $10"));
        assert!(sql.contains("ON CONFLICT (id) DO UPDATE SET title = EXCLUDED.title"));
        assert!(sql.ends_with("last_modified_timestamp = EXCLUDED.last_modified_timestamp"));
        assert!(!sql.contains("id = EXCLUDED.id"));
    }

    #[test]
    fn key_only_table_does_nothing_on_conflict() {
        static TAGS: TableSpec = TableSpec {
            name: "tags",
            label: "tags",
            columns: &[Column::new("tag", ColumnType::Text)],
            key: &["tag"],
            default_csv_path: "tags.csv",
            default_chunk_size: 1,
        };
        assert!(upsert_sql(&TAGS, 1).ends_with("ON CONFLICT (tag) DO NOTHING"));
    }

    #[test]
    fn dedupe_keeps_last_occurrence() {
        let row = |id: i64, title: &str| -> Row {
            let mut r: Row = vec![None; APARTMENTS.columns.len()];
            r[0] = Some(Value::BigInt(id));
            r[1] = Some(Value::Text(title.to_string()));
            r
        };
        let rows = vec![row(42, "old"), row(7, "other"), row(42, "new")];

        let deduped = dedupe_last_wins(&APARTMENTS, &rows);

        assert_eq!(deduped, vec![row(7, "other"), row(42, "new")]);
    }

    #[test]
    fn bound_params_match_placeholders_after_dedupe() {
        let rows = vec![
            booking(1, "pending"),
            booking(2, "pending"),
            booking(1, "confirmed"),
        ];

        let statement = build_upsert(&BOOKINGS, &rows);

        assert_eq!(statement.rows, 2);
        assert_eq!(placeholders(&statement.sql), statement.params.len());
        assert_eq!(statement.params.len(), BOOKINGS.columns.len() * 2);
        let statuses: Vec<_> = statement
            .params
            .iter()
            .filter(|(column, _)| column.name == "booking_status")
            .map(|(_, cell)| cell.clone())
            .collect();
        assert_eq!(
            statuses,
            vec![
                Some(Value::Text("pending".to_string())),
                Some(Value::Text("confirmed".to_string()))
            ]
        );
    }

    #[test]
    fn largest_batch_stays_within_bind_limit() {
        for table in ALL_TABLES {
            let rows = max_batch_rows(table);
            assert!(rows * table.columns.len() <= MAX_BIND_PARAMS, "{}", table.name);
            assert!((rows + 1) * table.columns.len() > MAX_BIND_PARAMS, "{}", table.name);
        }
        assert_eq!(max_batch_rows(&APARTMENTS_ATTRIBUTES), 3855);
    }
}
