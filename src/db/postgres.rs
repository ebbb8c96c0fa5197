use diesel::{
    pg::Pg,
    query_builder::{BoxedSqlQuery, SqlQuery},
    sql_types, Connection, PgConnection, RunQueryDsl,
};
use log::{debug, info};

use super::{sql, UpsertStore};
use crate::{
    error::LoadError,
    models::{Column, ColumnType, Row, TableSpec, Value},
};

type Query = BoxedSqlQuery<'static, Pg, SqlQuery>;

/// A live PostgreSQL connection. Dropping it closes the connection.
pub struct PgStore {
    conn: PgConnection,
}

impl PgStore {
    pub fn new(conn: PgConnection) -> Self {
        Self { conn }
    }
}

impl UpsertStore for PgStore {
    fn ensure_table(&mut self, table: &TableSpec) -> Result<(), LoadError> {
        let ddl = sql::create_table_sql(table);
        debug!("{ddl}");
        diesel::sql_query(ddl).execute(&mut self.conn)?;
        info!("Table '{}' ready.", table.name);
        Ok(())
    }

    fn upsert_batch(&mut self, table: &TableSpec, rows: &[Row]) -> Result<usize, LoadError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let statement = sql::build_upsert(table, rows);
        if statement.rows < rows.len() {
            debug!(
                "Collapsed {} duplicate keys in batch for {}",
                rows.len() - statement.rows,
                table.name
            );
        }

        let mut query: Query = diesel::sql_query(statement.sql).into_boxed();
        for (column, cell) in statement.params {
            query = bind_cell(query, column, cell);
        }

        self.conn
            .transaction::<_, diesel::result::Error, _>(|conn| query.execute(conn))?;

        Ok(rows.len())
    }
}

impl Drop for PgStore {
    fn drop(&mut self) {
        info!("Connection closed.");
    }
}

fn bind_cell(query: Query, column: &Column, cell: Option<Value>) -> Query {
    match cell {
        Some(Value::BigInt(v)) => query.bind::<sql_types::BigInt, _>(v),
        Some(Value::Int(v)) => query.bind::<sql_types::Integer, _>(v),
        Some(Value::Float(v)) => query.bind::<sql_types::Double, _>(v),
        Some(Value::Bool(v)) => query.bind::<sql_types::Bool, _>(v),
        Some(Value::Date(v)) => query.bind::<sql_types::Date, _>(v),
        Some(Value::Text(v)) => query.bind::<sql_types::Text, _>(v),
        None => bind_null(query, column.ty),
    }
}

fn bind_null(query: Query, ty: ColumnType) -> Query {
    use sql_types::Nullable;

    match ty {
        ColumnType::BigInt => query.bind::<Nullable<sql_types::BigInt>, _>(None::<i64>),
        ColumnType::Int => query.bind::<Nullable<sql_types::Integer>, _>(None::<i32>),
        ColumnType::Float => query.bind::<Nullable<sql_types::Double>, _>(None::<f64>),
        ColumnType::Bool => query.bind::<Nullable<sql_types::Bool>, _>(None::<bool>),
        ColumnType::Date => {
            query.bind::<Nullable<sql_types::Date>, _>(None::<chrono::NaiveDate>)
        }
        ColumnType::Varchar(_) | ColumnType::Text => {
            query.bind::<Nullable<sql_types::Text>, _>(None::<String>)
        }
    }
}
