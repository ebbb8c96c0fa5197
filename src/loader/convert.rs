use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use lazy_static::lazy_static;

use crate::{
    error::ConvertError,
    models::{Column, ColumnType, Row, TableSpec, Value},
};

lazy_static! {
    /// Cells that read as missing, matching the usual pandas `read_csv` defaults.
    static ref NULL_MARKERS: HashSet<&'static str> = [
        "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
        "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
    ]
    .into_iter()
    .collect();
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

pub fn is_null_marker(raw: &str) -> bool {
    NULL_MARKERS.contains(raw)
}

/// Converts one CSV record positionally into `table`'s column order. Missing trailing
/// fields become NULL.
pub fn convert_record(table: &TableSpec, record: &StringRecord) -> Result<Row, ConvertError> {
    if record.len() > table.columns.len() {
        return Err(ConvertError::TooManyFields {
            expected: table.columns.len(),
            found: record.len(),
        });
    }

    table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| match record.get(i) {
            Some(raw) => convert_field(column, raw),
            None => Ok(None),
        })
        .collect()
}

pub fn convert_field(column: &Column, raw: &str) -> Result<Option<Value>, ConvertError> {
    if is_null_marker(raw) {
        return Ok(None);
    }

    let invalid = || ConvertError::InvalidValue {
        column: column.name,
        value: raw.to_string(),
        expected: column.ty.describe(),
    };

    let value = match column.ty {
        ColumnType::BigInt => Value::BigInt(parse_integer(raw).ok_or_else(invalid)?),
        ColumnType::Int => {
            let v = parse_integer(raw).ok_or_else(invalid)?;
            Value::Int(i32::try_from(v).map_err(|_| invalid())?)
        }
        ColumnType::Float => Value::Float(raw.trim().parse().map_err(|_| invalid())?),
        ColumnType::Bool => Value::Bool(parse_bool(raw).ok_or_else(invalid)?),
        ColumnType::Date => Value::Date(parse_date(raw).ok_or_else(invalid)?),
        ColumnType::Varchar(_) | ColumnType::Text => Value::Text(raw.to_string()),
    };
    Ok(Some(value))
}

/// Accepts plain integers and integral floats such as `3.0`, which is how a column
/// with gaps comes back out of a dataframe export.
fn parse_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let f = raw.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "1.0" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "0.0" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}
