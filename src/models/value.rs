use std::fmt;

use chrono::NaiveDate;

/// A single non-null cell. NULL is carried as `None` in a [`Row`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    BigInt(i64),
    Int(i32),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Text(String),
}

/// One converted CSV record, in table column order.
pub type Row = Vec<Option<Value>>;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::BigInt(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::Text(v) => f.write_str(v),
        }
    }
}
