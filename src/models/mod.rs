pub mod table;
pub mod value;

pub use table::{Column, ColumnType, TableSpec};
pub use value::{Row, Value};
