pub mod config;
pub mod db;
pub mod error;
pub mod loader;
pub mod logger;
pub mod models;

pub use error::{ConvertError, LoadError};
