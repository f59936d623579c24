pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod store;

pub use config::AppConfig;
pub use db::{create_pool, PgTransactionSource, TransactionSource};
pub use error::{ReportError, Result};
pub use service::ReportService;
pub use store::{CsvDirectoryStore, MemoryStore, ReportStore};
