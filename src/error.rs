use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Data source error: {0}")]
    DataSource(#[from] sqlx::Error),

    #[error("Unparseable order date: {0:?}")]
    InvalidOrderDate(String),

    #[error("Store access error at {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Malformed sheet {sheet}: {reason}")]
    MalformedSheet { sheet: String, reason: String },

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Cell [{row}, {column}] is not part of sheet {sheet}")]
    UnknownCell {
        sheet: String,
        row: String,
        column: String,
    },

    #[error("Aggregation invariant violated: cell [{row}, {column}] of sheet {sheet} written twice")]
    DuplicateCell {
        sheet: String,
        row: String,
        column: String,
    },

    #[error("Quantity overflow while aggregating sheet {0}")]
    QuantityOverflow(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ReportError {
    pub(crate) fn store(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Store {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
