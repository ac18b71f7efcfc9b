// Error types for dump conversion.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

#[derive(Error, Debug)]
pub enum ConvertError {
    // Raised before any parsing starts; the binary treats it as a clean exit.
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    // An INSERT line with no VALUES keyword. Aborts the whole buffer being flushed.
    #[error("INSERT for table {table} has no VALUES clause: {line}")]
    MissingValuesClause { table: String, line: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConvertError {
    // Errors confined to a single table; the run may continue past them.
    pub fn is_table_local(&self) -> bool {
        matches!(self, ConvertError::MissingValuesClause { .. })
    }
}
