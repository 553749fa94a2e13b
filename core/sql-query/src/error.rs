//! FILENAME: core/sql-query/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Query has no FROM table")]
    MissingTable,

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error(transparent)]
    Source(#[from] Box<dyn std::error::Error + Send + Sync>),
}
