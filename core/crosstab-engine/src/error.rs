//! FILENAME: core/crosstab-engine/src/error.rs

use sql_query::QueryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrosstabError {
    /// Missing or unusable configuration / data source. Fatal to the call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failures of the query object or its executor, passed through as-is.
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CrosstabError>;
