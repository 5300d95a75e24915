//! Error types for georewrite.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GeoRewriteError>;

#[derive(Debug, Error)]
pub enum GeoRewriteError {
    /// The extractor produced a corner sequence of unsupported length.
    #[error("Unsupported envelope with {corners} corners (expected 0, 1, 2 or 5)")]
    InvalidEnvelope { corners: usize },

    /// The caller-supplied envelope extractor failed.
    #[error("Envelope extraction failed: {0}")]
    Extractor(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Envelope coordinate must be finite, got: ({x}, {y})")]
    NonFiniteCoordinate { x: f64, y: f64 },

    /// Query rectangle with inverted or non-finite bounds.
    #[error("Invalid query rectangle: {0}")]
    InvalidQuery(String),

    #[error("Malformed SQL: {0}")]
    MalformedSql(String),

    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),

    #[error("No queryer registered for table {0}")]
    QueryerNotFound(String),

    #[error("Undeclared column: {table}.{column}")]
    UnknownColumn { table: String, column: String },

    #[error("Row has {actual} values but the result set has {expected} columns")]
    RowArity { expected: usize, actual: usize },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Geometry codec error: {0}")]
    Geometry(#[from] geozero::error::GeozeroError),

    #[error("Unknown queryer implementation: {0}")]
    UnknownImplementation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GeoRewriteError {
    /// Wraps an extractor failure, keeping the cause as the error source.
    pub fn extractor<E>(cause: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Extractor(cause.into())
    }
}
