use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the tantivy-backed index and query layer.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("Failed to open index at {}", path.display())]
    IndexOpen {
        path: PathBuf,
        #[source]
        source: tantivy::TantivyError,
    },

    #[error("Failed to create index at {}", path.display())]
    IndexCreate {
        path: PathBuf,
        #[source]
        source: tantivy::TantivyError,
    },

    #[error("IO error at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Index write failed")]
    Write(#[source] tantivy::TantivyError),

    #[error("Query parse error")]
    Query(#[from] tantivy::query::QueryParserError),

    #[error("Search failed")]
    Search(#[source] tantivy::TantivyError),

    #[error("Field not found: {0}")]
    UnknownField(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Analyzer '{0}' is already registered")]
    AnalyzerAlreadyRegistered(String),

    #[error("Analyzer '{0}' is not registered")]
    UnknownAnalyzer(String),

    #[error("Invalid n-gram range {min}..={max}")]
    InvalidNgramRange { min: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, TextError>;
