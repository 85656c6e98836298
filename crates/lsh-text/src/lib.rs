//! lsh-text
//!
//! Tantivy-backed index for crawled files: the bigram analyzer, the schema
//! mapping, index open/create/close, and free-text queries with field
//! projection.

pub mod analyzer;
pub mod error;
pub mod index;
pub mod search;
pub mod tantivy_utils;

pub use analyzer::{build_analyzer, AnalyzerRegistry, CUSTOM_ANALYZER};
pub use error::TextError;
pub use index::{IndexHandle, IndexManager};
pub use search::{Hit, QueryRunner, SearchResults};
