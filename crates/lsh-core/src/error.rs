use std::path::PathBuf;

use thiserror::Error;

use crate::crawl::CrawlError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot expand '{}': {reason}", path.display())]
    PathExpansion { path: PathBuf, reason: String },

    #[error(transparent)]
    Crawl(#[from] CrawlError),
}

pub type Result<T> = std::result::Result<T, Error>;
