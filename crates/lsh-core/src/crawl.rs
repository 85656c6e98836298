//! Directory crawl: walk a root, keep eligible files, hand documents to a sink.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::filter::PathFilter;
use crate::identity::identify_path;
use crate::types::{DocId, DocKind, Document};

/// Error type sinks report; boxed so any engine can plug in its own.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Destination for crawled documents. `put` is insert-or-replace by id.
pub trait DocumentSink {
    fn put(&mut self, id: &str, doc: Document) -> Result<(), SinkError>;
}

impl<S: DocumentSink + ?Sized> DocumentSink for &mut S {
    fn put(&mut self, id: &str, doc: Document) -> Result<(), SinkError> {
        (**self).put(id, doc)
    }
}

/// In-memory sink keyed by document id.
impl DocumentSink for BTreeMap<DocId, Document> {
    fn put(&mut self, id: &str, doc: Document) -> Result<(), SinkError> {
        self.insert(id.to_string(), doc);
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Failed to list {}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to index {}", path.display())]
    Submit {
        path: PathBuf,
        #[source]
        source: SinkError,
    },
}

impl CrawlError {
    pub fn path(&self) -> &Path {
        match self {
            CrawlError::Walk { path, .. } | CrawlError::Read { path, .. } | CrawlError::Submit { path, .. } => path,
        }
    }
}

/// What to do once something under the root fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CrawlPolicy {
    /// Stop at the first failure. Documents already submitted stay submitted.
    #[default]
    FailFast,
    /// Record the failure and keep walking.
    BestEffort,
}

/// Outcome of one crawl: ids submitted, files passed over, and failures in
/// the order they happened (at most one under [`CrawlPolicy::FailFast`]).
#[derive(Debug, Default)]
pub struct CrawlReport {
    pub ids: Vec<DocId>,
    pub skipped: usize,
    pub failures: Vec<CrawlError>,
}

impl CrawlReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn indexed(&self) -> usize {
        self.ids.len()
    }

    pub fn first_failure(&self) -> Option<&CrawlError> {
        self.failures.first()
    }

    /// Turn the report into an error if anything failed.
    pub fn into_result(mut self) -> Result<Self, CrawlError> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(self.failures.remove(0))
        }
    }
}

/// Read one file into a [`Document`] of kind `Doc`.
pub fn read_document(path: &Path) -> Result<Document, CrawlError> {
    let bytes = fs::read(path).map_err(|source| CrawlError::Read { path: path.to_path_buf(), source })?;
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    Ok(Document {
        id: identify_path(path),
        path: path.to_string_lossy().into_owned(),
        name,
        content: String::from_utf8_lossy(&bytes).into_owned(),
        kind: DocKind::Doc,
    })
}

/// Walk `root` recursively and submit every regular file whose name passes
/// `filter`. Directories are descended into but never submitted. Symlinks,
/// including links to regular files, are not followed; they and other
/// special files are passed over. Order follows the filesystem's
/// listing order.
pub fn crawl<S>(root: &Path, filter: &PathFilter, sink: &mut S, policy: CrawlPolicy) -> CrawlReport
where
    S: DocumentSink + ?Sized,
{
    info!(root = %root.display(), suffixes = ?filter.suffixes(), "crawl started");
    let mut report = CrawlReport::default();

    for entry in WalkDir::new(root) {
        let result = match entry {
            Err(source) => {
                let path = source.path().unwrap_or(root).to_path_buf();
                Err(CrawlError::Walk { path, source })
            }
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    if entry.path_is_symlink() {
                        debug!(path = %entry.path().display(), "symlink not followed");
                    }
                    continue;
                }
                if !filter.matches(&entry.file_name().to_string_lossy()) {
                    report.skipped += 1;
                    continue;
                }
                submit(entry.path(), sink)
            }
        };

        match result {
            Ok(id) => report.ids.push(id),
            Err(err) => {
                let stop = policy == CrawlPolicy::FailFast;
                if !stop {
                    warn!(path = %err.path().display(), error = %err, "skipping after failure");
                }
                report.failures.push(err);
                if stop {
                    break;
                }
            }
        }
    }

    info!(indexed = report.indexed(), skipped = report.skipped, failures = report.failures.len(), "crawl finished");
    report
}

fn submit<S>(path: &Path, sink: &mut S) -> Result<DocId, CrawlError>
where
    S: DocumentSink + ?Sized,
{
    let doc = read_document(path)?;
    let id = doc.id.clone();
    sink.put(&id, doc).map_err(|source| CrawlError::Submit { path: path.to_path_buf(), source })?;
    debug!(path = %path.display(), id = %id, "submitted");
    Ok(id)
}
