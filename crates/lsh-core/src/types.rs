//! Domain types shared by the crawler and the index.

use serde::{Deserialize, Serialize};

/// Stable document key: lowercase hex digest of the document path.
pub type DocId = String;

/// Structurally distinct document shapes an index can hold.
///
/// Every mapping and every crawler-built document selects its kind explicitly;
/// the tag string is what gets stored alongside the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocKind {
    /// A plain file picked up by the directory crawler.
    Doc,
}

impl DocKind {
    pub const ALL: [DocKind; 1] = [DocKind::Doc];

    pub fn tag(self) -> &'static str {
        match self {
            DocKind::Doc => "Doc",
        }
    }

    /// Attributes analyzed as full text for this kind.
    pub fn text_fields(self) -> &'static [&'static str] {
        match self {
            DocKind::Doc => &["Name", "Content"],
        }
    }
}

/// The record submitted to the index for one crawled file.
///
/// - `id`: derived from `path` only, so re-indexing a path replaces its entry
/// - `path`: the path as walked (root joined with the relative entry)
/// - `name`: the file's base name
/// - `content`: raw bytes decoded as text, invalid UTF-8 replaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub path: String,
    pub name: String,
    pub content: String,
    pub kind: DocKind,
}
