use std::fs;
use std::path::{Path, PathBuf};

use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Term};
use tracing::{debug, info, warn};

use lsh_core::crawl::{DocumentSink, SinkError};
use lsh_core::types::Document;

use crate::analyzer::{AnalyzerRegistry, CUSTOM_ANALYZER};
use crate::error::{Result, TextError};
use crate::tantivy_utils::{build_schema, register_tokenizer, DocFields};

const DEFAULT_WRITER_MEMORY: usize = 50_000_000;

/// Opens or creates indexes with the analyzers of one registry.
pub struct IndexManager {
	registry: AnalyzerRegistry,
	analyzer: String,
	writer_memory_bytes: usize,
}

impl IndexManager {
	pub fn new(registry: AnalyzerRegistry) -> Self {
		Self { registry, analyzer: CUSTOM_ANALYZER.to_string(), writer_memory_bytes: DEFAULT_WRITER_MEMORY }
	}

	/// Analyzer used for text fields of newly created indexes.
	pub fn with_analyzer(mut self, name: &str) -> Self {
		self.analyzer = name.to_string();
		self
	}

	pub fn with_writer_memory(mut self, bytes: usize) -> Self {
		self.writer_memory_bytes = bytes;
		self
	}

	pub fn registry(&self) -> &AnalyzerRegistry {
		&self.registry
	}

	/// Open the index at `path`, creating it when nothing is there yet (a
	/// missing path or an empty directory). Any other failure is returned as is.
	pub fn open_or_create(&self, path: &Path) -> Result<IndexHandle> {
		let index = if Self::is_vacant(path)? { self.create(path)? } else { self.open(path)? };
		register_tokenizer(&index, &self.registry);
		let fields = DocFields::from_schema(&index.schema()).map_err(|source| TextError::IndexOpen { path: path.to_path_buf(), source })?;
		Ok(IndexHandle {
			path: path.to_path_buf(),
			index,
			fields,
			writer: None,
			writer_memory_bytes: self.writer_memory_bytes,
			pending: 0,
			released: false,
		})
	}

	fn is_vacant(path: &Path) -> Result<bool> {
		if !path.exists() { return Ok(true); }
		if !path.is_dir() { return Ok(false); }
		let mut entries = fs::read_dir(path).map_err(|source| TextError::Io { path: path.to_path_buf(), source })?;
		Ok(entries.next().is_none())
	}

	fn create(&self, path: &Path) -> Result<Index> {
		let schema = build_schema(&self.registry, &self.analyzer)?;
		fs::create_dir_all(path).map_err(|source| TextError::Io { path: path.to_path_buf(), source })?;
		let index = Index::create_in_dir(path, schema).map_err(|source| TextError::IndexCreate { path: path.to_path_buf(), source })?;
		info!(path = %path.display(), analyzer = %self.analyzer, "created new index");
		Ok(index)
	}

	fn open(&self, path: &Path) -> Result<Index> {
		let index = Index::open_in_dir(path).map_err(|source| TextError::IndexOpen { path: path.to_path_buf(), source })?;
		info!(path = %path.display(), "opened existing index");
		Ok(index)
	}
}

/// An open index. Writes go through a lazily created single-threaded
/// writer; `commit` makes them visible to queries.
///
/// Release happens exactly once: through [`IndexHandle::close`], or on drop
/// for every other exit path. Both commit pending writes and free the
/// writer lock.
pub struct IndexHandle {
	path: PathBuf,
	index: Index,
	fields: DocFields,
	writer: Option<IndexWriter>,
	writer_memory_bytes: usize,
	pending: usize,
	released: bool,
}

impl IndexHandle {
	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn index(&self) -> &Index {
		&self.index
	}

	pub fn fields(&self) -> &DocFields {
		&self.fields
	}

	/// Insert `doc` under `id`, replacing whatever was stored under that id.
	pub fn put(&mut self, id: &str, doc: Document) -> Result<()> {
		let fields = self.fields;
		let writer = self.writer()?;
		writer.delete_term(Term::from_field_text(fields.id, id));
		writer.add_document(fields.to_document(id, doc)).map_err(TextError::Write)?;
		self.pending += 1;
		Ok(())
	}

	pub fn commit(&mut self) -> Result<()> {
		if let Some(writer) = self.writer.as_mut() {
			if self.pending > 0 {
				writer.commit().map_err(TextError::Write)?;
				info!(path = %self.path.display(), documents = self.pending, "committed");
				self.pending = 0;
			}
		}
		Ok(())
	}

	/// Number of live documents as of the last commit.
	pub fn num_docs(&self) -> Result<u64> {
		Ok(self.reader()?.searcher().num_docs())
	}

	pub(crate) fn reader(&self) -> Result<IndexReader> {
		self.index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(TextError::Search)
	}

	pub fn close(mut self) -> Result<()> {
		self.release()
	}

	fn writer(&mut self) -> Result<&mut IndexWriter> {
		let writer = match self.writer.take() {
			Some(writer) => writer,
			None => {
				debug!(path = %self.path.display(), "starting index writer");
				self.index.writer_with_num_threads(1, self.writer_memory_bytes).map_err(TextError::Write)?
			}
		};
		Ok(self.writer.insert(writer))
	}

	fn release(&mut self) -> Result<()> {
		if self.released { return Ok(()); }
		self.released = true;
		if let Some(mut writer) = self.writer.take() {
			if self.pending > 0 {
				writer.commit().map_err(TextError::Write)?;
				self.pending = 0;
			}
			writer.wait_merging_threads().map_err(TextError::Write)?;
		}
		info!(path = %self.path.display(), "index closed");
		Ok(())
	}
}

impl DocumentSink for IndexHandle {
	fn put(&mut self, id: &str, doc: Document) -> std::result::Result<(), SinkError> {
		IndexHandle::put(self, id, doc).map_err(SinkError::from)
	}
}

impl Drop for IndexHandle {
	fn drop(&mut self) {
		if let Err(err) = self.release() {
			warn!(path = %self.path.display(), error = %err, "failed to release index");
		}
	}
}
