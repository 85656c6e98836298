use std::collections::BTreeMap;

use tantivy::collector::{Count, TopDocs};
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value};
use tantivy::{Searcher, TantivyDocument};
use tracing::debug;

use crate::error::{Result, TextError};
use crate::index::IndexHandle;
use crate::tantivy_utils::DocFields;

/// One ranked match. `fields` holds exactly the requested stored fields
/// that the document has a value for.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
	pub id: String,
	pub score: f32,
	pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct SearchResults {
	/// Matches overall, before pagination.
	pub total: usize,
	pub hits: Vec<Hit>,
}

/// Runs free-text queries against the last committed state of an index.
pub struct QueryRunner {
	searcher: Searcher,
	schema: Schema,
	fields: DocFields,
	parser: QueryParser,
}

impl QueryRunner {
	pub fn new(handle: &IndexHandle) -> Result<Self> {
		let searcher = handle.reader()?.searcher();
		let fields = *handle.fields();
		let parser = QueryParser::for_index(handle.index(), fields.default_query_fields());
		Ok(Self { searcher, schema: handle.index().schema(), fields, parser })
	}

	/// Parse `query` with tantivy's query syntax and return hits `offset..offset + limit`
	/// in relevance order, each projected onto `returned_fields`.
	pub fn search<S: AsRef<str>>(&self, query: &str, returned_fields: &[S], limit: usize, offset: usize) -> Result<SearchResults> {
		if limit == 0 {
			return Err(TextError::InvalidPagination("limit must be at least 1".to_string()));
		}
		let projection = self.projection(returned_fields)?;
		let parsed = self.parser.parse_query(query)?;
		let (total, top_docs) = self.searcher.search(&parsed, &(Count, TopDocs::with_limit(limit).and_offset(offset))).map_err(TextError::Search)?;
		debug!(query, total, returned = top_docs.len(), "search finished");

		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, address) in top_docs {
			let doc: TantivyDocument = self.searcher.doc(address).map_err(TextError::Search)?;
			let id = first_text(&doc, self.fields.id).unwrap_or_default();
			let fields = projection.iter().filter_map(|(name, field)| first_text(&doc, *field).map(|value| (name.clone(), value))).collect();
			hits.push(Hit { id, score, fields });
		}
		Ok(SearchResults { total, hits })
	}

	fn projection<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<(String, Field)>> {
		names
			.iter()
			.map(|name| {
				let name = name.as_ref();
				match self.schema.get_field(name) {
					Ok(field) if self.schema.get_field_entry(field).is_stored() => Ok((name.to_string(), field)),
					_ => Err(TextError::UnknownField(name.to_string())),
				}
			})
			.collect()
	}
}

fn first_text(doc: &TantivyDocument, field: Field) -> Option<String> {
	doc.get_first(field).and_then(|v| v.as_str()).map(str::to_string)
}
