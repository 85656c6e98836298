use std::collections::BTreeSet;

use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::{doc, Index, TantivyDocument};

use lsh_core::types::{DocKind, Document};

use crate::analyzer::AnalyzerRegistry;
use crate::error::{Result, TextError};

pub const ID_FIELD: &str = "ID";
pub const KIND_FIELD: &str = "Kind";
pub const PATH_FIELD: &str = "Path";
pub const NAME_FIELD: &str = "Name";
pub const CONTENT_FIELD: &str = "Content";

/// Build the index mapping: exact-match `ID`, `Kind` and `Path`, plus every
/// text attribute of every [`DocKind`] analyzed with `analyzer`.
pub fn build_schema(registry: &AnalyzerRegistry, analyzer: &str) -> Result<Schema> {
	if !registry.contains(analyzer) {
		return Err(TextError::UnknownAnalyzer(analyzer.to_string()));
	}
	let mut schema_builder = Schema::builder();
	schema_builder.add_text_field(ID_FIELD, STRING | STORED);
	schema_builder.add_text_field(KIND_FIELD, STRING | STORED);
	schema_builder.add_text_field(PATH_FIELD, STRING | STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(analyzer).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing).set_stored();
	let mut added = BTreeSet::new();
	for kind in DocKind::ALL {
		for name in kind.text_fields() {
			if added.insert(*name) {
				schema_builder.add_text_field(name, text_options.clone());
			}
		}
	}
	Ok(schema_builder.build())
}

/// Tokenizers are not persisted with the index, so every open index needs
/// the registry installed before it is written to or queried.
pub fn register_tokenizer(index: &Index, registry: &AnalyzerRegistry) {
	registry.install(index.tokenizers());
}

/// Field handles of a `Doc` index.
#[derive(Debug, Clone, Copy)]
pub struct DocFields {
	pub id: Field,
	pub kind: Field,
	pub path: Field,
	pub name: Field,
	pub content: Field,
}

impl DocFields {
	pub fn from_schema(schema: &Schema) -> tantivy::Result<Self> {
		Ok(Self {
			id: schema.get_field(ID_FIELD)?,
			kind: schema.get_field(KIND_FIELD)?,
			path: schema.get_field(PATH_FIELD)?,
			name: schema.get_field(NAME_FIELD)?,
			content: schema.get_field(CONTENT_FIELD)?,
		})
	}

	/// Fields searched when a query term names no field.
	pub fn default_query_fields(&self) -> Vec<Field> {
		vec![self.name, self.content]
	}

	pub fn to_document(&self, id: &str, doc: Document) -> TantivyDocument {
		doc!(
			self.id => id.to_string(),
			self.kind => doc.kind.tag().to_string(),
			self.path => doc.path,
			self.name => doc.name,
			self.content => doc.content,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::analyzer::CUSTOM_ANALYZER;

	#[test]
	fn doc_text_fields_use_the_requested_analyzer() {
		let schema = build_schema(&AnalyzerRegistry::with_defaults(), CUSTOM_ANALYZER).unwrap();
		for name in [NAME_FIELD, CONTENT_FIELD] {
			let entry = schema.get_field_entry(schema.get_field(name).unwrap());
			assert!(entry.is_stored());
			let tantivy::schema::FieldType::Str(options) = entry.field_type() else { panic!("{name} is not text") };
			let indexing = options.get_indexing_options().unwrap();
			assert_eq!(indexing.tokenizer(), CUSTOM_ANALYZER);
			assert_eq!(indexing.index_option(), IndexRecordOption::WithFreqsAndPositions);
		}
		assert!(DocFields::from_schema(&schema).is_ok());
	}

	#[test]
	fn unregistered_analyzer_is_refused() {
		let err = build_schema(&AnalyzerRegistry::new(), CUSTOM_ANALYZER).unwrap_err();
		assert!(matches!(err, TextError::UnknownAnalyzer(name) if name == CUSTOM_ANALYZER));
	}
}
