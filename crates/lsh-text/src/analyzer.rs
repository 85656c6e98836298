//! Text analysis for indexed fields.
//!
//! The `custom` pipeline splits on Unicode word boundaries, applies NFKD,
//! lowercases, and expands every token into its overlapping bigrams, so a
//! query matches any substring of at least two characters without a
//! language-aware segmenter.

use std::collections::BTreeMap;
use std::fmt;
use std::mem;

use tantivy::tokenizer::{
    LowerCaser, TextAnalyzer, Token, TokenFilter, TokenStream, Tokenizer, TokenizerManager,
};
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::{UnicodeSegmentation, UnicodeWordIndices};

use crate::error::{Result, TextError};

/// Name under which the bigram pipeline is registered.
pub const CUSTOM_ANALYZER: &str = "custom";

/// Splits text on UAX #29 word boundaries, keeping only word-like segments.
#[derive(Clone, Default)]
pub struct UnicodeWordTokenizer {
    token: Token,
}

pub struct UnicodeWordTokenStream<'a> {
    words: UnicodeWordIndices<'a>,
    token: &'a mut Token,
}

impl Tokenizer for UnicodeWordTokenizer {
    type TokenStream<'a> = UnicodeWordTokenStream<'a>;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        self.token.reset();
        UnicodeWordTokenStream { words: text.unicode_word_indices(), token: &mut self.token }
    }
}

impl TokenStream for UnicodeWordTokenStream<'_> {
    fn advance(&mut self) -> bool {
        self.token.text.clear();
        self.token.position = self.token.position.wrapping_add(1);
        match self.words.next() {
            Some((offset, word)) => {
                self.token.offset_from = offset;
                self.token.offset_to = offset + word.len();
                self.token.text.push_str(word);
                true
            }
            None => false,
        }
    }

    fn token(&self) -> &Token {
        self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        self.token
    }
}

/// Rewrites each token into Unicode compatibility decomposition (NFKD).
#[derive(Clone, Copy, Debug, Default)]
pub struct NfkdNormalizer;

impl TokenFilter for NfkdNormalizer {
    type Tokenizer<T: Tokenizer> = NfkdFilter<T>;

    fn transform<T: Tokenizer>(self, tokenizer: T) -> Self::Tokenizer<T> {
        NfkdFilter { tokenizer, buffer: String::new() }
    }
}

#[derive(Clone)]
pub struct NfkdFilter<T> {
    tokenizer: T,
    buffer: String,
}

impl<T: Tokenizer> Tokenizer for NfkdFilter<T> {
    type TokenStream<'a> = NfkdTokenStream<'a, T::TokenStream<'a>>;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        self.buffer.clear();
        NfkdTokenStream { tail: self.tokenizer.token_stream(text), buffer: &mut self.buffer }
    }
}

pub struct NfkdTokenStream<'a, T> {
    tail: T,
    buffer: &'a mut String,
}

impl<T: TokenStream> TokenStream for NfkdTokenStream<'_, T> {
    fn advance(&mut self) -> bool {
        if !self.tail.advance() {
            return false;
        }
        // ASCII is already in NFKD
        if !self.tail.token().text.is_ascii() {
            self.buffer.clear();
            self.buffer.extend(self.tail.token().text.nfkd());
            mem::swap(&mut self.tail.token_mut().text, &mut *self.buffer);
        }
        true
    }

    fn token(&self) -> &Token {
        self.tail.token()
    }

    fn token_mut(&mut self) -> &mut Token {
        self.tail.token_mut()
    }
}

/// Replaces each token with its character n-grams, shortest first.
///
/// Tokens shorter than `min` characters produce nothing. Every emitted gram
/// gets the next position in the stream, so the grams of one query word form
/// a phrase that matches contiguous grams in the indexed text. A one-position
/// gap separates the grams of consecutive words, so such a phrase never spans
/// a word boundary.
#[derive(Clone, Copy, Debug)]
pub struct NgramFilter {
    min: usize,
    max: usize,
}

impl NgramFilter {
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if min == 0 || min > max {
            return Err(TextError::InvalidNgramRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn bigrams() -> Self {
        Self { min: 2, max: 2 }
    }
}

impl TokenFilter for NgramFilter {
    type Tokenizer<T: Tokenizer> = NgramFilterWrapper<T>;

    fn transform<T: Tokenizer>(self, tokenizer: T) -> Self::Tokenizer<T> {
        NgramFilterWrapper { tokenizer, min: self.min, max: self.max }
    }
}

#[derive(Clone)]
pub struct NgramFilterWrapper<T> {
    tokenizer: T,
    min: usize,
    max: usize,
}

impl<T: Tokenizer> Tokenizer for NgramFilterWrapper<T> {
    type TokenStream<'a> = NgramTokenStream<T::TokenStream<'a>>;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        NgramTokenStream {
            tail: self.tokenizer.token_stream(text),
            min: self.min,
            max: self.max,
            source: String::new(),
            bounds: Vec::new(),
            size: 0,
            start: 0,
            position: 0,
            token: Token::default(),
        }
    }
}

pub struct NgramTokenStream<T> {
    tail: T,
    min: usize,
    max: usize,
    // upstream token being expanded
    source: String,
    // byte offset of every char in `source`, then `source.len()`
    bounds: Vec<usize>,
    size: usize,
    start: usize,
    position: usize,
    token: Token,
}

impl<T: TokenStream> NgramTokenStream<T> {
    fn chars(&self) -> usize {
        self.bounds.len().saturating_sub(1)
    }

    fn load_next_source(&mut self) -> bool {
        while self.tail.advance() {
            let upstream = self.tail.token();
            if upstream.text.chars().count() < self.min {
                continue;
            }
            self.source.clear();
            self.source.push_str(&upstream.text);
            self.token.offset_from = upstream.offset_from;
            self.token.offset_to = upstream.offset_to;
            self.bounds.clear();
            self.bounds.extend(self.source.char_indices().map(|(i, _)| i));
            self.bounds.push(self.source.len());
            self.size = self.min;
            self.start = 0;
            if self.position > 0 {
                self.position += 1;
            }
            return true;
        }
        false
    }
}

impl<T: TokenStream> TokenStream for NgramTokenStream<T> {
    fn advance(&mut self) -> bool {
        loop {
            let chars = self.chars();
            if self.size > 0 && self.size <= self.max && self.size <= chars {
                if self.start + self.size <= chars {
                    let from = self.bounds[self.start];
                    let to = self.bounds[self.start + self.size];
                    self.token.text.clear();
                    self.token.text.push_str(&self.source[from..to]);
                    self.token.position = self.position;
                    self.token.position_length = 1;
                    self.position += 1;
                    self.start += 1;
                    return true;
                }
                self.size += 1;
                self.start = 0;
                continue;
            }
            if !self.load_next_source() {
                return false;
            }
        }
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }
}

/// Word tokenizer, then NFKD, lowercase, and bigram expansion.
pub fn build_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(UnicodeWordTokenizer::default())
        .filter(NfkdNormalizer)
        .filter(LowerCaser)
        .filter(NgramFilter::bigrams())
        .build()
}

/// Run `text` through `analyzer` and collect the token texts.
pub fn analyze(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while stream.advance() {
        tokens.push(stream.token().text.clone());
    }
    tokens
}

pub type AnalyzerBuilder = Box<dyn Fn() -> TextAnalyzer + Send + Sync>;

/// Named analyzers available to schema mappings.
///
/// Built once at startup and handed to whatever builds or opens an index;
/// a name can be taken only once, and names tantivy already ships
/// (`default`, `raw`, ...) are taken from the start.
#[derive(Default)]
pub struct AnalyzerRegistry {
    builders: BTreeMap<String, AnalyzerBuilder>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the [`CUSTOM_ANALYZER`] pipeline.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.builders.insert(CUSTOM_ANALYZER.to_string(), Box::new(build_analyzer));
        registry
    }

    pub fn register<F>(&mut self, name: &str, builder: F) -> Result<()>
    where
        F: Fn() -> TextAnalyzer + Send + Sync + 'static,
    {
        if self.contains(name) || TokenizerManager::default().get(name).is_some() {
            return Err(TextError::AnalyzerAlreadyRegistered(name.to_string()));
        }
        self.builders.insert(name.to_string(), Box::new(builder));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    pub fn build(&self, name: &str) -> Result<TextAnalyzer> {
        self.builders
            .get(name)
            .map(|builder| builder())
            .ok_or_else(|| TextError::UnknownAnalyzer(name.to_string()))
    }

    /// Make every registered analyzer available to an index.
    pub fn install(&self, tokenizers: &TokenizerManager) {
        for (name, builder) in &self.builders {
            tokenizers.register(name, builder());
        }
    }
}

impl fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerRegistry").field("names", &self.names().collect::<Vec<_>>()).finish()
    }
}
