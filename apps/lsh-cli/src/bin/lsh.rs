//! lsh: index local text files and search them.
//!
//! Usage:
//!   lsh -d ~/notes                  index *txt and *md files under ~/notes
//!   lsh -q 'meeting notes'          search the index
//!   lsh -t rs,toml -d . -q parser   crawl first, then search
//!
//! Defaults come from `~/.lsh/config.toml` (or `$LSH_CONFIG`) and `LSH_*`
//! environment variables; flags win over both.

use std::collections::BTreeMap;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use lsh_core::config::{expand_home, Config};
use lsh_core::crawl::{crawl, CrawlPolicy, DocumentSink, SinkError};
use lsh_core::filter::PathFilter;
use lsh_core::types::Document;
use lsh_text::{AnalyzerRegistry, IndexManager, QueryRunner};

#[derive(Parser, Debug)]
#[command(name = "lsh")]
#[command(about = "Local file search: crawl a directory into an index and query it")]
struct Cli {
    /// Comma-separated file-name suffixes to index [default: txt,md]
    #[arg(short = 't')]
    types: Option<String>,

    /// Directory to crawl; nothing is indexed when empty
    #[arg(short = 'd', default_value = "")]
    dir: String,

    /// Index location, a leading `~` is the home directory [default: ~/.lsh/lsh_index]
    #[arg(short = 'i')]
    index: Option<String>,

    /// Search query; nothing is searched when empty
    #[arg(short = 'q', default_value = "")]
    query: String,

    /// Maximum number of hits to print [default: 10]
    #[arg(long)]
    limit: Option<usize>,

    /// Number of top hits to skip [default: 0]
    #[arg(long)]
    offset: Option<usize>,

    /// Comma-separated stored fields to print with each hit [default: Path]
    #[arg(long, value_delimiter = ',')]
    fields: Option<Vec<String>>,

    /// Keep crawling past files that fail instead of stopping at the first one
    #[arg(long)]
    keep_going: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn run(cli: Cli) -> Result<()> {
    let settings = Config::load().and_then(|config| config.settings()).context("Error loading config")?;

    let index_path = cli.index.unwrap_or(settings.index_path);
    if index_path.is_empty() {
        bail!("-i needs any path");
    }
    let index_path = expand_home(&index_path)?;

    info!("] Open");
    let manager = IndexManager::new(AnalyzerRegistry::with_defaults()).with_writer_memory(settings.writer_memory_bytes);
    let mut handle = manager.open_or_create(&index_path)?;

    let filter = PathFilter::parse(&cli.types.unwrap_or(settings.types));
    if !cli.dir.is_empty() && !filter.is_empty() {
        let root = expand_home(&cli.dir)?;
        let policy = if cli.keep_going { CrawlPolicy::BestEffort } else { CrawlPolicy::FailFast };

        info!("] indexingFiles");
        let report = {
            let mut sink = ProgressSink::new(&mut handle);
            let report = crawl(&root, &filter, &mut sink, policy);
            sink.finish();
            report
        };
        // whatever was submitted before a failure stays indexed
        handle.commit()?;
        info!(indexed = report.indexed(), skipped = report.skipped, "indexing done");
        if !cli.keep_going {
            report.into_result()?;
        } else if !report.is_complete() {
            warn!(failures = report.failures.len(), "some files could not be indexed");
        }
    }

    if !cli.query.is_empty() {
        info!("] Query");
        let fields = cli.fields.unwrap_or(settings.fields);
        let offset = cli.offset.unwrap_or(settings.offset);
        let runner = QueryRunner::new(&handle)?;
        let results = runner.search(&cli.query, &fields, cli.limit.unwrap_or(settings.limit), offset)?;
        println!("{} matches", results.total);
        for (i, hit) in results.hits.iter().enumerate() {
            println!("{:>3}. score={:.4} id={} {}", offset + i + 1, hit.score, hit.id, format_fields(&hit.fields));
        }
    }

    handle.close()?;
    Ok(())
}

fn format_fields(fields: &BTreeMap<String, String>) -> String {
    fields.iter().map(|(name, value)| format!("{}={}", name, value)).collect::<Vec<_>>().join(" ")
}

/// Passes documents through while ticking a spinner on stderr.
struct ProgressSink<S> {
    inner: S,
    bar: ProgressBar,
}

impl<S: DocumentSink> ProgressSink<S> {
    fn new(inner: S) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {pos} files indexed {wide_msg}") {
            bar.set_style(style);
        }
        Self { inner, bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl<S: DocumentSink> DocumentSink for ProgressSink<S> {
    fn put(&mut self, id: &str, doc: Document) -> std::result::Result<(), SinkError> {
        self.bar.set_message(doc.path.clone());
        self.inner.put(id, doc)?;
        self.bar.inc(1);
        Ok(())
    }
}
