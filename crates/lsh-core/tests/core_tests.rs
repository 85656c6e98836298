use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use lsh_core::config::{expand_home_with, Config, Settings};
use lsh_core::crawl::{crawl, read_document, CrawlError, CrawlPolicy, DocumentSink, SinkError};
use lsh_core::error::Error;
use lsh_core::filter::PathFilter;
use lsh_core::identity::{identify, identify_path};
use lsh_core::types::{DocKind, Document};

fn sample_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.txt"), "alpha bravo").unwrap();
    fs::write(dir.join("b.md"), "# charlie").unwrap();
    fs::write(dir.join("c.png"), [0x89u8, b'P', b'N', b'G']).unwrap();
    fs::create_dir(dir.join("sub")).unwrap();
    fs::write(dir.join("sub").join("d.txt"), "delta").unwrap();
    tmp
}

fn txt_md() -> PathFilter {
    PathFilter::parse("txt,md")
}

#[test]
fn identity_is_deterministic_and_path_sensitive() {
    assert_eq!(identify("/data/a.txt"), identify("/data/a.txt"));
    assert_ne!(identify("/data/a.txt"), identify("/data/b.txt"));
    assert_ne!(identify("/data/a.txt"), identify("data/a.txt"));
}

#[test]
fn expand_home_replaces_leading_tilde_only() {
    let home = || Some(PathBuf::from("/home/u"));
    assert_eq!(expand_home_with("~/.lsh/x", home).unwrap(), PathBuf::from("/home/u/.lsh/x"));
    assert_eq!(expand_home_with("/abs/path", home).unwrap(), PathBuf::from("/abs/path"));
    assert_eq!(expand_home_with("rel/~/x", home).unwrap(), PathBuf::from("rel/~/x"));
}

#[test]
fn expand_home_leaves_other_users_alone() {
    let home = || Some(PathBuf::from("/home/u"));
    assert_eq!(expand_home_with("~", home).unwrap(), PathBuf::from("/home/u"));
    assert_eq!(expand_home_with("~other/x", home).unwrap(), PathBuf::from("~other/x"));
}

#[test]
fn expand_home_without_home_directory_fails() {
    let err = expand_home_with("~/.lsh/x", || None).unwrap_err();
    assert!(matches!(err, Error::PathExpansion { .. }));
    // no lookup needed, so no failure
    assert!(expand_home_with("/abs", || None).is_ok());
}

#[test]
fn crawl_indexes_only_eligible_regular_files() {
    let tmp = sample_tree();
    let mut sink: BTreeMap<String, Document> = BTreeMap::new();
    let report = crawl(tmp.path(), &txt_md(), &mut sink, CrawlPolicy::FailFast);

    assert!(report.is_complete());
    assert_eq!(report.indexed(), 3);
    assert_eq!(report.skipped, 1, "c.png is passed over");

    let names: BTreeSet<&str> = sink.values().map(|d| d.name.as_str()).collect();
    assert_eq!(names, BTreeSet::from(["a.txt", "b.md", "d.txt"]));

    let d = sink.values().find(|d| d.name == "d.txt").unwrap();
    assert_eq!(Path::new(&d.path), tmp.path().join("sub").join("d.txt"));
    assert_eq!(d.content, "delta");
    assert_eq!(d.kind, DocKind::Doc);
    assert_eq!(d.id, identify_path(&tmp.path().join("sub").join("d.txt")));
}

#[test]
fn recrawl_yields_the_same_ids() {
    let tmp = sample_tree();
    let mut sink: BTreeMap<String, Document> = BTreeMap::new();
    let first = crawl(tmp.path(), &txt_md(), &mut sink, CrawlPolicy::FailFast);
    fs::write(tmp.path().join("a.txt"), "changed content").unwrap();
    let second = crawl(tmp.path(), &txt_md(), &mut sink, CrawlPolicy::FailFast);

    let a: BTreeSet<_> = first.ids.into_iter().collect();
    let b: BTreeSet<_> = second.ids.into_iter().collect();
    assert_eq!(a, b);
    assert_eq!(sink.len(), 3, "second crawl replaced, not duplicated");
}

#[test]
fn empty_filter_submits_nothing() {
    let tmp = sample_tree();
    let mut sink: BTreeMap<String, Document> = BTreeMap::new();
    let report = crawl(tmp.path(), &PathFilter::default(), &mut sink, CrawlPolicy::FailFast);
    assert_eq!(report.indexed(), 0);
    assert!(sink.is_empty());
}

#[test]
fn non_utf8_content_is_decoded_lossily() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bin.txt"), [b'o', b'k', 0xff, b'!']).unwrap();
    let mut sink: BTreeMap<String, Document> = BTreeMap::new();
    crawl(tmp.path(), &txt_md(), &mut sink, CrawlPolicy::FailFast).into_result().unwrap();
    let doc = sink.values().next().unwrap();
    assert_eq!(doc.content, "ok\u{fffd}!");
}

#[test]
fn missing_root_is_a_walk_error() {
    let tmp = TempDir::new().unwrap();
    let mut sink: BTreeMap<String, Document> = BTreeMap::new();
    let report = crawl(&tmp.path().join("nope"), &txt_md(), &mut sink, CrawlPolicy::FailFast);
    assert!(matches!(report.first_failure(), Some(CrawlError::Walk { .. })));
    assert!(report.into_result().is_err());
}

#[test]
fn unreadable_file_is_a_read_error_naming_the_file() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("gone.txt");
    match read_document(&missing) {
        Err(CrawlError::Read { path, source }) => {
            assert_eq!(path, missing);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("expected a read error, got {:?}", other),
    }

    // a directory opens but cannot be read as a file
    let dir = tmp.path().join("notes.txt");
    fs::create_dir(&dir).unwrap();
    let err = read_document(&dir).unwrap_err();
    assert!(matches!(&err, CrawlError::Read { .. }));
    assert_eq!(err.path(), dir);
    assert!(err.to_string().starts_with("Failed to read"));
}

#[cfg(unix)]
#[test]
fn symlinks_are_not_followed() {
    let tmp = sample_tree();
    std::os::unix::fs::symlink(tmp.path().join("a.txt"), tmp.path().join("link.txt")).unwrap();
    let mut sink: BTreeMap<String, Document> = BTreeMap::new();
    let report = crawl(tmp.path(), &txt_md(), &mut sink, CrawlPolicy::FailFast);

    assert!(report.is_complete());
    assert_eq!(report.indexed(), 3);
    assert!(sink.values().all(|d| d.name != "link.txt"));
}

/// Accepts documents until `limit` have been stored, then refuses.
struct FlakySink {
    limit: usize,
    stored: Vec<String>,
}

impl DocumentSink for FlakySink {
    fn put(&mut self, id: &str, _doc: Document) -> Result<(), SinkError> {
        if self.stored.len() >= self.limit {
            return Err("sink is full".into());
        }
        self.stored.push(id.to_string());
        Ok(())
    }
}

#[test]
fn fail_fast_stops_at_first_submit_error_and_keeps_earlier_documents() {
    let tmp = sample_tree();
    let mut sink = FlakySink { limit: 1, stored: vec![] };
    let report = crawl(tmp.path(), &txt_md(), &mut sink, CrawlPolicy::FailFast);

    assert_eq!(report.indexed(), 1);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.first_failure(), Some(CrawlError::Submit { .. })));
    assert_eq!(sink.stored, report.ids, "no rollback of what was submitted");
}

#[test]
fn best_effort_records_every_failure() {
    let tmp = sample_tree();
    let mut sink = FlakySink { limit: 1, stored: vec![] };
    let report = crawl(tmp.path(), &txt_md(), &mut sink, CrawlPolicy::BestEffort);

    assert_eq!(report.indexed(), 1);
    assert_eq!(report.failures.len(), 2);
    let err = report.into_result().unwrap_err();
    assert!(err.to_string().starts_with("Failed to index"));
}

#[test]
fn config_layers_file_and_env_over_defaults() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("lsh.toml", "types = \"rs\"\nlimit = 3\n")?;
        jail.set_env("LSH_INDEX_PATH", "/var/lsh");

        let settings = Config::with_file(Path::new("lsh.toml")).settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.types, "rs");
        assert_eq!(settings.limit, 3);
        assert_eq!(settings.index_path, "/var/lsh");
        assert_eq!(settings.fields, Settings::default().fields);
        Ok(())
    });
}

#[test]
fn config_without_file_uses_defaults() {
    figment::Jail::expect_with(|_jail| {
        let config = Config::with_file(Path::new("absent.toml"));
        let settings = config.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings, Settings::default());
        let limit: usize = config.get("limit").map_err(|e| e.to_string())?;
        assert_eq!(limit, 10);
        Ok(())
    });
}
