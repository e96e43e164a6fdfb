//! Persistence writer: writes the overview and one document per source file under the docs directory.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::WorkflowConfig;
use crate::contract::{ItemDoc, OverviewDocument, PersistenceError, SourceItem};

const DELIMITER: char = '_';

/// Files written by [`persist`].
#[derive(Debug, Clone)]
pub struct PersistReport {
    pub overview_path: PathBuf,
    /// Per-item documents, in source-item order.
    pub item_paths: Vec<PathBuf>,
}

impl PersistReport {
    /// Every file written, overview first.
    pub fn all_paths(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.overview_path).chain(self.item_paths.iter())
    }
}

/// Derive the documentation file name for a source file name.
///
/// `FooBarController.php` becomes `foo_bar_controller.md`: the extension is
/// stripped, `_` goes in front of every capital after the first character
/// (unless a `_` or `-` is already there), the result is lower-cased and
/// `doc_extension` appended.
pub fn doc_filename(source_filename: &str, doc_extension: &str) -> String {
    let stem = Path::new(source_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source_filename);
    format!("{}.{doc_extension}", delimit_words(stem))
}

fn delimit_words(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len() + 4);
    let mut prev: Option<char> = None;
    for c in stem.chars() {
        if c.is_uppercase() {
            if let Some(p) = prev {
                if p != DELIMITER && p != '-' {
                    out.push(DELIMITER);
                }
            }
        }
        out.extend(c.to_lowercase());
        prev = Some(c);
    }
    out
}

/// Write `overview` and one document per entry of `docs` under `docs_dir`.
///
/// Each [`ItemDoc`] is matched to its [`SourceItem`] by `index`. Existing files with
/// the same name are overwritten; when two items derive the same name within one
/// run the later one wins and a warning is logged. An item deriving the overview's
/// name is an error, since the overview must survive the run.
pub fn persist(
    docs_dir: &Path,
    config: &WorkflowConfig,
    overview: &OverviewDocument,
    items: &[SourceItem],
    docs: &[ItemDoc],
) -> Result<PersistReport, PersistenceError> {
    info!(path = %docs_dir.display(), items = docs.len(), "[PERSIST] Writing documentation");
    fs::create_dir_all(docs_dir).map_err(|source| {
        error!(error = %source, path = %docs_dir.display(), "[PERSIST][ERROR] Failed to create docs directory");
        PersistenceError::CreateDir {
            path: docs_dir.to_path_buf(),
            source,
        }
    })?;

    let overview_path = docs_dir.join(&config.overview_filename);
    write_file(&overview_path, overview.as_str())?;

    let by_index: HashMap<usize, &ItemDoc> = docs.iter().map(|d| (d.index, d)).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut item_paths = Vec::with_capacity(docs.len());

    for (index, item) in items.iter().enumerate() {
        let Some(doc) = by_index.get(&index) else {
            warn!(index, file = %item.filename, "[PERSIST] No documentation for source item");
            continue;
        };
        let name = doc_filename(&item.filename, &config.doc_extension);
        if name == config.overview_filename {
            error!(file = %doc.filename, output = %name, "[PERSIST][ERROR] Derived file name is the overview name");
            return Err(PersistenceError::OverviewClash {
                path: overview_path.clone(),
                source_file: doc.filename.clone(),
            });
        }
        if !seen.insert(name.clone()) {
            warn!(file = %doc.filename, output = %name, "[PERSIST] Derived file name collides, overwriting");
        }
        let path = docs_dir.join(&name);
        write_file(&path, &doc.markdown)?;
        debug!(index, file = %doc.filename, output = %name, "[PERSIST] Wrote item documentation");
        item_paths.push(path);
    }

    info!(written = item_paths.len() + 1, "[PERSIST] Documentation written");
    Ok(PersistReport {
        overview_path,
        item_paths,
    })
}

fn write_file(path: &Path, content: &str) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| PersistenceError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|e| {
        error!(error = %e, path = %path.display(), "[PERSIST][ERROR] Failed to write file");
        PersistenceError::write(path, e)
    })?;
    debug!(path = %path.display(), size = content.len(), "[PERSIST] Wrote file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn derives_snake_case_markdown_names() {
        assert_eq!(doc_filename("Bar.php", "md"), "bar.md");
        assert_eq!(doc_filename("FooBarController.php", "md"), "foo_bar_controller.md");
        assert_eq!(doc_filename("fooBar.php", "md"), "foo_bar.md");
        assert_eq!(doc_filename("Foo_Bar.php", "md"), "foo_bar.md");
        assert_eq!(doc_filename("my-Module.inc.php", "md"), "my-module.inc.md");
        assert_eq!(doc_filename("plain", "md"), "plain.md");
    }

    #[test]
    fn transform_is_idempotent_on_its_own_output() {
        for name in ["Bar.php", "FooBarController.php", "HTTPClient.php", "a_B_c.php"] {
            let once = doc_filename(name, "md");
            let twice = doc_filename(&once, "md");
            assert_eq!(once, twice, "not idempotent for {name}");
        }
    }

    fn item(filename: &str) -> SourceItem {
        SourceItem {
            directory: PathBuf::from("/src"),
            filename: filename.to_string(),
            content: String::new(),
        }
    }

    fn doc(index: usize, markdown: &str) -> ItemDoc {
        ItemDoc {
            index,
            filename: String::new(),
            markdown: markdown.to_string(),
        }
    }

    #[test]
    fn writes_one_file_per_item_plus_overview() {
        let tmp = tempdir().unwrap();
        let docs_dir = tmp.path().join("docu");
        let items = vec![item("FooBar.php"), item("Baz.php")];
        // Completion order differs from collection order.
        let docs = vec![doc(1, "baz docs"), doc(0, "foobar docs")];

        let report = persist(
            &docs_dir,
            &WorkflowConfig::default(),
            &OverviewDocument("overview".into()),
            &items,
            &docs,
        )
        .expect("persist should succeed");

        let mut names: Vec<_> = fs::read_dir(&docs_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["README.md", "baz.md", "foo_bar.md"]);
        assert_eq!(report.all_paths().count(), 3);
        assert_eq!(fs::read_to_string(docs_dir.join("foo_bar.md")).unwrap(), "foobar docs");
        assert_eq!(fs::read_to_string(docs_dir.join("baz.md")).unwrap(), "baz docs");
        assert_eq!(fs::read_to_string(docs_dir.join("README.md")).unwrap(), "overview");
    }

    #[test]
    fn later_item_wins_on_name_collision() {
        let tmp = tempdir().unwrap();
        let docs_dir = tmp.path().join("docu");
        let items = vec![item("FooBar.php"), item("Foo_Bar.php")];
        let docs = vec![doc(0, "first"), doc(1, "second")];

        persist(
            &docs_dir,
            &WorkflowConfig::default(),
            &OverviewDocument("o".into()),
            &items,
            &docs,
        )
        .unwrap();

        assert_eq!(fs::read_to_string(docs_dir.join("foo_bar.md")).unwrap(), "second");
    }

    #[test]
    fn index_sources_keep_the_overview_intact() {
        let tmp = tempdir().unwrap();
        let docs_dir = tmp.path().join("docu");
        let items = vec![item("index.php"), item("Index.php"), item("Mailer.php")];
        let docs = vec![doc(0, "index docs"), doc(1, "Index docs"), doc(2, "mailer docs")];

        let report = persist(
            &docs_dir,
            &WorkflowConfig::default(),
            &OverviewDocument("OVERVIEW".into()),
            &items,
            &docs,
        )
        .expect("persist should succeed");

        assert_eq!(fs::read_to_string(&report.overview_path).unwrap(), "OVERVIEW");
        assert_eq!(fs::read_to_string(docs_dir.join("index.md")).unwrap(), "Index docs");
    }

    #[test]
    fn item_named_like_overview_is_rejected() {
        let tmp = tempdir().unwrap();
        let docs_dir = tmp.path().join("docu");
        let config = WorkflowConfig {
            overview_filename: "index.md".to_string(),
            ..WorkflowConfig::default()
        };
        let items = vec![item("Index.php")];
        let mut named = doc(0, "index docs");
        named.filename = "Index.php".to_string();

        let err = persist(
            &docs_dir,
            &config,
            &OverviewDocument("OVERVIEW".into()),
            &items,
            &[named],
        )
        .unwrap_err();

        match err {
            PersistenceError::OverviewClash { source_file, .. } => assert_eq!(source_file, "Index.php"),
            other => panic!("Expected an overview clash, got {other:?}"),
        }
        assert_eq!(fs::read_to_string(docs_dir.join("index.md")).unwrap(), "OVERVIEW");
    }
}
