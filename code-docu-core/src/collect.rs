//! File collector: walks a run root and reads every source file outside the excluded directory.

use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::WorkflowConfig;
use crate::contract::{CollectionReadError, SourceItem};

/// Recursively collect source files under `root`.
///
/// Entries below a directory named `config.excluded_dir` (matched on any segment
/// of the path relative to `root`) are skipped, as is anything that is not a regular
/// file with extension `config.extension`. Unreadable or non-UTF-8 files are logged
/// and dropped. Output order follows traversal and carries no meaning.
pub fn collect_sources(root: &Path, config: &WorkflowConfig) -> Vec<SourceItem> {
    info!(root = %root.display(), extension = %config.extension, "Collecting source files");
    let mut items = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_excluded(root, entry.path(), &config.excluded_dir));

    for entry_res in walker {
        let entry = match entry_res {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_extension(entry.path(), &config.extension) {
            continue;
        }
        match read_item(entry.path()) {
            Ok(item) => {
                debug!(path = %entry.path().display(), size = item.content.len(), "Collected source file");
                items.push(item);
            }
            Err(e) => warn!(error = %e, "Skipping source file"),
        }
    }

    info!(count = items.len(), "Completed collecting source files");
    items
}

fn is_excluded(root: &Path, path: &Path, excluded_dir: &str) -> bool {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .any(|comp| comp.as_os_str().to_str() == Some(excluded_dir))
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(extension)
}

fn read_item(path: &Path) -> Result<SourceItem, CollectionReadError> {
    let content = std::fs::read_to_string(path).map_err(|source| CollectionReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(SourceItem {
        directory,
        filename,
        content,
    })
}
