use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Fixed parameters of a documentation run.
///
/// Every field has a default, so a config file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Extension (without dot) of the files to document.
    pub extension: String,
    /// Directory name whose contents are never collected.
    pub excluded_dir: String,
    /// Output subdirectory under the run root.
    pub docs_dir: String,
    /// File name of the overview document inside `docs_dir`. Must not be a name
    /// that a per-file document can derive; see [`WorkflowConfig::validate`].
    pub overview_filename: String,
    /// Extension (without dot) of the per-file documents.
    pub doc_extension: String,
    /// Archive file name, written next to `docs_dir`.
    pub archive_name: String,
    /// What kind of module the sources form (e.g. "Drupal 10"), mentioned in the overview instruction.
    pub module_kind: Option<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            extension: "php".to_string(),
            excluded_dir: "tests".to_string(),
            docs_dir: "docu".to_string(),
            overview_filename: "README.md".to_string(),
            doc_extension: "md".to_string(),
            archive_name: "code_documentation.zip".to_string(),
            module_kind: None,
        }
    }
}

/// The configured overview name is one a per-file document could also get.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "overview file name {overview:?} can be derived from a source file name; \
use a name containing an uppercase letter or a different extension than .{doc_extension}"
)]
pub struct OverviewNameClash {
    pub overview: String,
    pub doc_extension: String,
}

impl WorkflowConfig {
    /// Reject an `overview_filename` that [`crate::persist::doc_filename`] can produce.
    ///
    /// Derived names are a lower-cased stem plus `.{doc_extension}`, so any overview
    /// name with that extension and no uppercase letter in its stem is reachable.
    pub fn validate(&self) -> Result<(), OverviewNameClash> {
        let suffix = format!(".{}", self.doc_extension);
        let reachable = match self.overview_filename.strip_suffix(&suffix) {
            Some(stem) => !stem.is_empty() && !stem.chars().any(char::is_uppercase),
            None => false,
        };
        if reachable {
            return Err(OverviewNameClash {
                overview: self.overview_filename.clone(),
                doc_extension: self.doc_extension.clone(),
            });
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            extension = %self.extension,
            excluded_dir = %self.excluded_dir,
            docs_dir = %self.docs_dir,
            archive_name = %self.archive_name,
            "Loaded WorkflowConfig"
        );
        debug!(?self, "WorkflowConfig loaded (full debug)");
    }
}
