//! # contract: data model and collaborator interfaces for a documentation run
//!
//! This module defines the plain data passed between pipeline steps, the single
//! external capability the pipeline depends on ([`TextGenerator`]) and the error
//! kinds a run can surface.
//!
//! ## Interface & Extensibility
//! - Implement [`TextGenerator`] to plug in a provider (HTTP client, local model, fake).
//! - The capability is injected into each step explicitly; nothing in the core holds
//!   a global client.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` so consumers can generate deterministic mocks
//!   for unit/integration tests (exported under the `test-export-mocks` feature).
//!
//! ## Error kinds
//! - [`CollectionReadError`]: one unreadable file; logged and skipped by the collector.
//! - [`GenerationError`]: provider failure or non-conforming structured output; fatal.
//! - [`PersistenceError`]: filesystem or archive failure while writing output; fatal.
//! - [`RunError`]: what the orchestrator hands back to its caller, keeping the kind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::config::OverviewNameClash;

/// One source file read by the collector. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    /// Directory the file lives in.
    pub directory: PathBuf,
    /// File name including extension (e.g. `Bar.php`).
    pub filename: String,
    /// Full UTF-8 content.
    pub content: String,
}

impl SourceItem {
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }
}

/// Structured response of the text-generation capability: exactly one markdown field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedDoc {
    /// Markdown documentation
    pub markdown: String,
}

impl GeneratedDoc {
    /// Name under which the schema is announced to providers.
    pub const SCHEMA_NAME: &'static str = "CodeDoc";

    /// JSON schema a provider must conform to when producing a [`GeneratedDoc`].
    pub fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "description": "Documentation of the given code",
            "properties": {
                "markdown": {
                    "type": "string",
                    "description": "Markdown documentation"
                }
            },
            "required": ["markdown"],
            "additionalProperties": false
        })
    }
}

/// Per-item summarizer output, tagged with the index of the [`SourceItem`] it documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDoc {
    /// Position of the source item in collector output; the correlation key.
    pub index: usize,
    /// File name of the documented source item, used when logging the written document.
    pub filename: String,
    pub markdown: String,
}

/// Module-level documentation produced by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewDocument(pub String);

impl OverviewDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// External text-generation capability with a fixed request/response contract:
/// an instruction embedding one content string in, a [`GeneratedDoc`] out.
///
/// Implementations must be stateless from the caller's point of view; the
/// orchestrator calls `generate` from many concurrent tasks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one structured generation request.
    async fn generate(&self, instruction: &str) -> Result<GeneratedDoc, GenerationError>;
}

/// A single file the collector could not read. Never fatal.
#[derive(Debug, thiserror::Error)]
#[error("failed to read {path}: {source}")]
pub struct CollectionReadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Network, transport or provider-side failure.
    #[error("text generation request failed: {0}")]
    Provider(String),
    /// The provider answered, but not with a conforming `{markdown}` object.
    #[error("text generation returned malformed output: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{source_file} would overwrite the overview at {path}")]
    OverviewClash { path: PathBuf, source_file: String },
    #[error("failed to build archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl PersistenceError {
    pub(crate) fn write(path: &Path, source: std::io::Error) -> Self {
        PersistenceError::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn archive(path: &Path, source: zip::result::ZipError) -> Self {
        PersistenceError::Archive {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Failure of a whole run, as reported to the orchestrator's caller.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] OverviewNameClash),
    #[error("source directory {0} does not exist")]
    InputNotFound(PathBuf),
    #[error("generation failed for {}: {source}", .file.as_deref().unwrap_or("overview"))]
    Generation {
        /// Source file being summarized, `None` for the aggregate step.
        file: Option<String>,
        #[source]
        source: GenerationError,
    },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    /// A spawned step panicked or was cancelled.
    #[error("workflow task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for RunError {
    fn from(e: tokio::task::JoinError) -> Self {
        RunError::Task(e.to_string())
    }
}
