//! High-level pipeline: orchestrates collect → summarize (fan-out) → aggregate → persist → package.
//!
//! A run is a small directed graph walked node by node:
//!
//! ```text
//! Collect ──► Summarize ×N ──► Aggregate ──► Persist ──► Package ──► End
//! ```
//!
//! # Major Types
//! - [`Workflow`]: configuration plus the injected [`TextGenerator`]; one value can serve many runs
//! - [`RunState`]: everything a single run accumulates; never shared between runs
//! - [`AnalysisResult`]: append-only accumulator written by the fan-out branches
//! - [`RunReport`]: what a successful run produced and where
//!
//! # Responsibilities
//! - Spawns one summarize task per collected file, the count known only after Collect
//! - Joins all of them before Aggregate runs; a run never aggregates a partial set
//! - Fail-fast: the first failing branch aborts the others and the run
//! - Blocking filesystem steps run on the blocking pool
//!
//! # Error Handling
//! Every failure surfaces as a [`RunError`] that keeps its kind (invalid config,
//! missing input, generation, persistence, task). Files already written are left in place.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::aggregate::aggregate;
use crate::collect::collect_sources;
use crate::config::WorkflowConfig;
use crate::contract::{ItemDoc, OverviewDocument, RunError, SourceItem, TextGenerator};
use crate::package::package_dir;
use crate::persist::{persist, PersistReport};
use crate::summarize::summarize_item;

/// Nodes of the documentation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Collect,
    Summarize,
    Aggregate,
    Persist,
    Package,
    End,
}

/// Append-only accumulator for per-item results. Cloning shares the underlying list.
///
/// Order of the contents is completion order, not spawn order; consumers match
/// results to items through [`ItemDoc::index`].
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    docs: Arc<Mutex<Vec<ItemDoc>>>,
}

impl AnalysisResult {
    pub fn append(&self, doc: ItemDoc) {
        self.lock().push(doc);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the contents in completion order.
    pub fn snapshot(&self) -> Vec<ItemDoc> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ItemDoc>> {
        self.docs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Run-scoped state. Only the files derived from it are persisted.
#[derive(Debug)]
pub struct RunState {
    pub unzip_path: PathBuf,
    pub sources: Vec<SourceItem>,
    pub analysis: AnalysisResult,
    pub overview: Option<OverviewDocument>,
    pub persisted: Option<PersistReport>,
    pub archive_path: Option<PathBuf>,
}

impl RunState {
    pub fn new(unzip_path: &Path) -> Self {
        Self {
            unzip_path: unzip_path.to_path_buf(),
            sources: Vec::new(),
            analysis: AnalysisResult::default(),
            overview: None,
            persisted: None,
            archive_path: None,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub unzip_path: PathBuf,
    pub items_collected: usize,
    pub docs_dir: PathBuf,
    pub overview_path: PathBuf,
    pub item_paths: Vec<PathBuf>,
    pub archive_path: PathBuf,
}

pub struct Workflow {
    config: WorkflowConfig,
    generator: Arc<dyn TextGenerator>,
}

impl Workflow {
    pub fn new(config: WorkflowConfig, generator: Arc<dyn TextGenerator>) -> Self {
        Self { config, generator }
    }

    /// Run the whole graph against the extracted source tree at `unzip_path`.
    pub async fn run(&self, unzip_path: &Path) -> Result<RunReport, RunError> {
        info!(unzip_path = %unzip_path.display(), "[WORKFLOW] Starting documentation run");
        if let Err(clash) = self.config.validate() {
            error!(error = %clash, "[WORKFLOW][ERROR] Invalid workflow config");
            return Err(clash.into());
        }
        if !unzip_path.is_dir() {
            error!(unzip_path = %unzip_path.display(), "[WORKFLOW][ERROR] Source directory not found");
            return Err(RunError::InputNotFound(unzip_path.to_path_buf()));
        }

        let mut state = RunState::new(unzip_path);
        let mut node = Node::Collect;
        while node != Node::End {
            debug!(?node, "[WORKFLOW] Entering node");
            node = self.step(node, &mut state).await?;
        }

        let report = self.report(state)?;
        info!(
            items = report.items_collected,
            archive = %report.archive_path.display(),
            "[WORKFLOW] Documentation run complete"
        );
        Ok(report)
    }

    async fn step(&self, node: Node, state: &mut RunState) -> Result<Node, RunError> {
        let next = match node {
            Node::Collect => {
                self.collect(state).await?;
                Node::Summarize
            }
            Node::Summarize => {
                self.summarize_all(state).await?;
                Node::Aggregate
            }
            Node::Aggregate => {
                self.aggregate(state).await?;
                Node::Persist
            }
            Node::Persist => {
                self.persist(state).await?;
                Node::Package
            }
            Node::Package => {
                self.package(state).await?;
                Node::End
            }
            Node::End => Node::End,
        };
        Ok(next)
    }

    fn docs_dir(&self, state: &RunState) -> PathBuf {
        state.unzip_path.join(&self.config.docs_dir)
    }

    async fn collect(&self, state: &mut RunState) -> Result<(), RunError> {
        let root = state.unzip_path.clone();
        let config = self.config.clone();
        state.sources = tokio::task::spawn_blocking(move || collect_sources(&root, &config)).await?;
        info!(count = state.sources.len(), "[WORKFLOW] Collect finished");
        Ok(())
    }

    /// Fan-out: one task per source item; returns once every task has reported.
    async fn summarize_all(&self, state: &mut RunState) -> Result<(), RunError> {
        let mut branches = JoinSet::new();
        for (index, item) in state.sources.iter().cloned().enumerate() {
            let generator = Arc::clone(&self.generator);
            let analysis = state.analysis.clone();
            branches.spawn(async move {
                let doc = summarize_item(&*generator, index, &item)
                    .await
                    .map_err(|source| RunError::Generation {
                        file: Some(item.filename.clone()),
                        source,
                    })?;
                analysis.append(doc);
                Ok::<(), RunError>(())
            });
        }
        info!(branches = branches.len(), "[WORKFLOW] Spawned summarize branches");

        while let Some(joined) = branches.join_next().await {
            if let Err(e) = joined.map_err(RunError::from).and_then(|outcome| outcome) {
                error!(error = %e, "[WORKFLOW][ERROR] Summarize branch failed, aborting run");
                branches.abort_all();
                return Err(e);
            }
        }

        let completed = state.analysis.len();
        if completed != state.sources.len() {
            return Err(RunError::Task(format!(
                "{completed} of {} summarize branches reported",
                state.sources.len()
            )));
        }
        info!(completed, "[WORKFLOW] All summarize branches joined");
        Ok(())
    }

    async fn aggregate(&self, state: &mut RunState) -> Result<(), RunError> {
        let docs = state.analysis.snapshot();
        let overview = aggregate(
            &*self.generator,
            &docs,
            self.config.module_kind.as_deref(),
        )
        .await
        .map_err(|source| RunError::Generation { file: None, source })?;
        state.overview = Some(overview);
        Ok(())
    }

    async fn persist(&self, state: &mut RunState) -> Result<(), RunError> {
        let docs_dir = self.docs_dir(state);
        let config = self.config.clone();
        let overview = state
            .overview
            .clone()
            .ok_or_else(|| RunError::Task("persist reached without an overview".into()))?;
        let sources = state.sources.clone();
        let docs = state.analysis.snapshot();
        let report = tokio::task::spawn_blocking(move || {
            persist(&docs_dir, &config, &overview, &sources, &docs)
        })
        .await??;
        state.persisted = Some(report);
        Ok(())
    }

    async fn package(&self, state: &mut RunState) -> Result<(), RunError> {
        let docs_dir = self.docs_dir(state);
        let archive_path = state.unzip_path.join(&self.config.archive_name);
        let archive = tokio::task::spawn_blocking(move || package_dir(&docs_dir, &archive_path)).await??;
        state.archive_path = Some(archive);
        Ok(())
    }

    fn report(&self, state: RunState) -> Result<RunReport, RunError> {
        let docs_dir = self.docs_dir(&state);
        let (Some(persisted), Some(archive_path)) = (state.persisted, state.archive_path) else {
            return Err(RunError::Task("run ended before package completed".into()));
        };
        Ok(RunReport {
            unzip_path: state.unzip_path,
            items_collected: state.sources.len(),
            docs_dir,
            overview_path: persisted.overview_path,
            item_paths: persisted.item_paths,
            archive_path,
        })
    }
}

/// Entrypoint: document the extracted tree at `unzip_path` with a one-off [`Workflow`].
pub async fn run_workflow(
    config: &WorkflowConfig,
    generator: Arc<dyn TextGenerator>,
    unzip_path: &Path,
) -> Result<RunReport, RunError> {
    Workflow::new(config.clone(), generator).run(unzip_path).await
}
