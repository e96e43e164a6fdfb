//! Analysis of an ingested run: checks bookkeeping, runs the documentation workflow,
//! and flips the run's record once the workflow has completed.

use std::sync::Arc;

use anyhow::Result;
use code_docu_core::contract::TextGenerator;
use code_docu_core::workflow::{RunReport, Workflow};
use tracing::{error, info};

use crate::load_config::CliConfig;
use crate::records::RecordStore;

/// Document the extracted tree of run `run_id`.
///
/// The record must exist and its extracted files must be present. The record is
/// marked analyzed only after the workflow succeeded; a failed run leaves it untouched.
pub async fn analyze(
    config: &CliConfig,
    records: &RecordStore,
    generator: Arc<dyn TextGenerator>,
    run_id: &str,
) -> Result<RunReport> {
    let record = records
        .get(run_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Run {run_id} not found"))?;
    if record.analyzed {
        info!(run_id, "Run was analyzed before, documenting again");
    }

    let unzip_path = config.storage.run_dir(run_id);
    if !unzip_path.exists() {
        error!(run_id, path = %unzip_path.display(), "Extracted files missing for run");
        anyhow::bail!(
            "Files for run {run_id} not found at {}",
            unzip_path.display()
        );
    }

    let workflow = Workflow::new(config.workflow.clone(), generator);
    let report = match workflow.run(&unzip_path).await {
        Ok(report) => report,
        Err(e) => {
            error!(run_id, error = %e, "Documentation run failed");
            return Err(anyhow::Error::new(e).context(format!("Analysis of run {run_id} failed")));
        }
    };

    records.mark_analyzed(run_id).await?;
    info!(
        run_id,
        items = report.items_collected,
        archive = %report.archive_path.display(),
        "Run analyzed"
    );
    Ok(report)
}
