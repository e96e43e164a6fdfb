//! Run bookkeeping: one SQLite row per ingested archive with an `analyzed` flag.
//!
//! Every call opens its own connection on the blocking pool so callers on the async
//! runtime are never blocked by disk I/O.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRecord {
    pub id: String,
    /// Unix timestamp (seconds) of ingestion.
    pub created_at: i64,
    pub analyzed: bool,
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    /// Open (creating if needed) the database at `path` and ensure the schema exists.
    pub async fn open(path: &Path) -> Result<Self> {
        let store = RecordStore {
            path: path.to_path_buf(),
        };
        store
            .blocking(|conn| {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS analyses (
                        id TEXT PRIMARY KEY,
                        created_at INTEGER NOT NULL,
                        analyzed BOOLEAN NOT NULL
                    )",
                    [],
                )
                .map(|_| ())
            })
            .await
            .with_context(|| format!("Failed to initialise database {}", path.display()))?;
        info!(database = %path.display(), "Record store ready");
        Ok(store)
    }

    /// Register a new, not yet analyzed run.
    pub async fn insert(&self, id: &str) -> Result<AnalysisRecord> {
        let record = AnalysisRecord {
            id: id.to_string(),
            created_at: chrono::Utc::now().timestamp(),
            analyzed: false,
        };
        let row = record.clone();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO analyses (id, created_at, analyzed) VALUES (?1, ?2, ?3)",
                params![row.id, row.created_at, row.analyzed],
            )
            .map(|_| ())
        })
        .await
        .with_context(|| format!("Failed to insert record for run {id}"))?;
        debug!(run_id = id, "Inserted run record");
        Ok(record)
    }

    pub async fn get(&self, id: &str) -> Result<Option<AnalysisRecord>> {
        let id = id.to_string();
        self.blocking(move |conn| {
            conn.query_row(
                "SELECT id, created_at, analyzed FROM analyses WHERE id = ?1",
                params![id],
                |row| {
                    Ok(AnalysisRecord {
                        id: row.get(0)?,
                        created_at: row.get(1)?,
                        analyzed: row.get(2)?,
                    })
                },
            )
            .optional()
        })
        .await
        .context("Failed to query run record")
    }

    /// Flip a run to analyzed. Errors when no such run exists.
    pub async fn mark_analyzed(&self, id: &str) -> Result<()> {
        let owned = id.to_string();
        let updated = self
            .blocking(move |conn| {
                conn.execute(
                    "UPDATE analyses SET analyzed = ?1 WHERE id = ?2",
                    params![true, owned],
                )
            })
            .await
            .with_context(|| format!("Failed to update record for run {id}"))?;
        if updated == 0 {
            anyhow::bail!("Run {id} not found");
        }
        info!(run_id = id, "Marked run as analyzed");
        Ok(())
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        let value = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path)?;
            f(&conn)
        })
        .await??;
        Ok(value)
    }
}
