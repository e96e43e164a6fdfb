//! Archive ingestion: download a ZIP of source code, store it, extract it and register the run.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Url;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use zip::ZipArchive;

use crate::load_config::StorageSection;
use crate::records::RecordStore;

/// Where an ingested archive ended up.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub run_id: String,
    pub zip_path: PathBuf,
    pub unzip_dir: PathBuf,
    /// Hex SHA-256 of the downloaded archive.
    pub sha256: String,
    pub entries: usize,
}

/// Fetch `url` and return the body, which must be served with a ZIP content type.
pub async fn download_archive(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let parsed = Url::parse(url).with_context(|| format!("Invalid archive URL: {url}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("Archive URL must use http or https, got {}", parsed.scheme());
    }

    info!(url = %parsed, "Downloading archive");
    let response = client
        .get(parsed.clone())
        .send()
        .await
        .with_context(|| format!("Failed to download {parsed}"))?;
    let response = response.error_for_status().map_err(|e| {
        error!(error = ?e, url = %parsed, "Archive download returned error status");
        anyhow::anyhow!("Failed to download archive: {e}")
    })?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !content_type.contains("zip") {
        error!(content_type = %content_type, url = %parsed, "Downloaded file is not a ZIP");
        anyhow::bail!("The downloaded file is not a ZIP archive (content-type: {content_type:?})");
    }

    let bytes = response
        .bytes()
        .await
        .context("Failed to read archive body")?;
    info!(size = bytes.len(), "Archive downloaded");
    Ok(bytes.to_vec())
}

/// Extract `zip_path` into `dest`. The archive file is deleted if it is not a valid ZIP.
/// Returns the number of entries extracted.
pub fn extract_archive(zip_path: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(zip_path)
        .with_context(|| format!("Failed to open archive {}", zip_path.display()))?;
    let mut archive = match ZipArchive::new(file) {
        Ok(archive) => archive,
        Err(e) => {
            error!(error = ?e, path = %zip_path.display(), "Corrupt or invalid ZIP archive");
            if let Err(rm) = fs::remove_file(zip_path) {
                warn!(error = ?rm, path = %zip_path.display(), "Failed to remove invalid archive");
            }
            anyhow::bail!("Corrupt or invalid ZIP archive: {e}");
        }
    };
    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?;
    archive
        .extract(dest)
        .with_context(|| format!("Failed to extract archive into {}", dest.display()))?;
    info!(entries = archive.len(), dest = %dest.display(), "Archive extracted");
    Ok(archive.len())
}

/// Download `url`, store it as `<files_dir>/<run-id>.zip`, extract it to
/// `<files_dir>/unzip/<run-id>` and register the run as not yet analyzed.
pub async fn ingest(
    client: &reqwest::Client,
    storage: &StorageSection,
    records: &RecordStore,
    url: &str,
) -> Result<IngestReport> {
    let bytes = download_archive(client, url).await?;
    let run_id = uuid::Uuid::new_v4().to_string();
    let sha256 = format!("{:x}", Sha256::digest(&bytes));

    tokio::fs::create_dir_all(&storage.files_dir)
        .await
        .with_context(|| format!("Failed to create {}", storage.files_dir.display()))?;
    let zip_path = storage.files_dir.join(format!("{run_id}.zip"));
    tokio::fs::write(&zip_path, &bytes)
        .await
        .with_context(|| format!("Failed to save archive to {}", zip_path.display()))?;
    info!(run_id = %run_id, path = %zip_path.display(), sha256 = %sha256, "Archive saved");

    let unzip_dir = storage.run_dir(&run_id);
    let entries = {
        let zip_path = zip_path.clone();
        let unzip_dir = unzip_dir.clone();
        tokio::task::spawn_blocking(move || extract_archive(&zip_path, &unzip_dir)).await??
    };

    records.insert(&run_id).await?;
    Ok(IngestReport {
        run_id,
        zip_path,
        unzip_dir,
        sha256,
        entries,
    })
}
