//! Packager: re-archives the docs directory into a single ZIP.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::contract::PersistenceError;

/// Create a ZIP of everything below `source_dir` at `archive_path` and return the
/// archive's absolute path. Entry names are relative to `source_dir` and use `/`.
/// The source directory is left in place.
pub fn package_dir(source_dir: &Path, archive_path: &Path) -> Result<PathBuf, PersistenceError> {
    info!(
        source = %source_dir.display(),
        archive = %archive_path.display(),
        "[PACKAGE] Creating documentation archive"
    );
    let file = File::create(archive_path).map_err(|e| {
        error!(error = %e, path = %archive_path.display(), "[PACKAGE][ERROR] Failed to create archive file");
        PersistenceError::write(archive_path, e)
    })?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0usize;
    for entry_res in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry_res.map_err(|e| {
            let io_err = io::Error::new(io::ErrorKind::Other, e.to_string());
            PersistenceError::write(archive_path, io_err)
        })?;
        let rel = match entry.path().strip_prefix(source_dir) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => continue,
        };
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)
                .map_err(|e| PersistenceError::archive(archive_path, e))?;
        } else if entry.file_type().is_file() {
            let bytes = fs::read(entry.path()).map_err(|e| PersistenceError::write(entry.path(), e))?;
            zip.start_file(name.as_str(), options)
                .map_err(|e| PersistenceError::archive(archive_path, e))?;
            zip.write_all(&bytes)
                .map_err(|e| PersistenceError::write(archive_path, e))?;
            debug!(entry = %name, size = bytes.len(), "[PACKAGE] Added archive entry");
            entries += 1;
        }
    }

    zip.finish()
        .map_err(|e| PersistenceError::archive(archive_path, e))?;
    let absolute = archive_path
        .canonicalize()
        .map_err(|e| PersistenceError::write(archive_path, e))?;
    info!(archive = %absolute.display(), entries, "[PACKAGE] Archive written");
    Ok(absolute)
}
