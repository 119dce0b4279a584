use std::{
    fs::{self, File},
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::error::LogResult;

/// Read size used when streaming a log file into the archive.
pub const ZIP_CHUNK_SIZE: usize = 1024;

/// Result of a zip request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZipOutcome {
    /// Archive written at `path` with one entry per log file.
    Archived { path: PathBuf, entries: usize },
    /// The log directory held no files; no archive was written.
    NothingToZip,
}

/// Regular files directly inside `dir`, sorted by name. A missing directory
/// has no files.
pub fn collect_log_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Writes every file of `source_dir` into a zip archive at `archive_path`,
/// one deflated entry per file named after it.
///
/// An existing archive is replaced. On failure the partial archive is removed.
pub fn zip_directory(
    source_dir: &Path,
    archive_path: &Path,
) -> LogResult<ZipOutcome> {
    let files = collect_log_files(source_dir)?;
    if files.is_empty() {
        return Ok(ZipOutcome::NothingToZip);
    }

    match write_archive(&files, archive_path) {
        Ok(()) => {
            tracing::info!(
                archive = %archive_path.display(),
                entries = files.len(),
                "Log files archived"
            );
            Ok(ZipOutcome::Archived {
                path: archive_path.to_path_buf(),
                entries: files.len(),
            })
        }
        Err(e) => {
            let _ = fs::remove_file(archive_path);
            Err(e)
        }
    }
}

fn write_archive(
    files: &[PathBuf],
    archive_path: &Path,
) -> LogResult<()> {
    let out = File::create(archive_path)?;
    let mut zip = ZipWriter::new(BufWriter::new(out));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut chunk = [0u8; ZIP_CHUNK_SIZE];
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        zip.start_file(name, options)?;

        let mut input = File::open(path)?;
        loop {
            let n = input.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            zip.write_all(&chunk[..n])?;
        }
    }

    let mut out = zip.finish()?;
    out.flush()?;
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
