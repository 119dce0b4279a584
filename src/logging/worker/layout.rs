use std::path::{Path, PathBuf};

/// Directory under the cache dir holding one file per session.
pub const LOG_FOLDER: &str = "logs";
/// Prefix of every session file name.
pub const FILE_PREFIX: &str = "l";
/// Archive produced by a zip request, a sibling of [`LOG_FOLDER`].
pub const ARCHIVE_NAME: &str = "logs.zip";
/// First line written in a logging session.
pub const SESSION_HEADER: &str = "For troubleshooting purposes only.";

/// On-disk layout of the log files under an application cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLayout {
    cache_dir: PathBuf,
}

impl LogLayout {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// `<cache_dir>/logs`
    pub fn log_dir(&self) -> PathBuf {
        self.cache_dir.join(LOG_FOLDER)
    }

    /// `<cache_dir>/logs.zip`
    pub fn archive_path(&self) -> PathBuf {
        self.cache_dir.join(ARCHIVE_NAME)
    }
}

/// Header line for a session started at `started_at_millis`.
pub fn session_header(started_at_millis: i64) -> String {
    format!("{SESSION_HEADER}:{started_at_millis}")
}
