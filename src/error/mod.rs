use thiserror::Error;

/// Result alias used across the crate.
pub type LogResult<T> = Result<T, LogError>;

/// Errors produced by the logging pipeline.
///
/// Log calls themselves never surface these: sinks and the background writer
/// report failures through `tracing` diagnostics. They reach callers only on
/// the settings path (preference writes, configuration loading, archive
/// requests).
#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Preferences (de)serialization failed: {0}")]
    Preferences(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Log worker is not running")]
    WorkerStopped,

    #[error("Crash sink requires a crash reporter")]
    MissingCrashReporter,

    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(String),

    #[error("Sink failure: {0}")]
    Sink(String),
}

impl From<tempfile::PersistError> for LogError {
    fn from(err: tempfile::PersistError) -> Self {
        LogError::Io(err.error)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
