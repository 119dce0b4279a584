/// Settings loading (defaults + `ARBORLOG_*` environment).
pub mod config;
/// Crash reporting collaborator contract.
pub mod crash;
/// Crate-wide error type.
pub mod error;
/// Sinks, facade, background writer and the configuration manager.
pub mod logging;
/// Persisted logging flags and the stores that hold them.
pub mod preferences;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

pub use config::LoggingSettings;
pub use crash::{CrashReporter, NoopCrashReporter, CRASH_REPORTING_LOGGING_KEY};
pub use error::{LogError, LogResult};
pub use logging::{
    format, init_tracing, ConsoleSink, CrashSink, FacadeLayer, FileSink, LogFacade, LogLayout,
    LogRecord, LogWorker, LoggingManager, Priority, Sink, SinkKind, WorkerStats, ZipOutcome,
    ZipTicket,
};
pub use preferences::{
    BuildDefaults, FilePreferences, LoggingPreferences, MemoryPreferences, PreferenceStore,
    WriteMode,
};
