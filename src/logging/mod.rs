pub mod bridge;
pub mod facade;
mod filters;
mod formatter;
pub mod manager;
pub mod record;
pub mod sinks;
pub mod worker;

use std::{io, sync::Arc};

pub use bridge::FacadeLayer;
pub use facade::{LogFacade, Sink, SinkKind};
pub use formatter::format;
pub use manager::LoggingManager;
pub use record::{LogRecord, Priority};
pub use sinks::{ConsoleSink, CrashSink, FileSink};
pub use worker::{LogLayout, LogWorker, WorkerStats, ZipOutcome, ZipTicket};
use tracing_subscriber::{
    filter::FilterFn, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::{
    config::LoggingSettings,
    error::{LogError, LogResult},
};

/// Whether `target` belongs to this crate's own diagnostics.
pub(crate) fn is_internal_target(target: &str) -> bool {
    target == "arborlog" || target.starts_with("arborlog::")
}

/// Installs the global `tracing` subscriber.
///
/// Application events pass through the filter into `facade` (and from there
/// to whatever sinks are planted). This crate's own diagnostics bypass the
/// sinks and go straight to stderr. Fails when a global subscriber is
/// already set.
pub fn init_tracing(
    facade: Arc<LogFacade>,
    settings: &LoggingSettings,
) -> LogResult<()> {
    let env_filter = filters::build_filter(&settings.filter);

    let diagnostics = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_filter(FilterFn::new(|meta| is_internal_target(meta.target())));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(FacadeLayer::new(facade))
        .with(diagnostics)
        .try_init()
        .map_err(|e| LogError::Subscriber(e.to_string()))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        filter = %settings.filter,
        cache_dir = %settings.cache_dir.display(),
        "Logging system initialized"
    );

    Ok(())
}
