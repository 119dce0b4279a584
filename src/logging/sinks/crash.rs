use std::{fmt, sync::Arc};

use crate::{
    crash::CrashReporter,
    error::{LogError, LogResult},
    logging::{LogRecord, Sink, SinkKind},
};

/// Forwards records to a [`CrashReporter`].
///
/// Errors go to `log_exception`; records with both a tag and a message go to
/// `log_line` with the tag prefixed by the record timestamp. A record with
/// an error and a message triggers both.
#[derive(Clone)]
pub struct CrashSink {
    reporter: Arc<dyn CrashReporter>,
}

impl CrashSink {
    pub fn new(reporter: Arc<dyn CrashReporter>) -> Self {
        Self { reporter }
    }

    /// Fails with [`LogError::MissingCrashReporter`] when `reporter` is
    /// `None`.
    pub fn from_optional(reporter: Option<Arc<dyn CrashReporter>>) -> LogResult<Self> {
        reporter.map(Self::new).ok_or(LogError::MissingCrashReporter)
    }

    pub fn reporter(&self) -> &Arc<dyn CrashReporter> {
        &self.reporter
    }
}

impl fmt::Debug for CrashSink {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("CrashSink").finish_non_exhaustive()
    }
}

impl Sink for CrashSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Crash
    }

    fn log(
        &self,
        record: &LogRecord<'_>,
    ) -> LogResult<()> {
        if let Some(error) = record.error {
            self.reporter.log_exception(error);
        }
        if !record.tag.is_empty() && !record.message.is_empty() {
            let tag = format!("{}, {}", record.timestamp_millis, record.tag);
            self.reporter.log_line(record.priority, &tag, record.message);
        }
        Ok(())
    }
}
