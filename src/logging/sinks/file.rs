use std::sync::{Arc, Weak};

use crate::{
    error::LogResult,
    logging::{formatter, LogRecord, LogWorker, Sink, SinkKind},
};

/// Forwards records to the background [`LogWorker`].
///
/// The line is formatted here, on the logging thread, as
/// `<priority>, <millis>, <tag>, <message>[, <error>]`; the worker only
/// writes it. Line breaks inside the record are escaped as `\n` and `\r`,
/// so every call yields exactly one physical line. The sink keeps a weak
/// reference: once the worker is gone, records are dropped silently.
#[derive(Debug, Clone)]
pub struct FileSink {
    worker: Weak<LogWorker>,
}

impl FileSink {
    pub fn new(worker: &Arc<LogWorker>) -> Self {
        Self {
            worker: Arc::downgrade(worker),
        }
    }

    /// Whether the worker this sink feeds is still alive.
    pub fn is_connected(&self) -> bool {
        self.worker.strong_count() > 0
    }

    /// Text handed to the worker for `record`.
    pub fn format_line(record: &LogRecord<'_>) -> String {
        let tag = format!("{}, {}", record.timestamp_millis, record.tag);
        let line = formatter::format(record.priority, &tag, record.message, record.error);
        if line.contains(['\n', '\r']) {
            line.replace('\r', "\\r").replace('\n', "\\n")
        } else {
            line
        }
    }
}

impl Sink for FileSink {
    fn kind(&self) -> SinkKind {
        SinkKind::File
    }

    fn log(
        &self,
        record: &LogRecord<'_>,
    ) -> LogResult<()> {
        if let Some(worker) = self.worker.upgrade() {
            worker.append(Self::format_line(record));
        }
        Ok(())
    }
}
