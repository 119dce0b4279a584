use std::{
    error::Error,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use parking_lot::RwLock;

use super::{LogRecord, Priority};
use crate::error::LogResult;

/// Which of the built-in sinks an instance is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Console,
    File,
    Crash,
    /// Application-provided sink.
    Custom,
}

impl fmt::Display for SinkKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            SinkKind::Console => "console",
            SinkKind::File => "file",
            SinkKind::Crash => "crash",
            SinkKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// A destination that receives every record while registered.
pub trait Sink: Send + Sync {
    fn kind(&self) -> SinkKind;

    /// Handles one record. Errors are reported by the facade and never reach
    /// the code that logged.
    fn log(
        &self,
        record: &LogRecord<'_>,
    ) -> LogResult<()>;
}

/// Registry of active sinks; a log call fans out to all of them.
///
/// Sinks are identified by pointer, so adding the same `Arc` twice is a no-op
/// and removal needs the `Arc` that was added.
#[derive(Default)]
pub struct LogFacade {
    sinks: RwLock<Vec<Arc<dyn Sink>>>,
}

impl LogFacade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `sink`. Returns `false` when it was already registered.
    pub fn add_sink(
        &self,
        sink: Arc<dyn Sink>,
    ) -> bool {
        let mut sinks = self.sinks.write();
        if sinks.iter().any(|s| Arc::ptr_eq(s, &sink)) {
            return false;
        }
        sinks.push(sink);
        true
    }

    /// Unregisters `sink`. Returns `false` when it was not registered.
    pub fn remove_sink(
        &self,
        sink: &Arc<dyn Sink>,
    ) -> bool {
        let mut sinks = self.sinks.write();
        let before = sinks.len();
        sinks.retain(|s| !Arc::ptr_eq(s, sink));
        sinks.len() != before
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.read().len()
    }

    pub fn count_of(
        &self,
        kind: SinkKind,
    ) -> usize {
        self.sinks.read().iter().filter(|s| s.kind() == kind).count()
    }

    /// Kinds of the registered sinks, in registration order.
    pub fn kinds(&self) -> Vec<SinkKind> {
        self.sinks.read().iter().map(|s| s.kind()).collect()
    }

    /// Builds a record stamped now and dispatches it.
    pub fn log(
        &self,
        priority: Priority,
        tag: &str,
        message: &str,
        error: Option<&(dyn Error + 'static)>,
    ) {
        let mut record = LogRecord::new(priority, tag, message);
        record.error = error;
        self.dispatch(&record);
    }

    /// Hands `record` to every registered sink in registration order.
    ///
    /// Works on a snapshot of the registry, so sinks may log or change the
    /// registry themselves. A sink that errors or panics is reported and
    /// skipped; the remaining sinks still run.
    pub fn dispatch(
        &self,
        record: &LogRecord<'_>,
    ) {
        let snapshot: Vec<Arc<dyn Sink>> = self.sinks.read().clone();

        for sink in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| sink.log(record))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    tracing::warn!(sink = %sink.kind(), %error, "Sink failed to handle log record");
                }
                Err(_) => {
                    tracing::error!(sink = %sink.kind(), "Sink panicked while handling log record");
                }
            }
        }
    }
}

impl fmt::Debug for LogFacade {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("LogFacade")
            .field("sinks", &self.kinds())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::error::LogError;

    /// Sink that records what it saw into a shared journal.
    struct JournalSink {
        name: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl Sink for JournalSink {
        fn kind(&self) -> SinkKind {
            SinkKind::Custom
        }

        fn log(
            &self,
            record: &LogRecord<'_>,
        ) -> LogResult<()> {
            self.journal
                .lock()
                .push(format!("{}:{}", self.name, record.message));
            Ok(())
        }
    }

    struct FailingSink;

    impl Sink for FailingSink {
        fn kind(&self) -> SinkKind {
            SinkKind::Custom
        }

        fn log(
            &self,
            _record: &LogRecord<'_>,
        ) -> LogResult<()> {
            Err(LogError::Sink("always fails".into()))
        }
    }

    struct PanickingSink;

    impl Sink for PanickingSink {
        fn kind(&self) -> SinkKind {
            SinkKind::Custom
        }

        fn log(
            &self,
            _record: &LogRecord<'_>,
        ) -> LogResult<()> {
            panic!("sink blew up");
        }
    }

    fn journal_sink(
        name: &'static str,
        journal: &Arc<Mutex<Vec<String>>>,
    ) -> Arc<dyn Sink> {
        Arc::new(JournalSink {
            name,
            journal: journal.clone(),
        })
    }

    /// Test checks that records reach all sinks in registration order.
    #[test]
    fn test_fan_out_in_registration_order() {
        let facade = LogFacade::new();
        let journal = Arc::new(Mutex::new(Vec::new()));
        facade.add_sink(journal_sink("a", &journal));
        facade.add_sink(journal_sink("b", &journal));

        facade.log(Priority::Info, "T", "one", None);

        assert_eq!(*journal.lock(), vec!["a:one", "b:one"]);
    }

    /// Test checks identity-based add/remove: double add and removing an
    /// unknown sink are no-ops.
    #[test]
    fn test_add_remove_are_idempotent() {
        let facade = LogFacade::new();
        let journal = Arc::new(Mutex::new(Vec::new()));
        let sink = journal_sink("a", &journal);
        let other = journal_sink("a", &journal);

        assert!(facade.add_sink(sink.clone()));
        assert!(!facade.add_sink(sink.clone()));
        assert_eq!(facade.sink_count(), 1);

        assert!(!facade.remove_sink(&other));
        assert!(facade.remove_sink(&sink));
        assert!(!facade.remove_sink(&sink));
        assert_eq!(facade.sink_count(), 0);

        facade.log(Priority::Info, "T", "dropped", None);
        assert!(journal.lock().is_empty());
    }

    /// Test checks that failing and panicking sinks do not stop the others.
    #[test]
    fn test_failures_are_isolated() {
        let facade = LogFacade::new();
        let journal = Arc::new(Mutex::new(Vec::new()));
        facade.add_sink(Arc::new(FailingSink));
        facade.add_sink(Arc::new(PanickingSink));
        facade.add_sink(journal_sink("survivor", &journal));

        facade.log(Priority::Error, "T", "still here", None);
        facade.log(Priority::Error, "T", "and again", None);

        assert_eq!(
            *journal.lock(),
            vec!["survivor:still here", "survivor:and again"]
        );
    }

    #[test]
    fn test_count_of_kind() {
        let facade = LogFacade::new();
        let journal = Arc::new(Mutex::new(Vec::new()));
        facade.add_sink(journal_sink("a", &journal));
        facade.add_sink(Arc::new(FailingSink));

        assert_eq!(facade.count_of(SinkKind::Custom), 2);
        assert_eq!(facade.count_of(SinkKind::File), 0);
        assert_eq!(facade.kinds(), vec![SinkKind::Custom, SinkKind::Custom]);
    }
}
