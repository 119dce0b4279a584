use std::{error::Error, fmt, sync::Arc};

use parking_lot::{Mutex, RwLock};
use tracing_subscriber::fmt::MakeWriter;

use super::{
    ConsoleSink, CrashSink, FileSink, LogFacade, LogLayout, LogWorker, Priority, Sink, SinkKind,
    ZipTicket,
};
use crate::{
    config::LoggingSettings,
    crash::{CrashReporter, CRASH_REPORTING_LOGGING_KEY},
    error::LogResult,
    preferences::{
        keys, BuildDefaults, FilePreferences, LoggingPreferences, PreferenceStore, WriteMode,
    },
};

type ConsoleFactory = Arc<dyn Fn(bool) -> Arc<dyn Sink> + Send + Sync>;

/// The sinks this manager has planted, at most one per kind.
#[derive(Default)]
struct PlantedSinks {
    console: Option<Arc<dyn Sink>>,
    file: Option<Arc<dyn Sink>>,
    crash: Option<Arc<dyn Sink>>,
}

/// Applies the persisted logging flags to the sink registry.
///
/// Owns the preference store, the [`LogFacade`] the sinks are planted into
/// and the [`LogWorker`] behind the file sink. Every change diffs the
/// requested state against the current one and only then plants or uproots,
/// so a sink kind is never registered twice. The crash sink only lives while
/// the file sink does.
pub struct LoggingManager {
    prefs: Arc<dyn PreferenceStore>,
    facade: Arc<LogFacade>,
    worker: Arc<LogWorker>,
    defaults: RwLock<BuildDefaults>,
    /// Also serializes configuration changes.
    planted: Mutex<PlantedSinks>,
    console_line_numbers: bool,
    console_factory: ConsoleFactory,
}

impl LoggingManager {
    /// Starts the background worker for `layout`. No sink is planted until
    /// [`initialize`](Self::initialize).
    pub fn new(
        layout: LogLayout,
        prefs: Arc<dyn PreferenceStore>,
    ) -> LogResult<Self> {
        let worker = LogWorker::spawn(layout)?;

        Ok(Self {
            prefs,
            facade: Arc::new(LogFacade::new()),
            worker,
            defaults: RwLock::new(BuildDefaults::default()),
            planted: Mutex::new(PlantedSinks::default()),
            console_line_numbers: cfg!(debug_assertions),
            console_factory: Arc::new(|line_numbers: bool| -> Arc<dyn Sink> {
                Arc::new(ConsoleSink::stderr().with_line_numbers(line_numbers))
            }),
        })
    }

    /// Manager backed by the JSON preference file and cache directory named
    /// in `settings`.
    pub fn from_settings(settings: &LoggingSettings) -> LogResult<Self> {
        let prefs = Arc::new(FilePreferences::open(settings.preferences_path())?);
        let manager = Self::new(settings.layout(), prefs)?
            .with_console_line_numbers(settings.console_line_numbers);
        *manager.defaults.write() = settings.build_defaults();
        Ok(manager)
    }

    pub fn with_console_line_numbers(
        mut self,
        enabled: bool,
    ) -> Self {
        self.console_line_numbers = enabled;
        self
    }

    /// Sends console output to `make_writer` instead of stderr.
    pub fn with_console_writer<W>(
        mut self,
        make_writer: W,
    ) -> Self
    where
        W: for<'a> MakeWriter<'a> + Clone + Send + Sync + 'static,
    {
        self.console_factory = Arc::new(move |line_numbers: bool| -> Arc<dyn Sink> {
            Arc::new(ConsoleSink::with_writer(make_writer.clone()).with_line_numbers(line_numbers))
        });
        self
    }

    /// Resets the sink set from the persisted flags.
    ///
    /// Stores `defaults`, uproots every planted sink and closes the open log
    /// file, then plants console and file sinks per the resolved flags. The
    /// crash sink is planted when file logging is on and a `reporter` is
    /// given; the reporter is then told crash log collection is enabled.
    pub fn initialize(
        &self,
        defaults: BuildDefaults,
        reporter: Option<Arc<dyn CrashReporter>>,
    ) {
        let mut planted = self.planted.lock();
        *self.defaults.write() = defaults;

        self.uproot(&mut planted.console);
        self.uproot(&mut planted.file);
        self.uproot(&mut planted.crash);
        self.worker.close_writer();

        let prefs = LoggingPreferences::resolve(self.prefs.as_ref(), defaults);
        if prefs.debug_enabled {
            self.plant_console(&mut planted);
        }
        if prefs.file_enabled {
            self.plant_file(&mut planted);
            if let Some(reporter) = reporter {
                self.plant_crash(&mut planted, reporter);
            }
        }

        tracing::info!(
            debug_enabled = prefs.debug_enabled,
            file_enabled = prefs.file_enabled,
            crash_enabled = planted.crash.is_some(),
            "Logging initialized"
        );
    }

    /// Marks that the user has toggled logging explicitly. Idempotent.
    pub fn record_first_explicit_user_choice(&self) -> LogResult<()> {
        self.prefs
            .put_bool(keys::USER_EXPLICIT_CHOICE, true, WriteMode::Apply)
    }

    pub fn has_user_made_explicit_choice(&self) -> bool {
        self.prefs
            .get_bool(keys::USER_EXPLICIT_CHOICE)
            .unwrap_or(false)
    }

    /// Turns the console sink on or off. A no-op when the persisted state
    /// already matches.
    pub fn set_debug_logging(
        &self,
        enabled: bool,
    ) -> LogResult<()> {
        let mut planted = self.planted.lock();
        if self.debug_logging_state() == enabled {
            return Ok(());
        }

        self.prefs
            .put_bool(keys::DEBUG_ENABLED, enabled, WriteMode::Commit)?;
        if enabled {
            self.plant_console(&mut planted);
        } else {
            self.uproot(&mut planted.console);
        }

        tracing::info!(enabled, "Debug logging changed");
        Ok(())
    }

    /// Turns the file sink on or off. A no-op when the persisted state
    /// already matches.
    ///
    /// Enabling also plants the crash sink when `reporter` is given.
    /// Disabling always uproots the crash sink, reporter or not.
    pub fn set_file_logging(
        &self,
        enabled: bool,
        reporter: Option<Arc<dyn CrashReporter>>,
    ) -> LogResult<()> {
        let mut planted = self.planted.lock();
        if self.file_logging_state() == enabled {
            return Ok(());
        }

        self.prefs
            .put_bool(keys::FILE_ENABLED, enabled, WriteMode::Commit)?;
        if enabled {
            self.plant_file(&mut planted);
            if let Some(reporter) = reporter {
                self.plant_crash(&mut planted, reporter);
            }
        } else {
            self.uproot(&mut planted.file);
            self.uproot(&mut planted.crash);
        }

        tracing::info!(
            enabled,
            crash_enabled = planted.crash.is_some(),
            "File logging changed"
        );
        Ok(())
    }

    pub fn debug_logging_state(&self) -> bool {
        self.prefs
            .get_bool(keys::DEBUG_ENABLED)
            .unwrap_or(self.defaults.read().debug_enabled)
    }

    pub fn file_logging_state(&self) -> bool {
        self.prefs
            .get_bool(keys::FILE_ENABLED)
            .unwrap_or(self.defaults.read().file_enabled)
    }

    /// All three flags, resolved against the stored build defaults.
    pub fn preferences(&self) -> LoggingPreferences {
        LoggingPreferences::resolve(self.prefs.as_ref(), *self.defaults.read())
    }

    pub fn build_defaults(&self) -> BuildDefaults {
        *self.defaults.read()
    }

    /// Archives every session file. See [`LogWorker::zip_all`].
    pub fn zip_logs(&self) -> ZipTicket {
        self.worker.zip_all()
    }

    /// Sends one record to every planted sink.
    pub fn log(
        &self,
        priority: Priority,
        tag: &str,
        message: &str,
        error: Option<&(dyn Error + 'static)>,
    ) {
        self.facade.log(priority, tag, message, error);
    }

    pub fn facade(&self) -> &Arc<LogFacade> {
        &self.facade
    }

    pub fn worker(&self) -> &Arc<LogWorker> {
        &self.worker
    }

    /// Kinds of the sinks currently registered, in registration order.
    pub fn active_sinks(&self) -> Vec<SinkKind> {
        self.facade.kinds()
    }

    fn plant_console(
        &self,
        planted: &mut PlantedSinks,
    ) {
        if planted.console.is_none() {
            let sink = (self.console_factory)(self.console_line_numbers);
            self.facade.add_sink(sink.clone());
            planted.console = Some(sink);
        }
    }

    fn plant_file(
        &self,
        planted: &mut PlantedSinks,
    ) {
        if planted.file.is_none() {
            let sink: Arc<dyn Sink> = Arc::new(FileSink::new(&self.worker));
            self.facade.add_sink(sink.clone());
            planted.file = Some(sink);
        }
    }

    fn plant_crash(
        &self,
        planted: &mut PlantedSinks,
        reporter: Arc<dyn CrashReporter>,
    ) {
        if planted.crash.is_none() {
            reporter.set_flag(CRASH_REPORTING_LOGGING_KEY, true);
            let sink: Arc<dyn Sink> = Arc::new(CrashSink::new(reporter));
            self.facade.add_sink(sink.clone());
            planted.crash = Some(sink);
        }
    }

    fn uproot(
        &self,
        slot: &mut Option<Arc<dyn Sink>>,
    ) {
        if let Some(sink) = slot.take() {
            self.facade.remove_sink(&sink);
        }
    }
}

impl fmt::Debug for LoggingManager {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("LoggingManager")
            .field("facade", &self.facade)
            .field("defaults", &*self.defaults.read())
            .field("log_dir", &self.worker.layout().log_dir())
            .finish_non_exhaustive()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
