use std::error::Error;

use crate::logging::Priority;

/// Flag set on the crash reporter whenever the crash sink is planted.
pub const CRASH_REPORTING_LOGGING_KEY: &str = "crash_reporting_logging";

/// Contract of a crash-analytics backend.
///
/// Implementations are called synchronously on the thread that produced the
/// log record and should hand work off quickly.
pub trait CrashReporter: Send + Sync {
    /// Records a non-fatal error.
    fn log_exception(
        &self,
        error: &(dyn Error + 'static),
    );

    /// Appends a breadcrumb line to the next crash report.
    fn log_line(
        &self,
        priority: Priority,
        tag: &str,
        message: &str,
    );

    /// Sets a boolean custom key on crash reports.
    fn set_flag(
        &self,
        key: &str,
        value: bool,
    );
}

/// Reporter for builds without a crash-analytics backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCrashReporter;

impl CrashReporter for NoopCrashReporter {
    fn log_exception(
        &self,
        _error: &(dyn Error + 'static),
    ) {
    }

    fn log_line(
        &self,
        _priority: Priority,
        _tag: &str,
        _message: &str,
    ) {
    }

    fn set_flag(
        &self,
        _key: &str,
        _value: bool,
    ) {
    }
}
