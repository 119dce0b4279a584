use std::{error::Error, fmt};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Log priority, numbered like Android's `android.util.Log` levels so the
/// formatted output stays comparable with platform logs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u8)]
pub enum Priority {
    Verbose = 2,
    Debug = 3,
    Info = 4,
    Warn = 5,
    Error = 6,
    Assert = 7,
}

impl Priority {
    /// Single-letter code (`V`, `D`, `I`, `W`, `E`, `A`).
    pub fn letter(self) -> char {
        match self {
            Priority::Verbose => 'V',
            Priority::Debug => 'D',
            Priority::Info => 'I',
            Priority::Warn => 'W',
            Priority::Error => 'E',
            Priority::Assert => 'A',
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

impl From<tracing::Level> for Priority {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Priority::Verbose,
            tracing::Level::DEBUG => Priority::Debug,
            tracing::Level::INFO => Priority::Info,
            tracing::Level::WARN => Priority::Warn,
            tracing::Level::ERROR => Priority::Error,
        }
    }
}

/// One log call, handed by reference to every active sink.
///
/// Borrowed throughout: sinks that need to keep anything (the file sink)
/// format it into an owned line on the caller's thread.
#[derive(Clone, Copy)]
pub struct LogRecord<'a> {
    pub priority: Priority,
    pub tag: &'a str,
    pub message: &'a str,
    pub error: Option<&'a (dyn Error + 'static)>,
    pub timestamp_millis: i64,
    /// Call-site line, when known.
    pub line: Option<u32>,
}

impl<'a> LogRecord<'a> {
    /// Record stamped with the current wall-clock time.
    pub fn new(
        priority: Priority,
        tag: &'a str,
        message: &'a str,
    ) -> Self {
        Self {
            priority,
            tag,
            message,
            error: None,
            timestamp_millis: chrono::Utc::now().timestamp_millis(),
            line: None,
        }
    }

    pub fn with_error(
        mut self,
        error: &'a (dyn Error + 'static),
    ) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_line(
        mut self,
        line: u32,
    ) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_timestamp(
        mut self,
        timestamp_millis: i64,
    ) -> Self {
        self.timestamp_millis = timestamp_millis;
        self
    }
}

impl fmt::Debug for LogRecord<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("LogRecord")
            .field("priority", &self.priority)
            .field("tag", &self.tag)
            .field("message", &self.message)
            .field("error", &self.error.map(|e| e.to_string()))
            .field("timestamp_millis", &self.timestamp_millis)
            .field("line", &self.line)
            .finish()
    }
}
