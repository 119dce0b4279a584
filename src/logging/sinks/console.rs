use std::{
    borrow::Cow,
    io::{self, Stderr, Write},
};

use tracing_subscriber::fmt::MakeWriter;

use crate::{
    error::LogResult,
    logging::{formatter, LogRecord, Sink, SinkKind},
};

/// Writes every record to the local console, synchronously.
///
/// The output target is any [`MakeWriter`] (stderr by default), so tests and
/// embedders can capture it. With line numbers enabled the tag becomes
/// `<tag>:<line>` for records that carry a call-site line.
pub struct ConsoleSink<W = fn() -> Stderr> {
    make_writer: W,
    with_line_numbers: bool,
}

impl ConsoleSink {
    /// Console sink on stderr; line numbers follow `debug_assertions`.
    pub fn stderr() -> Self {
        Self {
            make_writer: io::stderr,
            with_line_numbers: cfg!(debug_assertions),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stderr()
    }
}

impl<W> ConsoleSink<W>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    pub fn with_writer(make_writer: W) -> Self {
        Self {
            make_writer,
            with_line_numbers: cfg!(debug_assertions),
        }
    }

    pub fn with_line_numbers(
        mut self,
        enabled: bool,
    ) -> Self {
        self.with_line_numbers = enabled;
        self
    }

    fn tag<'r>(
        &self,
        record: &LogRecord<'r>,
    ) -> Cow<'r, str> {
        match (self.with_line_numbers, record.line) {
            (true, Some(line)) => Cow::Owned(format!("{}:{}", record.tag, line)),
            _ => Cow::Borrowed(record.tag),
        }
    }
}

impl<W> Sink for ConsoleSink<W>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    fn kind(&self) -> SinkKind {
        SinkKind::Console
    }

    fn log(
        &self,
        record: &LogRecord<'_>,
    ) -> LogResult<()> {
        let tag = self.tag(record);
        let line = formatter::format(record.priority, &tag, record.message, record.error);

        let mut out = self.make_writer.make_writer();
        writeln!(out, "{line}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::logging::Priority;

    // Mini buffer writer for tests
    #[derive(Clone, Default)]
    struct VecMakeWriter(Arc<Mutex<Vec<u8>>>);

    impl<'a> MakeWriter<'a> for VecMakeWriter {
        type Writer = VecWriterGuard;

        fn make_writer(&'a self) -> Self::Writer {
            VecWriterGuard(self.0.clone())
        }
    }

    struct VecWriterGuard(Arc<Mutex<Vec<u8>>>);

    impl Write for VecWriterGuard {
        fn write(
            &mut self,
            buf: &[u8],
        ) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl VecMakeWriter {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    /// Test checks the plain line format without line numbers.
    #[test]
    fn test_writes_formatted_line() {
        let buffer = VecMakeWriter::default();
        let sink = ConsoleSink::with_writer(buffer.clone()).with_line_numbers(false);

        let record = LogRecord::new(Priority::Info, "Main", "hello").with_line(12);
        sink.log(&record).unwrap();

        assert_eq!(buffer.contents(), "4, Main, hello\n");
    }

    /// Test checks the `<tag>:<line>` suffix.
    #[test]
    fn test_line_number_suffix() {
        let buffer = VecMakeWriter::default();
        let sink = ConsoleSink::with_writer(buffer.clone()).with_line_numbers(true);

        sink.log(&LogRecord::new(Priority::Debug, "Main", "with line").with_line(12))
            .unwrap();
        sink.log(&LogRecord::new(Priority::Debug, "Main", "without line"))
            .unwrap();

        assert_eq!(
            buffer.contents(),
            "3, Main:12, with line\n3, Main, without line\n"
        );
    }

    #[test]
    fn test_stderr_sink_kind() {
        assert_eq!(ConsoleSink::stderr().kind(), SinkKind::Console);
    }
}
