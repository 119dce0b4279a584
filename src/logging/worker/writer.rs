use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use super::layout::{LogLayout, FILE_PREFIX};
use crate::error::LogResult;

/// Single output stream of the current logging session.
///
/// Opened lazily on the first write: creates the log directory if needed and
/// a new, uniquely named file inside it. Every line is flushed as soon as it
/// is written. After [`LogFileWriter::flush_and_close`] or
/// [`LogFileWriter::reset`] the next write starts a new file.
#[derive(Debug)]
pub struct LogFileWriter {
    layout: LogLayout,
    current: Option<OpenFile>,
}

#[derive(Debug)]
struct OpenFile {
    path: PathBuf,
    out: BufWriter<File>,
}

impl LogFileWriter {
    pub fn new(layout: LogLayout) -> Self {
        Self {
            layout,
            current: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Path of the open session file, if any.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|f| f.path.as_path())
    }

    /// Appends `line` plus a newline and flushes.
    pub fn write_line(
        &mut self,
        line: &str,
    ) -> LogResult<()> {
        let file = self.ensure_open()?;

        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        file.out.write_all(buf.as_bytes())?;
        file.out.flush()?;
        Ok(())
    }

    /// Flushes and closes the open file. No-op when nothing is open.
    pub fn flush_and_close(&mut self) -> LogResult<()> {
        if let Some(mut file) = self.current.take() {
            file.out.flush()?;
            let inner = file.out.into_inner().map_err(|e| e.into_error())?;
            inner.sync_all()?;

            tracing::debug!(path = %file.path.display(), "Log file closed");
        }
        Ok(())
    }

    /// Drops the open file without flushing. Used after an I/O failure so the
    /// next write starts from a fresh file.
    pub fn reset(&mut self) {
        self.current = None;
    }

    fn ensure_open(&mut self) -> LogResult<&mut OpenFile> {
        let file = match self.current.take() {
            Some(file) => file,
            None => self.open_new_file()?,
        };
        Ok(self.current.insert(file))
    }

    fn open_new_file(&self) -> LogResult<OpenFile> {
        let dir = self.layout.log_dir();
        fs::create_dir_all(&dir)?;

        let prefix = format!(
            "{}_{}_",
            FILE_PREFIX,
            chrono::Utc::now().timestamp_millis()
        );
        let (file, path) = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".log")
            .rand_bytes(6)
            .tempfile_in(&dir)?
            .keep()?;

        tracing::debug!(path = %path.display(), "Log file opened");

        Ok(OpenFile {
            path,
            out: BufWriter::new(file),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    /// Test checks that the first write creates the directory and a file
    /// named with the fixed prefix.
    #[test]
    fn test_lazy_open_creates_dir_and_file() {
        let dir = tempdir().unwrap();
        let layout = LogLayout::new(dir.path());
        let mut writer = LogFileWriter::new(layout.clone());
        assert!(!writer.is_open());
        assert!(!layout.log_dir().exists());

        writer.write_line("first").unwrap();

        let path = writer.current_path().unwrap().to_path_buf();
        assert!(path.starts_with(layout.log_dir()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("l_"), "unexpected name {name}");
        assert!(name.ends_with(".log"), "unexpected name {name}");
    }

    /// Test checks that every line is on disk right after write_line returns.
    #[test]
    fn test_lines_are_flushed_per_write() {
        let dir = tempdir().unwrap();
        let mut writer = LogFileWriter::new(LogLayout::new(dir.path()));

        writer.write_line("a").unwrap();
        writer.write_line("b").unwrap();

        let path = writer.current_path().unwrap().to_path_buf();
        assert_eq!(fs::read_to_string(path).unwrap(), "a\nb\n");
    }

    /// Test checks that closing starts a new file on the next write.
    #[test]
    fn test_close_then_write_opens_new_file() {
        let dir = tempdir().unwrap();
        let layout = LogLayout::new(dir.path());
        let mut writer = LogFileWriter::new(layout.clone());

        writer.write_line("one").unwrap();
        let first = writer.current_path().unwrap().to_path_buf();
        writer.flush_and_close().unwrap();
        assert!(!writer.is_open());
        writer.flush_and_close().unwrap();

        writer.write_line("two").unwrap();
        let second = writer.current_path().unwrap().to_path_buf();
        assert_ne!(first, second);
        assert_eq!(fs::read_dir(layout.log_dir()).unwrap().count(), 2);
    }

    /// Test checks that an unusable directory surfaces an error and leaves
    /// the writer closed.
    #[test]
    fn test_open_failure_leaves_writer_closed() {
        let dir = tempdir().unwrap();
        // A regular file where the cache directory should be.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        let mut writer = LogFileWriter::new(LogLayout::new(&blocker));
        assert!(writer.write_line("lost").is_err());
        assert!(!writer.is_open());
    }
}
