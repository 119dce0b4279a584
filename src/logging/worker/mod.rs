pub mod archive;
pub mod layout;
pub mod metrics;
pub mod writer;

pub use archive::ZipOutcome;
pub use layout::LogLayout;
pub use metrics::{WorkerMetrics, WorkerStats};
pub use writer::LogFileWriter;

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::error::{LogError, LogResult};

/// Name of the dedicated writer thread.
pub const WORKER_THREAD_NAME: &str = "arborlog-writer";

/// Work items, executed strictly one at a time in arrival order.
enum Task {
    /// Write one formatted line to the session file.
    Append(String),
    /// Close the session file and archive the log directory.
    Zip(oneshot::Sender<LogResult<ZipOutcome>>),
    /// Close the session file; the next append opens a new one.
    Close,
    /// Completes once every earlier task has run.
    Barrier(oneshot::Sender<()>),
    Shutdown,
}

/// Background log writer.
///
/// Owns the only [`LogFileWriter`] and runs every file operation on one
/// dedicated thread fed by an unbounded FIFO channel. Enqueuing never blocks
/// and never fails loudly: I/O errors are logged on the worker thread and the
/// writer is reset so the next task can start over.
///
/// Dropping the worker lets queued tasks finish, closes the file and joins
/// the thread.
pub struct LogWorker {
    tx: mpsc::UnboundedSender<Task>,
    thread: Mutex<Option<JoinHandle<()>>>,
    layout: LogLayout,
    metrics: Arc<WorkerMetrics>,
}

/// Pending result of [`LogWorker::zip_all`].
#[derive(Debug)]
pub struct ZipTicket {
    rx: oneshot::Receiver<LogResult<ZipOutcome>>,
}

impl ZipTicket {
    /// Blocks until the archive is written.
    ///
    /// # Panics
    /// When called from inside an async runtime; use
    /// [`ZipTicket::outcome`] there.
    pub fn wait(self) -> LogResult<ZipOutcome> {
        self.rx
            .blocking_recv()
            .unwrap_or_else(|_| Err(LogError::WorkerStopped))
    }

    pub async fn outcome(self) -> LogResult<ZipOutcome> {
        self.rx.await.unwrap_or_else(|_| Err(LogError::WorkerStopped))
    }
}

impl LogWorker {
    /// Starts the writer thread for `layout`.
    pub fn spawn(layout: LogLayout) -> LogResult<Arc<Self>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(WorkerMetrics::new());

        let state = WorkerState {
            writer: LogFileWriter::new(layout.clone()),
            layout: layout.clone(),
            started: false,
            metrics: metrics.clone(),
        };

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || state.run(rx))?;

        tracing::debug!(log_dir = %layout.log_dir().display(), "Log worker started");

        Ok(Arc::new(Self {
            tx,
            thread: Mutex::new(Some(handle)),
            layout,
            metrics,
        }))
    }

    pub fn layout(&self) -> &LogLayout {
        &self.layout
    }

    /// Queues `line` for writing. Fire-and-forget.
    pub fn append(
        &self,
        line: String,
    ) {
        let _ = self.enqueue(Task::Append(line));
    }

    /// Queues a zip of every file in the log directory.
    pub fn zip_all(&self) -> ZipTicket {
        let (reply, rx) = oneshot::channel();
        // On failure the task (and `reply`) is dropped and the ticket
        // resolves to WorkerStopped.
        let _ = self.enqueue(Task::Zip(reply));
        ZipTicket { rx }
    }

    /// Queues a flush+close of the current session file.
    pub fn close_writer(&self) {
        let _ = self.enqueue(Task::Close);
    }

    /// Blocks until every task queued before this call has run.
    ///
    /// # Panics
    /// When called from inside an async runtime.
    pub fn sync(&self) -> LogResult<()> {
        let (reply, rx) = oneshot::channel();
        self.enqueue(Task::Barrier(reply))?;
        rx.blocking_recv().map_err(|_| LogError::WorkerStopped)
    }

    pub fn stats(&self) -> WorkerStats {
        self.metrics.stats()
    }

    fn enqueue(
        &self,
        task: Task,
    ) -> LogResult<()> {
        self.tx.send(task).map_err(|_| {
            self.metrics.record_dropped();
            LogError::WorkerStopped
        })
    }
}

impl Drop for LogWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(Task::Shutdown);

        if let Some(handle) = self.thread.lock().take() {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                tracing::error!("Log worker thread panicked");
            }
        }
    }
}

/// State owned by the writer thread.
struct WorkerState {
    writer: LogFileWriter,
    layout: LogLayout,
    /// Set once the session header has been written.
    started: bool,
    metrics: Arc<WorkerMetrics>,
}

impl WorkerState {
    fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Task>,
    ) {
        while let Some(task) = rx.blocking_recv() {
            match task {
                Task::Append(line) => self.append(&line),
                Task::Zip(reply) => {
                    let _ = reply.send(self.zip());
                }
                Task::Close => self.close(),
                Task::Barrier(reply) => {
                    let _ = reply.send(());
                }
                Task::Shutdown => break,
            }
        }

        self.close();
        tracing::debug!("Log worker stopped");
    }

    fn append(
        &mut self,
        line: &str,
    ) {
        if let Err(error) = self.try_append(line) {
            self.metrics.record_failure();
            self.writer.reset();
            tracing::error!(%error, "Failed to append log line");
        }
    }

    fn try_append(
        &mut self,
        line: &str,
    ) -> LogResult<()> {
        if !self.started {
            let header = layout::session_header(chrono::Utc::now().timestamp_millis());
            self.writer.write_line(&header)?;
            self.metrics.record_line();
            self.started = true;
        }

        self.writer.write_line(line)?;
        self.metrics.record_line();
        Ok(())
    }

    fn close(&mut self) {
        if !self.writer.is_open() {
            return;
        }
        match self.writer.flush_and_close() {
            Ok(()) => self.metrics.record_flush(),
            Err(error) => {
                self.writer.reset();
                tracing::warn!(%error, "Failed to close log file");
            }
        }
    }

    fn zip(&mut self) -> LogResult<ZipOutcome> {
        self.close();

        let result = archive::zip_directory(&self.layout.log_dir(), &self.layout.archive_path());
        match &result {
            Ok(ZipOutcome::NothingToZip) => {
                tracing::info!(log_dir = %self.layout.log_dir().display(), "No log files to zip");
            }
            Ok(ZipOutcome::Archived { .. }) => {}
            Err(error) => {
                tracing::error!(%error, "Failed to zip log files");
            }
        }
        result
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn read_log_files(layout: &LogLayout) -> Vec<String> {
        archive::collect_log_files(&layout.log_dir())
            .unwrap()
            .into_iter()
            .map(|p| fs::read_to_string(p).unwrap())
            .collect()
    }

    /// Test checks that the first append writes the session header before
    /// the line, and later appends do not repeat it.
    #[test]
    fn test_header_written_once() {
        let dir = tempdir().unwrap();
        let worker = LogWorker::spawn(LogLayout::new(dir.path())).unwrap();

        worker.append("3, T, one".into());
        worker.append("3, T, two".into());
        worker.sync().unwrap();

        let files = read_log_files(worker.layout());
        assert_eq!(files.len(), 1);
        let lines: Vec<&str> = files[0].lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("For troubleshooting purposes only.:"));
        assert_eq!(&lines[1..], &["3, T, one", "3, T, two"]);
        assert_eq!(worker.stats().lines_written, 3);
    }

    /// Test checks that a close starts a new session file without a second
    /// header.
    #[test]
    fn test_close_rolls_to_new_file_without_header() {
        let dir = tempdir().unwrap();
        let worker = LogWorker::spawn(LogLayout::new(dir.path())).unwrap();

        worker.append("first".into());
        worker.close_writer();
        worker.append("second".into());
        worker.sync().unwrap();

        let mut files = read_log_files(worker.layout());
        files.sort_by_key(|content| content.len());
        assert_eq!(files.len(), 2);
        assert_eq!(files[0], "second\n");
        assert!(files[1].ends_with("first\n"));
        assert_eq!(worker.stats().flush_count, 1);
    }

    /// Test checks that zipping flushes pending lines first and reports the
    /// archive.
    #[test]
    fn test_zip_after_appends() {
        let dir = tempdir().unwrap();
        let layout = LogLayout::new(dir.path());
        let worker = LogWorker::spawn(layout.clone()).unwrap();

        worker.append("line".into());
        let outcome = worker.zip_all().wait().unwrap();

        assert_eq!(
            outcome,
            ZipOutcome::Archived {
                path: layout.archive_path(),
                entries: 1
            }
        );
        assert!(layout.archive_path().exists());
    }

    #[test]
    fn test_zip_without_logs() {
        let dir = tempdir().unwrap();
        let layout = LogLayout::new(dir.path());
        let worker = LogWorker::spawn(layout.clone()).unwrap();

        assert_eq!(worker.zip_all().wait().unwrap(), ZipOutcome::NothingToZip);
        assert!(!layout.archive_path().exists());
    }

    /// Test checks the async side of the ticket.
    #[tokio::test]
    async fn test_zip_ticket_outcome_async() {
        let dir = tempdir().unwrap();
        let worker = LogWorker::spawn(LogLayout::new(dir.path())).unwrap();

        worker.append("line".into());
        let outcome = worker.zip_all().outcome().await.unwrap();
        assert!(matches!(outcome, ZipOutcome::Archived { entries: 1, .. }));
    }

    /// Test checks recovery: a failing append is counted, and once the
    /// directory is usable again the next append succeeds.
    #[test]
    fn test_append_failure_is_recoverable() {
        let dir = tempdir().unwrap();
        let cache = dir.path().join("cache");
        // Block the log directory with a regular file.
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join("logs"), b"not a dir").unwrap();

        let worker = LogWorker::spawn(LogLayout::new(&cache)).unwrap();
        worker.append("lost".into());
        worker.sync().unwrap();
        assert_eq!(worker.stats().write_failures, 1);

        fs::remove_file(cache.join("logs")).unwrap();
        worker.append("kept".into());
        worker.sync().unwrap();

        let files = read_log_files(worker.layout());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("kept\n"));
        assert_eq!(worker.stats().write_failures, 1);
    }

    /// Test checks that dropping the worker drains the queue before the
    /// thread exits.
    #[test]
    fn test_drop_drains_queue() {
        let dir = tempdir().unwrap();
        let layout = LogLayout::new(dir.path());
        let worker = LogWorker::spawn(layout.clone()).unwrap();

        for i in 0..50 {
            worker.append(format!("line {i}"));
        }
        drop(worker);

        let files = read_log_files(&layout);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].lines().count(), 51);
    }
}
