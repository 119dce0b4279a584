use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use super::{PreferenceStore, WriteMode};
use crate::error::LogResult;

/// JSON-file preference store.
///
/// The whole map is kept in memory. `WriteMode::Apply` only marks it dirty;
/// `WriteMode::Commit`, [`FilePreferences::flush`] and drop write it out
/// through a temp file in the same directory that is atomically renamed over
/// the target, so a crash mid-write never leaves a truncated store.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: Mutex<BTreeMap<String, bool>>,
    dirty: AtomicBool,
}

impl FilePreferences {
    /// Opens the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> LogResult<Self> {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes pending `Apply` changes to disk. No-op when nothing changed.
    pub fn flush(&self) -> LogResult<()> {
        if !self.dirty.load(Ordering::Acquire) {
            return Ok(());
        }
        let values = self.values.lock();
        self.persist(&values)
    }

    fn persist(
        &self,
        values: &BTreeMap<String, bool>,
    ) -> LogResult<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, values)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        self.dirty.store(false, Ordering::Release);
        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get_bool(
        &self,
        key: &str,
    ) -> Option<bool> {
        self.values.lock().get(key).copied()
    }

    fn put_bool(
        &self,
        key: &str,
        value: bool,
        mode: WriteMode,
    ) -> LogResult<()> {
        let mut values = self.values.lock();

        match mode {
            WriteMode::Apply => {
                values.insert(key.to_string(), value);
                self.dirty.store(true, Ordering::Release);
                Ok(())
            }
            WriteMode::Commit => {
                // The map only changes once the write has landed.
                let mut next = values.clone();
                next.insert(key.to_string(), value);
                self.persist(&next)?;
                *values = next;
                Ok(())
            }
        }
    }
}

impl Drop for FilePreferences {
    fn drop(&mut self) {
        if let Err(error) = self.flush() {
            tracing::warn!(
                path = %self.path.display(),
                %error,
                "Failed to persist logging preferences on drop"
            );
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
