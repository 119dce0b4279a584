use dashmap::DashMap;

use super::{PreferenceStore, WriteMode};
use crate::error::LogResult;

/// In-process preference store. Both write modes behave the same: there is
/// nothing to persist.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: DashMap<String, bool>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(
        &self,
        key: &str,
    ) -> Option<bool> {
        self.values.get(key).map(|v| *v)
    }

    fn put_bool(
        &self,
        key: &str,
        value: bool,
        _mode: WriteMode,
    ) -> LogResult<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}
