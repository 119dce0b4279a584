pub mod file;
pub mod memory;

pub use file::FilePreferences;
pub use memory::MemoryPreferences;

use crate::error::LogResult;

/// Stable preference keys. Renaming any of these loses the stored state of
/// existing installs.
pub mod keys {
    /// Console (debug) sink enabled.
    pub const DEBUG_ENABLED: &str = "logging_level_debug";
    /// File sink enabled.
    pub const FILE_ENABLED: &str = "logging_level_file";
    /// The user has explicitly toggled logging at least once.
    pub const USER_EXPLICIT_CHOICE: &str = "logging_user_explicit_decision_made";
}

/// Durability requested for a single preference write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Visible to readers immediately, persisted later.
    Apply,
    /// Persisted before the call returns.
    Commit,
}

/// String-keyed boolean store backing the logging flags.
pub trait PreferenceStore: Send + Sync {
    /// `None` when the key was never written.
    fn get_bool(
        &self,
        key: &str,
    ) -> Option<bool>;

    fn put_bool(
        &self,
        key: &str,
        value: bool,
        mode: WriteMode,
    ) -> LogResult<()>;
}

/// Per-build-variant fallbacks used while no preference is stored.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildDefaults {
    pub debug_enabled: bool,
    pub file_enabled: bool,
}

impl BuildDefaults {
    pub fn new(
        debug_enabled: bool,
        file_enabled: bool,
    ) -> Self {
        Self {
            debug_enabled,
            file_enabled,
        }
    }
}

/// Resolved view of the persisted logging flags.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoggingPreferences {
    pub debug_enabled: bool,
    pub file_enabled: bool,
    pub user_made_explicit_choice: bool,
}

impl LoggingPreferences {
    /// Reads all flags from `store`, falling back per field to `defaults`.
    pub fn resolve(
        store: &dyn PreferenceStore,
        defaults: BuildDefaults,
    ) -> Self {
        Self {
            debug_enabled: store
                .get_bool(keys::DEBUG_ENABLED)
                .unwrap_or(defaults.debug_enabled),
            file_enabled: store
                .get_bool(keys::FILE_ENABLED)
                .unwrap_or(defaults.file_enabled),
            user_made_explicit_choice: store
                .get_bool(keys::USER_EXPLICIT_CHOICE)
                .unwrap_or(false),
        }
    }
}
