use std::path::PathBuf;

use config::{Config, Environment};
use serde::{Deserialize, Serialize};

use crate::{error::LogResult, logging::LogLayout, preferences::BuildDefaults};

/// File name of the JSON preference store when none is configured.
pub const DEFAULT_PREFERENCES_FILE: &str = "logging_prefs.json";

/// Process-level logging settings.
///
/// Everything here is static for the lifetime of the process: where the
/// cache directory lives, the build-variant defaults for the two flags and
/// how the console sink decorates its tags. The runtime on/off state of each
/// sink lives in the preference store, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Base directory holding `logs/` and `logs.zip`.
    pub cache_dir: PathBuf,
    /// JSON preference store; `<cache_dir>/logging_prefs.json` when unset.
    #[serde(default)]
    pub preferences_file: Option<PathBuf>,
    /// Debug (console) logging state when the user never chose one.
    pub default_debug_enabled: bool,
    /// File logging state when the user never chose one.
    pub default_file_enabled: bool,
    /// Append `:<line>` to console tags.
    pub console_line_numbers: bool,
    /// Filter directive for the tracing bridge (overridden by `RUST_LOG`).
    pub filter: String,
}

impl LoggingSettings {
    /// Loads settings: built-in defaults overridden by `ARBORLOG_*`
    /// environment variables (for example `ARBORLOG_CACHE_DIR`,
    /// `ARBORLOG_DEFAULT_FILE_ENABLED=true`).
    pub fn load() -> LogResult<Self> {
        let default_cache = std::env::temp_dir().join("arborlog");

        let cfg = Config::builder()
            // Adding default values
            .set_default("cache_dir", default_cache.to_string_lossy().into_owned())?
            .set_default("default_debug_enabled", false)?
            .set_default("default_file_enabled", false)?
            .set_default("console_line_numbers", cfg!(debug_assertions))?
            .set_default("filter", "info")?
            // Add environment variables with the ARBORLOG_ prefix
            .add_source(Environment::with_prefix("ARBORLOG").try_parsing(true))
            .build()?;

        Ok(cfg.try_deserialize()?)
    }

    /// Settings rooted at `cache_dir` with every other field at its default.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            preferences_file: None,
            default_debug_enabled: false,
            default_file_enabled: false,
            console_line_numbers: cfg!(debug_assertions),
            filter: "info".to_string(),
        }
    }

    pub fn build_defaults(&self) -> BuildDefaults {
        BuildDefaults {
            debug_enabled: self.default_debug_enabled,
            file_enabled: self.default_file_enabled,
        }
    }

    pub fn layout(&self) -> LogLayout {
        LogLayout::new(&self.cache_dir)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.preferences_file
            .clone()
            .unwrap_or_else(|| self.cache_dir.join(DEFAULT_PREFERENCES_FILE))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::env;

    use serial_test::serial;

    use super::*;

    fn clear_env() {
        for key in [
            "ARBORLOG_CACHE_DIR",
            "ARBORLOG_PREFERENCES_FILE",
            "ARBORLOG_DEFAULT_DEBUG_ENABLED",
            "ARBORLOG_DEFAULT_FILE_ENABLED",
            "ARBORLOG_CONSOLE_LINE_NUMBERS",
            "ARBORLOG_FILTER",
        ] {
            env::remove_var(key);
        }
    }

    /// Test checks that load() without environment overrides produces the
    /// built-in defaults.
    #[test]
    #[serial]
    fn test_load_defaults() {
        clear_env();

        let settings = LoggingSettings::load().unwrap();
        assert_eq!(settings.cache_dir, env::temp_dir().join("arborlog"));
        assert!(!settings.default_debug_enabled);
        assert!(!settings.default_file_enabled);
        assert_eq!(settings.filter, "info");
        assert!(settings.preferences_file.is_none());
    }

    /// Test checks that ARBORLOG_* variables override the defaults, booleans
    /// included.
    #[test]
    #[serial]
    fn test_load_env_overrides() {
        clear_env();
        env::set_var("ARBORLOG_CACHE_DIR", "/tmp/arborlog-env-test");
        env::set_var("ARBORLOG_DEFAULT_FILE_ENABLED", "true");
        env::set_var("ARBORLOG_FILTER", "debug");

        let settings = LoggingSettings::load().unwrap();
        clear_env();

        assert_eq!(settings.cache_dir, PathBuf::from("/tmp/arborlog-env-test"));
        assert!(settings.default_file_enabled);
        assert!(!settings.default_debug_enabled);
        assert_eq!(settings.filter, "debug");
    }

    /// Test checks that a malformed variable surfaces as a configuration
    /// error.
    #[test]
    #[serial]
    fn test_load_rejects_malformed_bool() {
        clear_env();
        env::set_var("ARBORLOG_DEFAULT_FILE_ENABLED", "sometimes");

        let result = LoggingSettings::load();
        clear_env();

        assert!(matches!(result, Err(crate::LogError::Config(_))));
    }

    /// Test checks the derived paths and defaults.
    #[test]
    fn test_derived_values() {
        let mut settings = LoggingSettings::with_cache_dir("/data/cache");
        settings.default_debug_enabled = true;

        assert_eq!(
            settings.build_defaults(),
            BuildDefaults {
                debug_enabled: true,
                file_enabled: false
            }
        );
        assert_eq!(
            settings.preferences_path(),
            PathBuf::from("/data/cache/logging_prefs.json")
        );
        assert_eq!(
            settings.layout().log_dir(),
            PathBuf::from("/data/cache/logs")
        );

        settings.preferences_file = Some(PathBuf::from("/elsewhere/prefs.json"));
        assert_eq!(
            settings.preferences_path(),
            PathBuf::from("/elsewhere/prefs.json")
        );
    }
}
