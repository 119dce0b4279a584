//! Sample host for the logging library.
//!
//! Loads settings, initialises the manager from the persisted flags, applies
//! one command and prints the resulting state.

use std::{error::Error, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use arborlog::{
    init_tracing, CrashReporter, LoggingManager, LoggingSettings, Priority, ZipOutcome,
};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "arborlog")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Toggle and exercise runtime-switchable log sinks", long_about = None)]
struct Cli {
    /// Directory holding `logs/`, `logs.zip` and the preference file
    #[arg(long, env = "ARBORLOG_CACHE_DIR")]
    cache_dir: Option<PathBuf>,
    /// Plug in a crash reporter that prints to stderr
    #[arg(long)]
    crash_reporter: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the persisted flags and the active sinks
    Status,
    /// Turn the console sink on or off
    Debug { state: Toggle },
    /// Turn the file sink on or off
    File { state: Toggle },
    /// Record that the user made an explicit logging choice
    Explicit,
    /// Send one record to every active sink
    Log {
        message: String,
        #[arg(long, default_value = "arborlog-cli")]
        tag: String,
        /// Numeric priority, 2 (verbose) to 7 (assert)
        #[arg(long, default_value_t = 4)]
        priority: u8,
    },
    /// Archive every session file into `logs.zip`
    Zip,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl From<Toggle> for bool {
    fn from(toggle: Toggle) -> Self {
        matches!(toggle, Toggle::On)
    }
}

/// Crash reporter stand-in that echoes every call to stderr.
struct StderrCrashReporter;

impl CrashReporter for StderrCrashReporter {
    fn log_exception(
        &self,
        error: &(dyn Error + 'static),
    ) {
        eprintln!("[crash] exception: {error}");
    }

    fn log_line(
        &self,
        priority: Priority,
        tag: &str,
        message: &str,
    ) {
        eprintln!("[crash] {}/{tag}: {message}", priority.letter());
    }

    fn set_flag(
        &self,
        key: &str,
        value: bool,
    ) {
        eprintln!("[crash] flag {key}={value}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = LoggingSettings::load().context("Failed to load logging settings")?;
    if let Some(dir) = cli.cache_dir {
        settings.cache_dir = dir;
    }

    let manager = LoggingManager::from_settings(&settings)
        .with_context(|| format!("Failed to open {}", settings.cache_dir.display()))?;
    init_tracing(manager.facade().clone(), &settings)?;

    let reporter: Option<Arc<dyn CrashReporter>> = if cli.crash_reporter {
        Some(Arc::new(StderrCrashReporter))
    } else {
        None
    };
    manager.initialize(settings.build_defaults(), reporter.clone());

    match cli.command {
        Command::Status => {}
        Command::Debug { state } => {
            manager.record_first_explicit_user_choice()?;
            manager.set_debug_logging(state.into())?;
        }
        Command::File { state } => {
            manager.record_first_explicit_user_choice()?;
            manager.set_file_logging(state.into(), reporter)?;
        }
        Command::Explicit => manager.record_first_explicit_user_choice()?,
        Command::Log {
            message,
            tag,
            priority,
        } => {
            let priority = Priority::try_from(priority)
                .map_err(|_| anyhow::anyhow!("Priority must be between 2 and 7, got {priority}"))?;
            manager.log(priority, &tag, &message, None);
        }
        Command::Zip => match manager.zip_logs().outcome().await? {
            ZipOutcome::Archived { path, entries } => {
                println!("archived {entries} file(s) into {}", path.display());
            }
            ZipOutcome::NothingToZip => println!("nothing to zip"),
        },
    }

    let prefs = manager.preferences();
    println!("debug logging:   {}", prefs.debug_enabled);
    println!("file logging:    {}", prefs.file_enabled);
    println!("explicit choice: {}", prefs.user_made_explicit_choice);
    let sinks: Vec<String> = manager.active_sinks().iter().map(ToString::to_string).collect();
    println!("active sinks:    [{}]", sinks.join(", "));
    println!("log directory:   {}", manager.worker().layout().log_dir().display());

    // Dropping the manager drains the worker queue before exit.
    drop(manager);
    Ok(())
}
