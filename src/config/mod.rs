pub mod settings;

pub use settings::LoggingSettings;
