use tracing_subscriber::EnvFilter;

/// Directive used when neither `RUST_LOG` nor the configured filter parses.
pub const FALLBACK_DIRECTIVE: &str = "info";

/// Builds the global event filter.
///
/// `RUST_LOG` wins when set; otherwise `directive` (from
/// [`LoggingSettings::filter`](crate::LoggingSettings)) is used. An invalid
/// directive falls back to [`FALLBACK_DIRECTIVE`] with a note on stderr,
/// since no subscriber exists yet to report it through.
pub fn build_filter(directive: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    match EnvFilter::try_new(directive) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!(
                "Invalid log filter directive ('{directive}'): {e}; falling back to '{FALLBACK_DIRECTIVE}'"
            );
            EnvFilter::new(FALLBACK_DIRECTIVE)
        }
    }
}
