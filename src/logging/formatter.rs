use std::error::Error;

use super::Priority;

/// Formats one log call as a single comma-separated line:
/// `<priority>, <tag>, <message>[, <error>]`.
///
/// The priority is written as its numeric level and the error as its
/// `Display` text.
pub fn format(
    priority: Priority,
    tag: &str,
    message: &str,
    error: Option<&(dyn Error + 'static)>,
) -> String {
    match error {
        Some(err) => format!("{priority}, {tag}, {message}, {err}"),
        None => format!("{priority}, {tag}, {message}"),
    }
}
