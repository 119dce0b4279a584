use std::{error::Error, fmt, fmt::Write, sync::Arc};

use tracing::{
    field::{Field, Visit},
    Event, Subscriber,
};
use tracing_subscriber::{layer::Context, Layer};

use super::{is_internal_target, LogFacade, LogRecord, Priority};

/// Routes `tracing` events into a [`LogFacade`].
///
/// The record tag is the event's `tag` field when present, otherwise its
/// target. An `error` field becomes the record's error; every other field is
/// appended to the message as `name=value`. Events emitted by this crate are
/// skipped so sink diagnostics never loop back into the sinks.
pub struct FacadeLayer {
    facade: Arc<LogFacade>,
}

impl FacadeLayer {
    pub fn new(facade: Arc<LogFacade>) -> Self {
        Self { facade }
    }
}

/// Error carried by an event field, flattened to its description.
#[derive(Debug)]
struct EventError(String);

impl fmt::Display for EventError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for EventError {}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    fields: String,
    tag: Option<String>,
    error: Option<String>,
}

impl RecordVisitor {
    fn push_field(
        &mut self,
        name: &str,
        value: fmt::Arguments<'_>,
    ) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        write!(self.fields, "{name}={value}").ok();
    }

    fn into_message(self) -> (String, Option<String>, Option<String>) {
        let message = match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        };
        (message, self.tag, self.error)
    }
}

impl Visit for RecordVisitor {
    fn record_str(
        &mut self,
        field: &Field,
        value: &str,
    ) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "tag" => self.tag = Some(value.to_string()),
            "error" => self.error = Some(value.to_string()),
            name => self.push_field(name, format_args!("{value}")),
        }
    }

    fn record_error(
        &mut self,
        field: &Field,
        value: &(dyn Error + 'static),
    ) {
        match field.name() {
            "error" => self.error = Some(value.to_string()),
            name => self.push_field(name, format_args!("{value}")),
        }
    }

    fn record_debug(
        &mut self,
        field: &Field,
        value: &dyn fmt::Debug,
    ) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "tag" => self.tag = Some(format!("{value:?}")),
            "error" => self.error = Some(format!("{value:?}")),
            name => self.push_field(name, format_args!("{value:?}")),
        }
    }
}

impl<S> Layer<S> for FacadeLayer
where
    S: Subscriber,
{
    fn on_event(
        &self,
        event: &Event<'_>,
        _ctx: Context<'_, S>,
    ) {
        let metadata = event.metadata();
        if is_internal_target(metadata.target()) {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        let (message, tag, error) = visitor.into_message();

        let error = error.map(EventError);
        let tag = tag.as_deref().unwrap_or(metadata.target());

        let mut record = LogRecord::new(Priority::from(*metadata.level()), tag, &message);
        record.line = metadata.line();
        if let Some(error) = &error {
            record = record.with_error(error);
        }

        self.facade.dispatch(&record);
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
