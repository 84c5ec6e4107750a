// crates/logging/src/formatter.rs
use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, format::Writer};
use tracing_subscriber::registry::LookupSpan;

use crate::{LogKind, now_string};

/// Collects an event's message, its `kind` field and any other fields.
#[derive(Default)]
pub(crate) struct MessageVisitor {
    pub(crate) msg: String,
    pub(crate) kind: Option<LogKind>,
    fields: Vec<(&'static str, String)>,
}

impl MessageVisitor {
    fn record(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => {
                if !self.msg.is_empty() {
                    self.msg.push(' ');
                }
                self.msg.push_str(&value);
            }
            "kind" => self.kind = value.parse().ok(),
            name => self.fields.push((name, value)),
        }
    }

    /// The message followed by `name=value` pairs for the remaining fields.
    pub(crate) fn line(&self) -> String {
        let mut out = self.msg.clone();
        for (name, value) in &self.fields {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(name);
            out.push('=');
            out.push_str(value);
        }
        out
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record(field, format!("{value:?}"));
    }
}

/// Formats events as `KIND: message` for lifecycle events and
/// `level: message` for warnings and errors.
pub struct KindFormatter {
    timestamps: bool,
}

impl KindFormatter {
    pub fn new(timestamps: bool) -> Self {
        Self { timestamps }
    }
}

impl<S, N> FormatEvent<S, N> for KindFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if self.timestamps {
            write!(writer, "[{}] ", now_string())?;
        }
        let level = *event.metadata().level();
        match visitor.kind {
            Some(kind) => write!(writer, "{kind}: ")?,
            None if level == Level::ERROR => writer.write_str("error: ")?,
            None if level == Level::WARN => writer.write_str("warning: ")?,
            None => {}
        }
        writer.write_str(&visitor.line())?;
        writer.write_char('\n')
    }
}
