//! Plain-text event format for file logs: each line carries the span path it was emitted in,
//! e.g. `resolve_by_ids>fetch_chunk`, so chunk and page progress can be read per resolution.

use std::fmt;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// Output: `TIMESTAMP LEVEL target [root>leaf]: fields`; the bracket is omitted outside spans.
pub struct SpanPathFormat {
    timer: SystemTime,
}

impl SpanPathFormat {
    pub fn new() -> Self {
        Self { timer: SystemTime }
    }
}

impl Default for SpanPathFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, N> FormatEvent<S, N> for SpanPathFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        self.timer.format_time(&mut writer)?;
        let meta = event.metadata();
        write!(writer, " {} {}", meta.level(), meta.target())?;

        if let Some(scope) = ctx.event_scope() {
            let names: Vec<&str> = scope.from_root().map(|span| span.name()).collect();
            if !names.is_empty() {
                write!(writer, " [{}]", names.join(">"))?;
            }
        }
        write!(writer, ": ")?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
