//! Line layout: `15:04:05.000 file.rs:42 >INFO - message key=value`.

use std::fmt;
use std::path::Path;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Event formatter producing one compact line per event.
///
/// Local wall-clock time with milliseconds, the source file name and line,
/// the level and then the message with its fields. With ANSI enabled the
/// level is colored.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
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
        let meta = event.metadata();
        write!(writer, "{} ", chrono::Local::now().format("%H:%M:%S%.3f"))?;

        if let Some(file) = meta.file() {
            let name = Path::new(file)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(file);
            match meta.line() {
                Some(line) => write!(writer, "{name}:{line} ")?,
                None => write!(writer, "{name} ")?,
            }
        }

        if writer.has_ansi_escapes() {
            write!(writer, "\x1b[{}m>{}\x1b[0m - ", color(meta.level()), meta.level())?;
        } else {
            write!(writer, ">{} - ", meta.level())?;
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn color(level: &tracing::Level) -> &'static str {
    match *level {
        tracing::Level::ERROR => "31",
        tracing::Level::WARN => "33",
        tracing::Level::INFO => "32",
        tracing::Level::DEBUG => "36",
        _ => "35",
    }
}
