use std::io::Write as _;

use nu_ansi_term::Color::{Blue, Magenta, Red, Yellow};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{
        self,
        format::{FmtSpan, Writer},
        FmtContext, FormatEvent, FormatFields, MakeWriter,
    },
    registry::LookupSpan,
};

use crate::{cli::Args, utils::Colored};

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }
}

pub struct CustomFormatter;

impl<S, N> FormatEvent<S, N> for CustomFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        match *event.metadata().level() {
            Level::TRACE => write!(writer, "{} ", Colored(Magenta, "[TRACE]")),
            Level::DEBUG => write!(writer, "{} ", Colored(Blue, "[DEBUG]")),
            Level::INFO => write!(writer, ""),
            Level::WARN => write!(writer, "{} ", Colored(Yellow, "[WARN]")),
            Level::ERROR => write!(writer, "{} ", Colored(Red, "[ERROR]")),
        }?;

        if let Some(message) = visitor.message {
            writeln!(writer, "{message}")
        } else {
            writeln!(writer)
        }
    }
}

/// Sends INFO to stdout and every other level to stderr, so command output
/// can be piped without diagnostics mixed in.
struct StdioWriter;

impl<'a> MakeWriter<'a> for StdioWriter {
    type Writer = Box<dyn std::io::Write>;

    fn make_writer(&'a self) -> Self::Writer {
        Box::new(std::io::stdout())
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        if meta.level() == &Level::INFO {
            Box::new(std::io::stdout())
        } else {
            Box::new(std::io::stderr())
        }
    }
}

fn filter_level(args: &Args, configured: &str) -> String {
    if args.quiet {
        Level::ERROR.to_string()
    } else if args.verbose >= 2 {
        Level::TRACE.to_string()
    } else if args.verbose == 1 {
        Level::DEBUG.to_string()
    } else {
        configured.to_string()
    }
}

/// Installs the global subscriber. `configured` is the config file's log
/// level, used when no verbosity flag is given.
pub fn setup_logging(args: &Args, configured: &str) {
    let filter = filter_level(args, configured);

    let builder = fmt::Subscriber::builder()
        .with_env_filter(format!("stowage={filter}"))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(StdioWriter)
        .compact()
        .without_time();

    let subscriber: Box<dyn Subscriber + Send + Sync> = if args.json {
        Box::new(builder.json().flatten_event(true).finish())
    } else {
        Box::new(builder.event_format(CustomFormatter).finish())
    };

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        let _ = writeln!(std::io::stderr(), "tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_flags_override_configured_level() {
        let args = Args::parse_from(["stowage", "recent", "general"]);
        assert_eq!(filter_level(&args, "warn"), "warn");

        let args = Args::parse_from(["stowage", "-vv", "recent", "general"]);
        assert_eq!(filter_level(&args, "warn"), "TRACE");

        let args = Args::parse_from(["stowage", "-q", "-v", "recent", "general"]);
        assert_eq!(filter_level(&args, "debug"), "ERROR");
    }
}
