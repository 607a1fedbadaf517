//! Tracing setup: a rotating file log plus a level-filtered stderr log.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;

use crate::args::GlobalArgs;

/// Initialize the dual-layer tracing subscriber.
///
/// - File layer: daily-rotated log under the system temp directory,
///   filtered by `RUST_LOG` (default "debug").
/// - Stderr layer: level follows `--quiet`/`--verbose`.
///
/// Returns a `WorkerGuard` that must stay alive for file logging to flush.
pub fn init_tracing(args: &GlobalArgs) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(std::env::temp_dir(), "truss.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter);

    let stderr_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_filter(EnvFilter::new(stderr_level));

    Registry::default().with(file_layer).with(stderr_layer).init();

    guard
}
