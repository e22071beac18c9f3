use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Crate target prefix used for per-crate level directives.
pub const TARGET_PREFIX: &str = "ai_llm_service";

/// Targets of the workspace crates whose events are rendered by [`layer`].
pub const APP_TARGETS: &[&str] = &[
    "health_assistant_backend",
    "api",
    "contextor",
    "directory_store",
    TARGET_PREFIX,
];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Build a formatting layer that renders ONLY events emitted by workspace crates.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format
/// - `file:line` and target (module path)
/// - Span close events (duration at the end of spans)
/// - ANSI colors only when stdout is a terminal
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();

    let only_app = filter::filter_fn(|meta| is_app_target(meta.target()));

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(only_app)
}

fn is_app_target(target: &str) -> bool {
    APP_TARGETS.iter().any(|p| {
        target == *p || target.strip_prefix(p).is_some_and(|rest| rest.starts_with("::"))
    })
}

/// Helper to build a level directive for **this** library only.
pub fn level_directive(level: Level) -> Directive {
    let s = format!("{TARGET_PREFIX}={}", level.as_str().to_lowercase());
    Directive::from_str(&s).unwrap_or_else(|_| LevelFilter::INFO.into())
}

/// EnvFilter from `RUST_LOG` or `default`, plus a per-crate level for this library.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    base.add_directive(level_directive(level))
}

/// Installs the global subscriber: env filter + the workspace layer.
///
/// # Errors
/// Fails if a global subscriber was already set.
pub fn init(default: &str, llm_level: Level) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter_with_level(default, llm_level))
        .with(layer())
        .try_init()
}
