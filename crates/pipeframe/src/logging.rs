use clap::ValueEnum;
use pipeframe_transport::diagnostics::WIRE_TARGET;
use pipeframe_transport::DiagnosticsMode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Per-target filter for the CLI subscriber.
///
/// Wire events are DEBUG level. When `PIPEFRAME_DEBUG` or `PIPEFRAME_DEBUGP`
/// is set, [`WIRE_TARGET`] is let through at DEBUG even if `--log-level` is
/// higher; everything else follows `--log-level`.
pub fn log_filter(level: LogLevel, diagnostics: DiagnosticsMode) -> Targets {
    let filter = Targets::new().with_default(level.as_filter());
    if diagnostics.is_enabled() {
        filter.with_target(WIRE_TARGET, level.as_filter().max(LevelFilter::DEBUG))
    } else {
        filter
    }
}

/// Install the stderr subscriber. Stdout carries frames or messages, so
/// logs never go there.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let filter = log_filter(level, DiagnosticsMode::from_env());
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    let _ = match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(layer.json().with_filter(filter))
            .try_init(),
    };
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn wire_target_passes_when_diagnostics_enabled() {
        let filter = log_filter(LogLevel::Info, DiagnosticsMode::Method);
        assert!(filter.would_enable(WIRE_TARGET, &Level::DEBUG));
        assert!(!filter.would_enable("pipeframe_transport::read_loop", &Level::DEBUG));
        assert!(filter.would_enable("pipeframe_transport::read_loop", &Level::INFO));
    }

    #[test]
    fn wire_target_follows_level_when_diagnostics_off() {
        let filter = log_filter(LogLevel::Warn, DiagnosticsMode::Off);
        assert!(!filter.would_enable(WIRE_TARGET, &Level::DEBUG));
        assert!(filter.would_enable(WIRE_TARGET, &Level::WARN));
    }

    #[test]
    fn trace_level_is_not_lowered_for_wire_target() {
        let filter = log_filter(LogLevel::Trace, DiagnosticsMode::Full);
        assert!(filter.would_enable(WIRE_TARGET, &Level::TRACE));
    }
}
