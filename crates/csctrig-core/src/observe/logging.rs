//! # Structured Logging
//!
//! Trigger stages emit `tracing` events: `info!` when a catalog or LUT is
//! built, `debug!` per chamber with its candidate count, `trace!` per
//! pattern match, and `warn!` when a chamber is skipped. This module
//! installs the subscriber that renders them.
//!
//! `level` applies to the csctrig crates only; dependencies stay at warn
//! unless `filter` or `RUST_LOG` says otherwise.
//!
//! ```rust,ignore
//! use csctrig_core::observe::{init_logging, LogConfig};
//!
//! // Follow one noisy chamber match by match
//! init_logging(&LogConfig::scan_trace());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt as stdfmt;
use std::str::FromStr;
use tracing_subscriber::{fmt, prelude::*, registry::LookupSpan, EnvFilter, Layer};

use crate::error::ConfigError;

/// Crates whose events the level applies to; everything else logs at warn.
const TRIGGER_TARGETS: [&str; 2] = ["csctrig_core", "csctrig_sim"];

/// Modules that emit one event per pattern match or LUT record.
const SCAN_TARGETS: [&str; 3] = [
    "csctrig_core::extractor",
    "csctrig_core::alct::extractor",
    "csctrig_core::lut",
];

/// Verbosity of the trigger crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Every pattern match
    Trace,
    /// Per-chamber summaries
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl stdfmt::Display for LogLevel {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ConfigError::ValidationError(format!(
                "unknown log level '{}'",
                other
            ))),
        }
    }
}

/// How events are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Machine-readable, one JSON object per event
    Json,
    /// Multi-line, coloured
    Pretty,
    /// One line per event
    #[default]
    Compact,
}

/// The `logging` section of the trigger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level for the trigger crates
    pub level: LogLevel,
    pub format: LogFormat,
    pub timestamps: bool,
    /// Attach file:line to each event
    pub source_location: bool,
    /// Attach the event target (module path)
    pub targets: bool,
    pub thread_ids: bool,
    pub thread_names: bool,
    /// Emit span enter/exit events
    pub span_events: bool,
    /// Raw directive string, e.g. "csctrig_core::extractor=trace". Wins
    /// over both `RUST_LOG` and `level`.
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            timestamps: true,
            source_location: false,
            targets: true,
            thread_ids: false,
            thread_names: false,
            span_events: false,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Per-chamber summaries on a terminal.
    pub fn interactive() -> Self {
        Self {
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
            source_location: true,
            ..Default::default()
        }
    }

    /// JSON lines for batch processing, with the rayon worker id on each
    /// event.
    pub fn batch() -> Self {
        Self {
            format: LogFormat::Json,
            thread_ids: true,
            ..Default::default()
        }
    }

    /// Every match from the cathode and anode scans and every LUT record,
    /// the rest of the crates at debug.
    pub fn scan_trace() -> Self {
        let directives: Vec<String> = TRIGGER_TARGETS
            .iter()
            .map(|t| format!("{t}=debug"))
            .chain(SCAN_TARGETS.iter().map(|t| format!("{t}=trace")))
            .collect();
        Self {
            level: LogLevel::Trace,
            thread_names: true,
            filter: Some(directives.join(",")),
            ..Default::default()
        }
    }

    /// Errors only.
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            timestamps: false,
            targets: false,
            ..Default::default()
        }
    }

    /// Directive applying `level` to the trigger crates and warn elsewhere.
    pub fn default_directives(&self) -> String {
        let mut directives = vec!["warn".to_string()];
        directives.extend(TRIGGER_TARGETS.iter().map(|t| format!("{t}={}", self.level)));
        directives.join(",")
    }

    /// Filter built from `filter`, else `RUST_LOG`, else `level`.
    pub fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.default_directives());
        match &self.filter {
            Some(custom) => EnvFilter::try_new(custom).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }
}

fn format_layer<S>(config: &LogConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let span_events = if config.span_events {
        fmt::format::FmtSpan::FULL
    } else {
        fmt::format::FmtSpan::NONE
    };
    let base = fmt::layer()
        .with_target(config.targets)
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_thread_ids(config.thread_ids)
        .with_thread_names(config.thread_names)
        .with_span_events(span_events);

    match (config.format, config.timestamps) {
        (LogFormat::Json, true) => base.json().boxed(),
        (LogFormat::Json, false) => base.json().without_time().boxed(),
        (LogFormat::Pretty, true) => base.pretty().boxed(),
        (LogFormat::Pretty, false) => base.pretty().without_time().boxed(),
        (LogFormat::Compact, true) => base.compact().boxed(),
        (LogFormat::Compact, false) => base.compact().without_time().boxed(),
    }
}

/// Install the global subscriber, failing if one is already set.
pub fn try_init_logging(config: &LogConfig) -> Result<(), ConfigError> {
    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(format_layer(config))
        .try_init()
        .map_err(|e| ConfigError::ValidationError(format!("logging already initialised: {}", e)))
}

/// Install the global subscriber.
///
/// Call once at startup; later calls are ignored.
pub fn init_logging(config: &LogConfig) {
    let _ = try_init_logging(config);
}
