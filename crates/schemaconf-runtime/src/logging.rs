//! Logging setup for applications built on schemaconf.
//!
//! The pipeline itself only emits `tracing` events. This module installs a
//! `tracing-subscriber` for them, driven by a [`LoggingConfig`] that can be
//! loaded through the pipeline like any other schema type.
//!
//! # Configuration-Based Initialization
//!
//! ```rust,ignore
//! use schemaconf_runtime::logging::{self, LoggingConfig};
//!
//! #[derive(Deserialize, Default, Validate)]
//! struct AppConfig {
//!     logging: LoggingConfig,
//! }
//!
//! let config: AppConfig = loader.load_into()?;
//! logging::init_from_config(&config.logging);
//! ```
//!
//! # Manual Initialization
//!
//! ```rust,ignore
//! use schemaconf_runtime::logging::{LoggingBuilder, SpanEvents};
//!
//! LoggingBuilder::new()
//!     .directive("schemaconf_runtime=debug")
//!     .span_events(SpanEvents::LIFECYCLE)
//!     .init();
//! ```

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt as std_fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use schemaconf_core::validate::rules;
use schemaconf_core::{FieldPath, Report, Validate};
use schemaconf_macros::Validate;
use serde::{Deserialize, Serialize};
use tracing::warn;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

// =============================================================================
// Configuration Schema
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std_fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std_fmt::Formatter<'_>) -> std_fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level `{other}`")),
        }
    }
}

/// Event line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Where events are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Log file rotation period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

macro_rules! impl_leaf_validate {
    ($($ty:ty),*) => {
        $(
            impl Validate for $ty {
                fn validate_into(&self, _path: &FieldPath, _report: &mut Report) {}
            }
        )*
    };
}

impl_leaf_validate!(LogLevel, LogFormat, LogOutput, LogRotation);

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging section of an application configuration.
///
/// Every field has a default, so an empty mapping is a valid
/// configuration. File output requires `file_path`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    pub file_path: Option<PathBuf>,
    pub rotation: LogRotation,
    /// Include thread ids in each event.
    pub thread_ids: bool,
    /// Include the source file and line in each event.
    pub file_location: bool,
    pub span_events: SpanEventConfig,
    /// Per-target levels, e.g. `schemaconf_runtime: debug`.
    pub filters: BTreeMap<String, LogLevel>,
}

impl Validate for LoggingConfig {
    fn validate_into(&self, path: &FieldPath, report: &mut Report) {
        if self.output == LogOutput::File {
            rules::required(&self.file_path, &path.field("file_path"), report);
        }
        for target in self.filters.keys() {
            if report.is_done() {
                return;
            }
            if target.is_empty() || target.contains(char::is_whitespace) {
                report.push(
                    &path.field("filters").key(target.as_str()),
                    "logging.filter_target",
                    "filter target must be a non-empty module path",
                );
            }
        }
        self.span_events
            .validate_into(&path.field("span_events"), report);
    }
}

// =============================================================================
// Span Events
// =============================================================================

/// Span event selection for the fmt layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanEvents {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

impl SpanEvents {
    /// No span events will be logged.
    pub const NONE: Self = Self {
        new: false,
        enter: false,
        exit: false,
        close: false,
    };

    /// Log span creation and close events.
    pub const LIFECYCLE: Self = Self {
        new: true,
        enter: false,
        exit: false,
        close: true,
    };

    /// Log all span events.
    pub const FULL: Self = Self {
        new: true,
        enter: true,
        exit: true,
        close: true,
    };

    fn to_fmt_span(self) -> fmt::format::FmtSpan {
        let mut span = fmt::format::FmtSpan::NONE;
        if self.new {
            span |= fmt::format::FmtSpan::NEW;
        }
        if self.enter {
            span |= fmt::format::FmtSpan::ENTER;
        }
        if self.exit {
            span |= fmt::format::FmtSpan::EXIT;
        }
        if self.close {
            span |= fmt::format::FmtSpan::CLOSE;
        }
        span
    }
}

impl From<&SpanEventConfig> for SpanEvents {
    fn from(config: &SpanEventConfig) -> Self {
        Self {
            new: config.new,
            enter: config.enter,
            exit: config.exit,
            close: config.close,
        }
    }
}

// =============================================================================
// Initialization
// =============================================================================

/// Installs the global subscriber described by `config`.
///
/// Does nothing if a subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// Builder for the global `tracing` subscriber.
#[derive(Debug)]
pub struct LoggingBuilder {
    directives: Vec<String>,
    level: Option<tracing::Level>,
    span_events: SpanEvents,
    format: LogFormat,
    output: LogOutput,
    with_target: bool,
    with_thread_ids: bool,
    with_file: bool,
    with_line_number: bool,
    file_path: Option<PathBuf>,
    rotation: LogRotation,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self {
            directives: Vec::new(),
            level: None,
            span_events: SpanEvents::NONE,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            with_target: true,
            with_thread_ids: false,
            with_file: false,
            with_line_number: false,
            file_path: None,
            rotation: LogRotation::Never,
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::new();

        builder.level = Some(config.level.to_tracing_level());
        builder.format = config.format;
        builder.output = config.output;
        builder.span_events = SpanEvents::from(&config.span_events);

        builder.with_thread_ids = config.thread_ids;
        builder.with_file = config.file_location;
        builder.with_line_number = config.file_location;

        builder.file_path.clone_from(&config.file_path);
        builder.rotation = config.rotation;

        for (target, level) in &config.filters {
            builder.directives.push(format!("{target}={level}"));
        }

        builder
    }

    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Adds a filter directive such as `schemaconf_runtime=trace`.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    pub fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.with_thread_ids = enabled;
        self
    }

    pub fn with_file(mut self, enabled: bool) -> Self {
        self.with_file = enabled;
        self
    }

    pub fn with_line_number(mut self, enabled: bool) -> Self {
        self.with_line_number = enabled;
        self
    }

    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn rotation(mut self, rotation: LogRotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// `RUST_LOG` wins over the configured level; directives are added on
    /// top of either.
    fn build_filter(&self) -> EnvFilter {
        let base_level = self.level.unwrap_or(tracing::Level::INFO);
        let base_filter = base_level.to_string().to_lowercase();

        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&base_filter));

        for directive in &self.directives {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }

        filter
    }

    fn file_appender(&self, path: &Path) -> RollingFileAppender {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let file = path
            .file_name()
            .unwrap_or_else(|| OsStr::new("schemaconf.log"));
        match self.rotation {
            LogRotation::Never => rolling::never(dir, file),
            LogRotation::Hourly => rolling::hourly(dir, file),
            LogRotation::Daily => rolling::daily(dir, file),
        }
    }

    /// Installs the subscriber, ignoring failure.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.build_filter();
        let span_events = self.span_events.to_fmt_span();

        macro_rules! configure_layer {
            ($layer:expr) => {
                $layer
                    .with_span_events(span_events.clone())
                    .with_target(self.with_target)
                    .with_thread_ids(self.with_thread_ids)
                    .with_file(self.with_file)
                    .with_line_number(self.with_line_number)
            };
        }

        macro_rules! init_with_writer {
            ($writer:expr) => {
                match self.format {
                    #[cfg(feature = "json-log")]
                    LogFormat::Json => {
                        let layer = fmt::layer()
                            .json()
                            .with_span_events(span_events.clone())
                            .with_writer($writer);
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    LogFormat::Compact => {
                        let layer = configure_layer!(fmt::layer().compact().with_writer($writer));
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    LogFormat::Pretty => {
                        let layer = configure_layer!(fmt::layer().pretty().with_writer($writer));
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                    #[allow(unreachable_patterns)]
                    LogFormat::Full | LogFormat::Json => {
                        let layer = configure_layer!(fmt::layer().with_writer($writer));
                        tracing_subscriber::registry()
                            .with(layer)
                            .with(filter)
                            .try_init()
                    }
                }
            };
        }

        match (self.output, self.file_path.as_deref()) {
            (LogOutput::Stdout, _) => init_with_writer!(std::io::stdout),
            (LogOutput::Stderr, _) => init_with_writer!(std::io::stderr),
            (LogOutput::File, Some(path)) => {
                let appender = self.file_appender(path);
                init_with_writer!(appender)
            }
            (LogOutput::File, None) => {
                let result = init_with_writer!(std::io::stdout);
                warn!("File output requested but no file path configured, logging to stdout");
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_mapping() {
        let config: LoggingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LoggingConfig::default());
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json() {
        let config: LoggingConfig = serde_json::from_str(
            r#"{
                "level": "debug",
                "format": "pretty",
                "output": "file",
                "file_path": "/tmp/app.log",
                "rotation": "daily",
                "span_events": {"new": true},
                "filters": {"schemaconf_runtime": "trace"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.rotation, LogRotation::Daily);
        assert!(config.span_events.new);
        assert!(!config.span_events.close);
        assert!(config.validate().is_ok());

        let builder = LoggingBuilder::from_config(&config);
        assert_eq!(builder.directives, ["schemaconf_runtime=trace"]);
        assert_eq!(builder.level, Some(tracing::Level::DEBUG));
        assert_eq!(builder.span_events, SpanEvents { new: true, ..SpanEvents::NONE });
    }

    #[test]
    fn test_file_output_requires_path() {
        let config = LoggingConfig {
            output: LogOutput::File,
            ..Default::default()
        };

        let err = config.validate().unwrap_err();
        let violation = err.first().unwrap();
        assert_eq!(violation.field_path(), "file_path");
        assert_eq!(violation.constraint_id(), "required");
    }

    #[test]
    fn test_blank_filter_target_is_rejected() {
        let mut config = LoggingConfig::default();
        config.filters.insert("my app".to_string(), LogLevel::Debug);

        let err = config.validate().unwrap_err();
        assert_eq!(err.first().unwrap().field_path(), r#"filters["my app"]"#);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!(LogLevel::Error.to_string(), "error");
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_span_events_to_fmt_span() {
        assert_eq!(SpanEvents::NONE.to_fmt_span(), fmt::format::FmtSpan::NONE);
        assert_eq!(
            SpanEvents::LIFECYCLE.to_fmt_span(),
            fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE
        );
        assert_eq!(SpanEvents::FULL.to_fmt_span(), fmt::format::FmtSpan::FULL);
    }
}
