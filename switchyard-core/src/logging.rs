//! Logging for the Switchyard kernel
//!
//! Every component logs through the `tracing` macros re-exported here.
//! Installing a subscriber is left to the embedding application;
//! [`LogConfig`] is a convenience for the common setups. Defaults to JSON
//! output to STDOUT.
//!
//! # Examples
//!
//! ```no_run
//! use switchyard_core::logging::*;
//!
//! LogConfig::new()
//!     .level(LogLevel::Debug)
//!     .format(LogFormat::Pretty)
//!     .output(LogOutput::Stderr)
//!     .with_thread_ids(true)
//!     .init()
//!     .expect("logging already initialized");
//!
//! info!("Kernel booted");
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - overrides the configured level with a full filter directive
//! - `SWITCHYARD_DEBUG=1` - [`LogConfig::from_env`] starts at debug level
//! - `SWITCHYARD_LOG_FORMAT=json|pretty|compact|plain` - output format

use crate::Error;
use crate::config::is_truthy;
use std::env;
use std::io;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
};

pub use tracing::{debug, error, info, trace, warn};

pub const ENV_LOG_FORMAT: &str = "SWITCHYARD_LOG_FORMAT";

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }

    /// Directive string for EnvFilter
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured, machine-readable (default)
    Json,
    Plain,
    /// Multi-line, for development
    Pretty,
    Compact,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "plain" => Some(LogFormat::Plain),
            "pretty" => Some(LogFormat::Pretty),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }
}

/// Output destination for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    pub timestamps: bool,
    pub thread_ids: bool,
    /// Include target (module path)
    pub targets: bool,
    pub file_line: bool,
    /// Log span close events
    pub spans: bool,
    /// ANSI colors; ignored for JSON
    pub colors: bool,
    /// Custom filter directive; overrides `level` and `RUST_LOG`
    pub env_filter: Option<String>,
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults adjusted by `SWITCHYARD_DEBUG` and `SWITCHYARD_LOG_FORMAT`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if env::var(crate::config::ENV_DEBUG).is_ok_and(|v| is_truthy(&v)) {
            config.level = LogLevel::Debug;
        }
        if let Some(format) = env::var(ENV_LOG_FORMAT).ok().and_then(|v| LogFormat::parse(&v)) {
            config.format = format;
        }
        config
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
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

    pub fn with_timestamps(mut self, enable: bool) -> Self {
        self.timestamps = enable;
        self
    }

    pub fn with_thread_ids(mut self, enable: bool) -> Self {
        self.thread_ids = enable;
        self
    }

    pub fn with_targets(mut self, enable: bool) -> Self {
        self.targets = enable;
        self
    }

    pub fn with_file_line(mut self, enable: bool) -> Self {
        self.file_line = enable;
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.spans = enable;
        self
    }

    pub fn with_colors(mut self, enable: bool) -> Self {
        self.colors = enable;
        self
    }

    /// Set a filter directive such as `"switchyard_core=debug,my_app=info"`
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// The filter this configuration installs
    pub fn build_filter(&self) -> Result<EnvFilter, Error> {
        match &self.env_filter {
            Some(directive) => EnvFilter::try_new(directive)
                .map_err(|e| Error::Config(format!("invalid log filter `{}`: {}", directive, e))),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))),
        }
    }

    /// Install the global subscriber.
    ///
    /// Fails with [`Error::Config`] if a global subscriber is already set.
    pub fn init(self) -> Result<(), Error> {
        let filter = self.build_filter()?;
        let layer = match self.output {
            LogOutput::Stdout => self.layer(io::stdout),
            LogOutput::Stderr => self.layer(io::stderr),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .try_init()
            .map_err(|e| Error::Config(format!("failed to install log subscriber: {}", e)))
    }

    fn layer<W>(&self, writer: W) -> BoxedLayer
    where
        W: for<'a> fmt::MakeWriter<'a> + Send + Sync + 'static,
    {
        let span_events = if self.spans {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let base = fmt::layer()
            .with_writer(writer)
            .with_target(self.targets)
            .with_thread_ids(self.thread_ids)
            .with_span_events(span_events);

        match (self.format, self.timestamps) {
            (LogFormat::Json, true) => base
                .json()
                .with_current_span(self.spans)
                .with_file(self.file_line)
                .with_line_number(self.file_line)
                .boxed(),
            (LogFormat::Json, false) => base
                .json()
                .with_current_span(self.spans)
                .with_file(self.file_line)
                .with_line_number(self.file_line)
                .without_time()
                .boxed(),
            (LogFormat::Pretty, true) => base
                .pretty()
                .with_ansi(self.colors)
                .with_file(self.file_line)
                .with_line_number(self.file_line)
                .boxed(),
            (LogFormat::Pretty, false) => base
                .pretty()
                .with_ansi(self.colors)
                .with_file(self.file_line)
                .with_line_number(self.file_line)
                .without_time()
                .boxed(),
            // Compact never shows file/line
            (LogFormat::Compact, true) => base.compact().with_ansi(self.colors).boxed(),
            (LogFormat::Compact, false) => {
                base.compact().with_ansi(self.colors).without_time().boxed()
            }
            (LogFormat::Plain, true) => base
                .with_ansi(self.colors)
                .with_file(self.file_line)
                .with_line_number(self.file_line)
                .boxed(),
            (LogFormat::Plain, false) => base
                .with_ansi(self.colors)
                .with_file(self.file_line)
                .with_line_number(self.file_line)
                .without_time()
                .boxed(),
        }
    }
}

impl Default for LogConfig {
    /// JSON to STDOUT at INFO level
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            output: LogOutput::Stdout,
            timestamps: true,
            thread_ids: false,
            targets: true,
            file_line: false,
            spans: false,
            colors: false,
            env_filter: None,
        }
    }
}
