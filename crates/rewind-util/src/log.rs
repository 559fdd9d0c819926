//! Logging setup using tracing.
//!
//! rewind is a library, so it only emits events. Hosts and test suites call
//! [`init`] to install a subscriber that shows them.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding a filter directive, e.g. `rewind_history=trace`.
pub const LOG_ENV: &str = "REWIND_LOG";

/// Crates whose events the default filter lets through.
const REWIND_TARGETS: &[&str] = &["rewind_history", "rewind_storage", "rewind_util"];

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
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
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parse a log level from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Level for the rewind crates; everything else stays at `warn`.
    pub level: LogLevel,
    /// Whether to include file/line info in logs.
    pub include_location: bool,
    /// Write through the test harness so output is captured per test.
    pub test_writer: bool,
}

impl LogConfig {
    /// Debug-level history events, captured by the test harness.
    pub fn for_tests() -> Self {
        Self {
            level: LogLevel::Debug,
            include_location: true,
            test_writer: true,
        }
    }

    /// Filter used when `REWIND_LOG` is not set.
    pub fn default_directives(&self) -> String {
        let level = self.level.as_str();
        let mut directives = String::from("warn");
        for target in REWIND_TARGETS {
            directives.push_str(&format!(",{target}={level}"));
        }
        directives
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(self.default_directives()))
    }
}

/// Install a stderr subscriber for rewind events.
///
/// Returns `false` when a global subscriber was already installed, which
/// leaves the existing one in place.
pub fn init(config: LogConfig) -> bool {
    let registry = tracing_subscriber::registry().with(config.filter());
    let layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    if config.test_writer {
        registry.with(layer.with_test_writer()).try_init().is_ok()
    } else {
        registry
            .with(layer.with_writer(std::io::stderr))
            .try_init()
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::parse("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("invalid"), None);
    }

    #[test]
    fn test_default_directives_scope_rewind_crates() {
        let config = LogConfig {
            level: LogLevel::Trace,
            ..LogConfig::default()
        };
        assert_eq!(
            config.default_directives(),
            "warn,rewind_history=trace,rewind_storage=trace,rewind_util=trace"
        );
        assert!(LogConfig::default()
            .default_directives()
            .ends_with("rewind_util=info"));
    }

    #[test]
    fn test_init_twice_keeps_first_subscriber() {
        init(LogConfig::for_tests());
        assert!(!init(LogConfig::default()));
    }
}
