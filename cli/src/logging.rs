//! Logging setup for `stl` using `tracing-subscriber`.
//!
//! Logs go to stderr so that command output on stdout stays parseable. The
//! filter comes from `STATELINE_LOG` when set, then from `log_filter` in
//! the settings file, then from the verbosity flags.

use std::io;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "STATELINE_LOG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub format: LogFormat,
    /// Directive from the settings file, used when `STATELINE_LOG` is unset.
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: LevelFilter::WARN,
            format: LogFormat::default(),
            filter: None,
        }
    }
}

impl LogConfig {
    /// `-q` wins over `-v`.
    ///
    /// - quiet: error
    /// - 0: warn
    /// - 1: info
    /// - 2: debug
    /// - 3+: trace
    #[must_use]
    pub fn from_verbosity(verbose: u8, quiet: u8) -> Self {
        let level = if quiet > 0 {
            LevelFilter::ERROR
        } else {
            match verbose {
                0 => LevelFilter::WARN,
                1 => LevelFilter::INFO,
                2 => LevelFilter::DEBUG,
                _ => LevelFilter::TRACE,
            }
        };
        LogConfig {
            level,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    /// The filter directive in effect given the value of `STATELINE_LOG`.
    pub fn directive(&self, env: Option<String>) -> String {
        env.filter(|d| !d.trim().is_empty())
            .or_else(|| self.filter.clone())
            .unwrap_or_else(|| {
                let level = self.level.to_string().to_lowercase();
                format!("{level},stateline_core={level},stateline_cli={level}")
            })
    }
}

/// Install the global subscriber.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let directive = config.directive(std::env::var(LOG_ENV).ok());
    let filter = EnvFilter::try_new(&directive)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().without_time().with_writer(io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_writer(io::stderr))
            .try_init(),
    };
    result.map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(LogConfig::from_verbosity(0, 0).level, LevelFilter::WARN);
        assert_eq!(LogConfig::from_verbosity(1, 0).level, LevelFilter::INFO);
        assert_eq!(LogConfig::from_verbosity(2, 0).level, LevelFilter::DEBUG);
        assert_eq!(LogConfig::from_verbosity(5, 0).level, LevelFilter::TRACE);
        assert_eq!(LogConfig::from_verbosity(3, 1).level, LevelFilter::ERROR);
    }

    #[test]
    fn directive_precedence() {
        let config = LogConfig::from_verbosity(1, 0).with_filter(Some("stateline_core=trace".into()));
        assert_eq!(config.directive(Some("debug".into())), "debug");
        assert_eq!(config.directive(Some("  ".into())), "stateline_core=trace");
        assert_eq!(config.directive(None), "stateline_core=trace");
    }

    #[test]
    fn directive_from_level() {
        let config = LogConfig::from_verbosity(2, 0);
        assert_eq!(
            config.directive(None),
            "debug,stateline_core=debug,stateline_cli=debug"
        );
        assert!(EnvFilter::try_new(config.directive(None)).is_ok());
    }

    #[test]
    fn builder_sets_format() {
        let config = LogConfig::default().with_format(LogFormat::Json);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, LevelFilter::WARN);
    }
}
