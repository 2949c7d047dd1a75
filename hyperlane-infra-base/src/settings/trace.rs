use std::cmp::Ordering;

use eyre::Result;
use serde::Deserialize;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt,
    prelude::*,
    registry::LookupSpan,
    Layer,
};

/// Logging level. A "higher level" means more will be logged.
#[derive(Default, Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Level {
    /// Off
    Off = 0,
    /// Error
    Error = 1,
    /// Warn
    Warn = 2,
    /// Debug
    Debug = 3,
    /// Trace
    Trace = 5,
    /// Info
    #[serde(other)]
    #[default]
    Info = 4,
}

// Ordered by verbosity, `Info` is declared last only to carry `serde(other)`
impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> LevelFilter {
        match level {
            Level::Off => LevelFilter::OFF,
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
            Level::Info => LevelFilter::INFO,
        }
    }
}

/// Output style of the stdout layer. json | pretty | compact | full
#[derive(Default, Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Style {
    /// Pretty print
    Pretty,
    /// JSON
    Json,
    /// Compact
    Compact,
    /// Default style
    #[serde(other)]
    #[default]
    Full,
}

impl Style {
    fn layer<S>(self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = fmt::layer().with_target(true);
        match self {
            Style::Pretty => layer.pretty().boxed(),
            Style::Json => layer.json().boxed(),
            Style::Compact => layer.compact().boxed(),
            Style::Full => layer.boxed(),
        }
    }
}

/// Configuration for the tracing subscribers used by the infra tooling
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TracingConfig {
    #[serde(default)]
    pub(crate) fmt: Style,
    #[serde(default)]
    pub(crate) level: Level,
}

impl TracingConfig {
    /// A config with the given style and level
    pub fn new(fmt: Style, level: Level) -> Self {
        Self { fmt, level }
    }

    /// Replace the configured level, e.g. with one taken from the command line
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Attempt to instantiate and register a tracing subscriber setup from
    /// settings.
    pub fn start_tracing(&self) -> Result<()> {
        let mut target_layer = Targets::new().with_default(self.level);
        if self.level < Level::Trace {
            // only show these debug and trace logs at trace level
            target_layer = target_layer.with_target("hyper", Level::Info);
            target_layer = target_layer.with_target("rusoto_core", Level::Info);
            target_layer = target_layer.with_target("reqwest", Level::Info);
        }
        let err_layer = tracing_error::ErrorLayer::default();

        let subscriber = tracing_subscriber::Registry::default()
            .with(target_layer)
            .with(self.fmt.layer())
            .with(err_layer);

        subscriber.try_init()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_values_fall_back_to_defaults() {
        let cfg: TracingConfig =
            serde_json::from_str(r#"{"fmt": "rainbow", "level": "chatty"}"#).unwrap();
        assert_eq!(cfg.fmt, Style::Full);
        assert_eq!(cfg.level, Level::Info);

        let cfg: TracingConfig = serde_json::from_str(r#"{"fmt": "json"}"#).unwrap();
        assert_eq!(cfg.fmt, Style::Json);
        assert_eq!(cfg.level, Level::Info);
    }

    #[test]
    fn trace_is_the_most_verbose_level() {
        assert!(Level::Debug < Level::Trace);
        assert!(Level::Info < Level::Debug);
        assert!(Level::Warn < Level::Info);
        let mut levels = [Level::Trace, Level::Info, Level::Off, Level::Debug];
        levels.sort();
        assert_eq!(levels, [Level::Off, Level::Info, Level::Debug, Level::Trace]);
        assert_eq!(LevelFilter::from(Level::Warn), LevelFilter::WARN);
    }
}
