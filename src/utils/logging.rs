use clap::ValueEnum;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::settings::{LogFormat, LoggingConfig, SettingsConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match *self {
            LogLevel::TRACE => "trace",
            LogLevel::DEBUG => "debug",
            LogLevel::INFO => "info",
            LogLevel::WARN => "warn",
            LogLevel::ERROR => "error",
        }
    }
}

/// Effective logging config: CLI level overrides the configured one.
pub fn resolve(settings: &SettingsConfig, arg_log_level: Option<LogLevel>) -> LoggingConfig {
    let configured = settings.logging.clone().unwrap_or_default();
    match arg_log_level {
        Some(level) => LoggingConfig::new(level.as_str().to_owned(), configured.format),
        None => configured,
    }
}

pub fn run(settings: &SettingsConfig, arg_log_level: Option<LogLevel>) {
    init_logging(&resolve(settings, arg_log_level));
}

/// Initialize tracing with the desired config.
pub fn init_logging(cfg: &LoggingConfig) {
    let env_filter = EnvFilter::try_new(cfg.level.to_lowercase())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .flatten_event(true)
                .with_ansi(false); // CRI parsers dislike ANSI color codes

            let _ = registry.with(layer).try_init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(true);

            let _ = registry.with(layer).try_init();
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_overrides_config_but_keeps_format() {
        let settings = SettingsConfig {
            logging: Some(LoggingConfig::new("warn".into(), LogFormat::Json)),
            ..SettingsConfig::default()
        };

        let from_config = resolve(&settings, None);
        assert_eq!(from_config.level, "warn");

        let overridden = resolve(&settings, Some(LogLevel::DEBUG));
        assert_eq!(overridden.level, "debug");
        assert_eq!(overridden.format, LogFormat::Json);
    }

    #[test]
    fn defaults_to_info_compact() {
        let cfg = resolve(&SettingsConfig::default(), None);
        assert_eq!(cfg.level, "info");
        assert_eq!(cfg.format, LogFormat::Compact);
    }
}
