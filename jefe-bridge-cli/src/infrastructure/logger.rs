use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::{Once, OnceLock};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling, rolling::Rotation};
use tracing_subscriber::{
    fmt::{self, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

static INIT: Once = Once::new();
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Crates whose records pass the default filter
const LOG_TARGETS: [&str; 3] = ["jefe_bridge_core", "jefe_bridge_cli", "jefe_bridge"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    pub level: String,
    pub enable_console: bool,
    pub enable_file: bool,
    pub log_directory: String,
    pub file_prefix: String,
    pub enable_colors: bool,
    pub enable_thread_ids: bool,
    pub enable_file_line: bool,
    pub enable_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_console: true,
            enable_file: false,
            log_directory: "logs".to_string(),
            file_prefix: "jefe_bridge.log".to_string(),
            enable_colors: true,
            enable_thread_ids: false,
            enable_file_line: false,
            enable_target: true,
        }
    }
}

impl LogConfig {
    pub fn with_level(level: &str) -> Self {
        Self {
            level: level.to_string(),
            ..Self::default()
        }
    }

    pub fn parsed_level(&self) -> Level {
        match self.level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Directive used when `RUST_LOG` is unset
    pub fn default_directive(&self) -> String {
        let level = self.parsed_level().to_string().to_lowercase();
        LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub struct EnhancedLogger {
    config: LogConfig,
}

impl EnhancedLogger {
    pub fn new(config: LogConfig) -> Self {
        if config.enable_file {
            if let Err(e) = fs::create_dir_all(&config.log_directory) {
                eprintln!("Failed to create log directory: {e}");
            }
        }

        Self { config }
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Install the global subscriber; later calls are no-ops
    pub fn init(&self) {
        INIT.call_once(|| {
            let env_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.config.default_directive()));

            let mut layers: Vec<Box<dyn Layer<_> + Send + Sync>> = Vec::new();

            if self.config.enable_console {
                let console_layer = fmt::layer()
                    .with_timer(UtcTime::rfc_3339())
                    .with_thread_ids(self.config.enable_thread_ids)
                    .with_file(self.config.enable_file_line)
                    .with_line_number(self.config.enable_file_line)
                    .with_target(self.config.enable_target)
                    .with_ansi(self.config.enable_colors)
                    .with_writer(std::io::stderr);
                layers.push(Box::new(console_layer));
            }

            if self.config.enable_file {
                let file_appender = rolling::RollingFileAppender::new(
                    Rotation::DAILY,
                    &self.config.log_directory,
                    &self.config.file_prefix,
                );
                let (writer, guard) = non_blocking(file_appender);
                let _ = FILE_GUARD.set(guard);
                let file_layer = fmt::layer()
                    .with_timer(UtcTime::rfc_3339())
                    .with_thread_ids(self.config.enable_thread_ids)
                    .with_file(self.config.enable_file_line)
                    .with_line_number(self.config.enable_file_line)
                    .with_target(self.config.enable_target)
                    .with_ansi(false)
                    .with_writer(writer);
                layers.push(Box::new(file_layer));
            }

            let subscriber = Registry::default().with(env_filter).with(layers);
            if let Err(e) = subscriber.try_init() {
                eprintln!("Failed to install log subscriber: {e}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        assert_eq!(LogConfig::with_level("verbose").parsed_level(), Level::INFO);
        assert_eq!(LogConfig::with_level("DEBUG").parsed_level(), Level::DEBUG);
    }

    #[test]
    fn test_default_directive_covers_every_crate() {
        let directive = LogConfig::with_level("warn").default_directive();
        assert_eq!(
            directive,
            "jefe_bridge_core=warn,jefe_bridge_cli=warn,jefe_bridge=warn"
        );
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            enable_file: true,
            log_directory: dir.path().to_string_lossy().to_string(),
            ..LogConfig::with_level("debug")
        };
        let logger = EnhancedLogger::new(config);
        logger.init();
        logger.init();
        log::debug!("logger initialised twice");
        assert!(dir.path().exists());
    }
}
