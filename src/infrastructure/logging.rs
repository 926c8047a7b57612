//! Logging system configuration and initialization
//!
//! Tracing setup with:
//! - File logging via a non-blocking appender
//! - Configuration-driven log level and module filters
//! - Structured JSON logging (optional)
//! - Console and file output support
//! - Startup cleanup of old log files

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use chrono::Utc;
use lazy_static::lazy_static;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

pub use crate::infrastructure::config::LoggingConfig;

// Global guards keep the non-blocking writers alive for the process
// lifetime.
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// UTC timestamps with millisecond precision in every log line.
struct UtcTimeFormatter;

impl FormatTime for UtcTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"))
    }
}

/// Log directory relative to the executable location.
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    exe_dir.join("logs")
}

/// Initialize the logging system with the default configuration.
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize logging with a custom configuration.
///
/// Noisy dependency targets (`reqwest`, `hyper`, `tokio`) are downgraded
/// unless TRACE is requested; `RUST_LOG` overrides everything when set.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let log_dir = get_log_directory();
    std::fs::create_dir_all(&log_dir)
        .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

    if config.auto_cleanup_logs {
        cleanup_old_logs(&log_dir, config)?;
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| build_filter(config));
    let registry = Registry::default().with(env_filter);

    let log_file_name = format!("catalog-pulse-{}.log", Utc::now().format("%Y%m%d"));

    match (config.file_output, config.console_output) {
        (true, true) => {
            let file_appender = rolling::never(&log_dir, log_file_name);
            let (file_writer, file_guard) = non_blocking(file_appender);
            LOG_GUARDS.lock().unwrap().push(file_guard);

            if config.json_format {
                let console_layer = fmt::Layer::new()
                    .with_writer(std::io::stdout)
                    .with_timer(UtcTimeFormatter)
                    .with_target(false);
                let file_layer = fmt::Layer::new()
                    .json()
                    .with_writer(file_writer)
                    .with_timer(UtcTimeFormatter)
                    .with_target(true)
                    .with_ansi(false);
                registry.with(file_layer).with(console_layer).init();
            } else {
                let console_layer = fmt::Layer::new()
                    .with_writer(std::io::stdout)
                    .with_timer(UtcTimeFormatter)
                    .with_target(false);
                let file_layer = fmt::Layer::new()
                    .with_writer(file_writer)
                    .with_timer(UtcTimeFormatter)
                    .with_target(false)
                    .with_ansi(false);
                registry.with(file_layer).with(console_layer).init();
            }
        }
        (true, false) => {
            let file_appender = rolling::never(&log_dir, log_file_name);
            let (file_writer, file_guard) = non_blocking(file_appender);
            LOG_GUARDS.lock().unwrap().push(file_guard);

            if config.json_format {
                let file_layer = fmt::Layer::new()
                    .json()
                    .with_writer(file_writer)
                    .with_timer(UtcTimeFormatter)
                    .with_target(true)
                    .with_ansi(false);
                registry.with(file_layer).init();
            } else {
                let file_layer = fmt::Layer::new()
                    .with_writer(file_writer)
                    .with_timer(UtcTimeFormatter)
                    .with_target(false)
                    .with_ansi(false);
                registry.with(file_layer).init();
            }
        }
        (false, true) => {
            let console_layer = fmt::Layer::new()
                .with_writer(std::io::stdout)
                .with_timer(UtcTimeFormatter)
                .with_target(false);
            registry.with(console_layer).init();
        }
        (false, false) => {
            return Err(anyhow!("No logging output configured"));
        }
    }

    info!("Logging system initialized");
    info!("Log directory: {:?}", log_dir);
    info!("Log level: {}", config.level);
    if !config.level.to_lowercase().contains("trace") {
        info!("Dependency logs suppressed (use TRACE level to see all logs)");
    }

    Ok(())
}

/// Build the env filter from the configured level plus module filters.
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    let mut filter = EnvFilter::new(&config.level);

    if !config.level.to_lowercase().contains("trace") {
        for directive in ["reqwest=info", "hyper=warn", "h2=warn", "tokio=info", "runtime=warn"] {
            if let Ok(parsed) = directive.parse() {
                filter = filter.add_directive(parsed);
            }
        }
    }

    for (module, level) in &config.module_filters {
        if let Ok(parsed) = format!("{module}={level}").parse() {
            filter = filter.add_directive(parsed);
        }
    }

    filter
}

/// Clean up old log files based on configuration.
fn cleanup_old_logs(log_dir: &Path, config: &LoggingConfig) -> Result<()> {
    if !log_dir.exists() {
        return Ok(());
    }

    let mut log_files = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.ends_with(".log"))
        {
            if let Ok(metadata) = entry.metadata() {
                if let Ok(modified) = metadata.modified() {
                    log_files.push((path, modified));
                }
            }
        }
    }

    // Newest first.
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let keep = if config.keep_only_latest {
        1
    } else {
        config.max_files as usize
    };

    if log_files.len() > keep {
        for (path, _) in log_files.iter().skip(keep) {
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Failed to remove old log file {:?}: {}", path, e);
            } else {
                info!("Removed old log file: {:?}", path);
            }
        }
    }

    Ok(())
}

/// Log system information for diagnostics.
pub fn log_system_info() {
    info!("=== catalog-pulse System Information ===");
    info!("Engine version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);
    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
    info!("Log directory: {:?}", get_log_directory());
    info!("========================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.level.is_empty());
        assert!(config.console_output);
        assert!(config.file_output);
    }

    #[test]
    fn test_log_directory_is_deterministic() {
        let log_dir = get_log_directory();
        assert!(log_dir.to_string_lossy().ends_with("logs"));
    }

    #[test]
    fn cleanup_keeps_newest_files() {
        let dir = tempfile::TempDir::new().unwrap();
        for name in ["a.log", "b.log", "c.log"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }

        let config = LoggingConfig {
            max_files: 2,
            keep_only_latest: false,
            ..LoggingConfig::default()
        };
        cleanup_old_logs(dir.path(), &config).unwrap();

        let remaining = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 2);
    }
}
