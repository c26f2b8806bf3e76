//! Logging system configuration and initialization
//!
//! - Console and/or file output (non-blocking writer)
//! - Optional structured JSON for the file sink
//! - Level from configuration, overridable with `RUST_LOG`
//! - A previous log file is renamed with its timestamp before a new one starts

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

pub use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking file writers alive for the life of the process
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Dependency targets capped unless trace is requested
const QUIET_TARGETS: [&str; 4] = ["reqwest=info", "hyper=warn", "h2=warn", "rustls=warn"];

struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Default log directory: `logs/` next to the executable
pub fn get_log_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default()
        .join("logs")
}

/// Filter for the configured level. `RUST_LOG` wins when set.
pub fn build_env_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(level)
        .with_context(|| format!("Invalid log level '{level}'"))?;
    if !level.to_ascii_lowercase().contains("trace") {
        for target in QUIET_TARGETS {
            let directive: Directive = target
                .parse()
                .with_context(|| format!("Invalid log directive '{target}'"))?;
            filter = filter.add_directive(directive);
        }
    }
    Ok(filter)
}

/// Rename `<dir>/<name>` to `<stem>.<YYYYmmddTHHMMSS>.log` if it exists
fn rotate_existing_log_file(log_dir: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    let current = log_dir.join(file_name);
    if !current.exists() {
        return Ok(None);
    }

    let metadata = std::fs::metadata(&current)
        .with_context(|| format!("Failed to read log file metadata: {}", current.display()))?;
    let written: DateTime<Local> = metadata
        .modified()
        .unwrap_or_else(|_| std::time::SystemTime::now())
        .into();

    let stem = file_name.trim_end_matches(".log");
    let rotated = log_dir.join(format!("{}.{}.log", stem, written.format("%Y%m%dT%H%M%S")));
    std::fs::rename(&current, &rotated).with_context(|| {
        format!(
            "Failed to rotate log file {} to {}",
            current.display(),
            rotated.display()
        )
    })?;
    Ok(Some(rotated))
}

pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(&config.level)?;
    let registry = Registry::default().with(env_filter);

    let mut log_path = None;
    let mut rotated = None;
    let file_writer = if config.file_output {
        let log_dir = config.log_dir.clone().unwrap_or_else(get_log_directory);
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
        rotated = rotate_existing_log_file(&log_dir, &config.file_name)?;

        let (writer, guard) = non_blocking(rolling::never(&log_dir, &config.file_name));
        LOG_GUARDS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(guard);
        log_path = Some(log_dir.join(&config.file_name));
        Some(writer)
    } else {
        None
    };

    let result = match (file_writer, config.json_format) {
        (Some(writer), true) => {
            let file_layer = fmt::Layer::new()
                .json()
                .with_writer(writer)
                .with_timer(LocalTimeFormatter)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false);
            let console_layer = config.console_output.then(|| {
                fmt::Layer::new()
                    .with_writer(std::io::stdout)
                    .with_timer(LocalTimeFormatter)
                    .with_target(false)
            });
            registry.with(file_layer).with(console_layer).try_init()
        }
        (Some(writer), false) => {
            // time + level + message only
            let file_layer = fmt::Layer::new()
                .with_writer(writer)
                .with_timer(LocalTimeFormatter)
                .with_target(false)
                .with_ansi(false);
            let console_layer = config.console_output.then(|| {
                fmt::Layer::new()
                    .with_writer(std::io::stdout)
                    .with_timer(LocalTimeFormatter)
                    .with_target(false)
            });
            registry.with(file_layer).with(console_layer).try_init()
        }
        (None, true) => {
            let console_layer = fmt::Layer::new()
                .json()
                .with_writer(std::io::stdout)
                .with_timer(LocalTimeFormatter);
            registry.with(console_layer).try_init()
        }
        (None, false) => {
            let console_layer = fmt::Layer::new()
                .with_writer(std::io::stdout)
                .with_timer(LocalTimeFormatter)
                .with_target(false);
            registry.with(console_layer).try_init()
        }
    };
    result.map_err(|e| anyhow!("Failed to install log subscriber: {e}"))?;

    info!(
        "Logging initialized (level: {}, json: {}, console: {}, file: {:?})",
        config.level, config.json_format, config.console_output, log_path
    );
    if let Some(rotated) = rotated {
        info!("Previous log file moved to {}", rotated.display());
    }
    Ok(())
}

pub fn log_system_info() {
    info!("=== Affiliate Storefront ===");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Platform: {} / {}", std::env::consts::OS, std::env::consts::ARCH);
    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
    info!("============================");
}
