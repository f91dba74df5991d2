//! Logging infrastructure using tracing + tracing-subscriber
//!
//! Console logs go to stderr; stdout is reserved for command replies.
//! An optional daily-rotated log file can be added, and `RUST_LOG` refines
//! levels per module.

use std::fs;
use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingSettings;
use crate::error::{Error, Result};

/// Keeps the file writer alive so buffered lines are flushed on exit
pub struct LogGuards {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the logging system
pub fn init_logging(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Result<LogGuards> {
    let level = determine_level(settings, verbose, quiet);
    let env_filter = build_env_filter(level)?;
    let console_layer = build_console_layer(settings.json_format);

    let (file_layer, file_guard) = match settings.file {
        Some(ref log_file) => {
            let (layer, guard) =
                build_file_layer(log_file, settings.max_files, settings.json_format)?;
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(
        level = %level,
        file = ?settings.file,
        json = settings.json_format,
        "Logging initialized"
    );

    Ok(LogGuards {
        _file_guard: file_guard,
    })
}

/// Determine the effective log level based on settings and CLI flags
fn determine_level(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => parse_level(&settings.level),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Build the filter: RUST_LOG if set, otherwise the resolved level
fn build_env_filter(level: Level) -> Result<EnvFilter> {
    let base = level.to_string().to_lowercase();
    let directive = format!("envbot={}", base)
        .parse()
        .map_err(|e| Error::Config(format!("Invalid log directive: {}", e)))?;

    Ok(EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&base))
        .add_directive(directive))
}

fn build_console_layer<S>(json_format: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    if json_format {
        Box::new(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
    } else {
        Box::new(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
    }
}

/// Daily-rotated, non-blocking file layer
fn build_file_layer<S>(
    log_file: &str,
    max_files: u32,
    json_format: bool,
) -> Result<(Box<dyn Layer<S> + Send + Sync>, WorkerGuard)>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let path = Path::new(log_file);
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs::create_dir_all(directory).map_err(|e| {
        Error::Config(format!(
            "Failed to create log directory '{}': {}",
            directory.display(),
            e
        ))
    })?;

    let file_name = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("envbot");

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_name)
        .filename_suffix("log")
        .max_log_files(max_files.max(1) as usize)
        .build(directory)
        .map_err(|e| Error::Config(format!("Failed to create log file appender: {}", e)))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let layer: Box<dyn Layer<S> + Send + Sync> = if json_format {
        Box::new(
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_target(true)
                .with_ansi(false),
        )
    } else {
        Box::new(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_ansi(false),
        )
    };

    Ok((layer, guard))
}
