use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

pub const CENSUS_LOG_DIR: &str = "CENSUS_LOG_DIR";

// Used to ensure we only set up tracing once
static INIT: Once = Once::new();

/// Sets up logging for the CLI:
/// - human-readable output on stderr, so stdout carries only command output
/// - JSON file logging when `CENSUS_LOG_DIR` is set
///
/// `RUST_LOG` overrides the default levels.
pub fn setup_logging(name: Option<&str>) -> Result<()> {
    let log_dir = std::env::var_os(CENSUS_LOG_DIR).map(PathBuf::from);
    let mut result = Ok(());
    INIT.call_once(|| {
        result = build_subscriber(name, log_dir.as_deref()).and_then(|subscriber| {
            subscriber
                .try_init()
                .context("Failed to set global subscriber")
        });
    });
    result
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Everything else at WARN
        EnvFilter::new("census=info,census_cli=info").add_directive(LevelFilter::WARN.into())
    })
}

fn log_file_name(name: Option<&str>) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    match name {
        Some(n) => format!("{}-{}.log", timestamp, n),
        None => format!("{}.log", timestamp),
    }
}

fn build_subscriber(
    name: Option<&str>,
    log_dir: Option<&Path>,
) -> Result<impl tracing::Subscriber + Send + Sync> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(default_filter());

    let mut layers = vec![console_layer.boxed()];

    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        let file_appender = tracing_appender::rolling::RollingFileAppender::new(
            Rotation::NEVER,
            dir,
            log_file_name(name),
        );
        let file_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(file_appender)
            .with_ansi(false)
            .json()
            .with_filter(default_filter());
        layers.push(file_layer.boxed());
    }

    Ok(Registry::default().with(layers))
}
