//! tracing-subscriber setup shared by both binaries

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where log lines go when no file is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Stdout,
    /// Drop everything; used while the terminal UI owns the screen
    Discard,
}

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

pub fn init(config: &LoggingConfig, fallback: Fallback) -> Result<()> {
    let filter = env_filter(config);

    if let Some(path) = &config.file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
            .try_init()?;
        return Ok(());
    }

    match fallback {
        Fallback::Stdout => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .try_init()?;
        }
        Fallback::Discard => {}
    }

    Ok(())
}
