//! Structured Logger
//!
//! Console output goes to stderr so stdout stays free for bot replies.
//! When a log directory is given, every event is also written as NDJSON to
//! `<dir>/cmdbot.log.YYYY-MM-DD`. `RUST_LOG` overrides `level`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_NAME: &str = "cmdbot.log";

/// Initialize the global logger. Calling it again is a no-op.
pub fn init_logger(log_dir: Option<&Path>, level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_NAME);
            Some(fmt::layer().json().with_writer(appender).with_ansi(false))
        }
        None => None,
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_log_dir_and_is_idempotent() {
        let dir = std::env::temp_dir().join(format!("cmdbot-logging-{}", std::process::id()));
        init_logger(Some(&dir), "debug").unwrap();
        assert!(dir.is_dir());
        init_logger(None, "info").unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }
}
