//! Restart launcher: runs `cmdbot run` as a child process and starts it
//! again until it closes completely.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use cmdbot_core::ExitSignal;

/// A child that dies sooner than this is not restarted.
pub const MIN_UPTIME: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Restart,
    Stop(ExitSignal),
}

/// Map a raw exit code to a signal. Unknown codes count as abnormal.
pub fn classify(code: Option<i32>) -> ExitSignal {
    match code.and_then(ExitSignal::from_exit_code) {
        Some(signal) => signal,
        None => {
            warn!(code = ?code, "Child ended with unexpected exit code; treating as abnormal close");
            ExitSignal::AbnormalClose
        }
    }
}

pub fn decide(signal: ExitSignal, uptime: Duration) -> Decision {
    if signal == ExitSignal::CompleteClose {
        return Decision::Stop(signal);
    }
    if uptime < MIN_UPTIME {
        error!(uptime_ms = uptime.as_millis() as u64, "Child died too quickly; not restarting");
        return Decision::Stop(signal);
    }
    Decision::Restart
}

/// Supervise `cmdbot run <args>` and return the final exit signal.
pub async fn supervise(args: &[String]) -> Result<ExitSignal> {
    let exe = std::env::current_exe().context("Failed to locate the cmdbot executable")?;
    let mut generation = 0u32;

    loop {
        generation += 1;
        info!(generation, "Starting bot process");
        let started = Instant::now();
        let status = tokio::process::Command::new(&exe)
            .arg("run")
            .args(args)
            .status()
            .await
            .with_context(|| format!("Failed to spawn {}", exe.display()))?;

        let signal = classify(status.code());
        info!(generation, signal = %signal, "Bot process exited");

        match decide(signal, started.elapsed()) {
            Decision::Restart => continue,
            Decision::Stop(signal) => return Ok(signal),
        }
    }
}
