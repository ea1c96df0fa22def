//! Interval scheduler running crawl cycles until interrupted.
//!
//! The store is written only after a cycle completes, so a shutdown
//! request never leaves it half-merged: a cycle in flight always finishes
//! and the loop stops before the next one.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::accumulator::MergeReport;
use crate::app::{AppContext, PipelineError};
use crate::crawler::RetryPolicy;

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Pause between cycles in seconds (default: 300)
    pub interval_secs: u64,
    /// Attempts per cycle (default: 3)
    pub retry_attempts: u32,
    /// Attempt N is followed by N × this many seconds (default: 5)
    pub retry_backoff_secs: u64,
    /// Whether to run a cycle immediately on start
    pub run_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            retry_attempts: 3,
            retry_backoff_secs: 5,
            run_on_start: true,
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts,
            backoff: Duration::from_secs(self.retry_backoff_secs),
        }
    }

    /// Parse interval string like "1h", "30m", "300s", "1d"
    pub fn parse_interval(s: &str) -> Result<u64, String> {
        let s = s.trim().to_lowercase();

        if let Some(hours) = s.strip_suffix('h') {
            hours
                .parse::<u64>()
                .map(|h| h * 3600)
                .map_err(|_| format!("Invalid hours: {}", hours))
        } else if let Some(minutes) = s.strip_suffix('m') {
            minutes
                .parse::<u64>()
                .map(|m| m * 60)
                .map_err(|_| format!("Invalid minutes: {}", minutes))
        } else if let Some(days) = s.strip_suffix('d') {
            days.parse::<u64>()
                .map(|d| d * 86400)
                .map_err(|_| format!("Invalid days: {}", days))
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>()
                .map_err(|_| format!("Invalid seconds: {}", secs))
        } else {
            s.parse::<u64>()
                .map_err(|_| format!("Invalid interval: {}. Use format like '5m', '300s', '1h'", s))
        }
    }

    /// Format interval for display
    pub fn format_interval(secs: u64) -> String {
        if secs >= 86400 && secs.is_multiple_of(86400) {
            format!("{}d", secs / 86400)
        } else if secs >= 3600 && secs.is_multiple_of(3600) {
            format!("{}h", secs / 3600)
        } else if secs >= 60 && secs.is_multiple_of(60) {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

/// Cloneable handle asking a [`Scheduler`] to stop.
#[derive(Clone)]
pub struct ShutdownHandle {
    running: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl ShutdownHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.wake.notify_one();
    }
}

pub struct Scheduler {
    ctx: Arc<AppContext>,
    config: ScheduleConfig,
    running: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl Scheduler {
    pub fn new(ctx: Arc<AppContext>, config: ScheduleConfig) -> Self {
        Self {
            ctx,
            config,
            running: Arc::new(AtomicBool::new(true)),
            wake: Arc::new(Notify::new()),
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::SeqCst) {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            running: self.running.clone(),
            wake: self.wake.clone(),
        }
    }

    /// Stop the scheduler (called externally)
    pub fn stop(&self) {
        self.shutdown_handle().stop();
    }

    /// Get the PID file path
    pub fn pid_file_path() -> Option<PathBuf> {
        dirs::runtime_dir()
            .or_else(dirs::cache_dir)
            .map(|d| d.join("threadcast").join("scheduler.pid"))
    }

    /// Check if another scheduler is already running
    pub fn is_running() -> bool {
        Self::pid_file_path()
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|s| s.trim().parse::<u32>().ok())
            .is_some_and(Self::process_exists)
    }

    #[cfg(unix)]
    fn process_exists(pid: u32) -> bool {
        use std::process::Command;
        Command::new("kill")
            .args(["-0", &pid.to_string()])
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[cfg(windows)]
    fn process_exists(pid: u32) -> bool {
        use std::process::Command;
        Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid)])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains(&pid.to_string()))
            .unwrap_or(false)
    }

    fn write_pid_file(&self) -> std::io::Result<()> {
        if let Some(pid_path) = Self::pid_file_path() {
            if let Some(parent) = pid_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = fs::File::create(&pid_path)?;
            writeln!(file, "{}", std::process::id())?;
        }
        Ok(())
    }

    fn remove_pid_file(&self) {
        if let Some(pid_path) = Self::pid_file_path() {
            let _ = fs::remove_file(pid_path);
        }
    }

    /// Run as the single scheduler of this machine until SIGINT/SIGTERM.
    pub async fn run(&self) -> crate::app::Result<()> {
        if Self::is_running() {
            return Err(PipelineError::Other(
                "Another scheduler instance is already running".to_string(),
            ));
        }

        self.write_pid_file()
            .map_err(|e| PipelineError::Other(format!("Failed to write PID file: {}", e)))?;

        let handle = self.shutdown_handle();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            tokio::spawn(async move {
                let (Ok(mut sigterm), Ok(mut sigint)) = (
                    signal(SignalKind::terminate()),
                    signal(SignalKind::interrupt()),
                ) else {
                    error!("Failed to install signal handlers");
                    return;
                };

                tokio::select! {
                    _ = sigterm.recv() => {},
                    _ = sigint.recv() => {},
                }
                info!("Shutdown requested; finishing current cycle");
                handle.stop();
            });
        }

        #[cfg(windows)]
        {
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                info!("Shutdown requested; finishing current cycle");
                handle.stop();
            });
        }

        info!(
            "Scheduler started (interval: {}, PID: {})",
            ScheduleConfig::format_interval(self.config.interval_secs),
            std::process::id()
        );

        self.run_loop().await;

        info!("Scheduler stopped by user");
        self.remove_pid_file();

        Ok(())
    }

    /// Cycle, sleep, repeat while in [`SchedulerState::Running`].
    pub async fn run_loop(&self) {
        if self.config.run_on_start && self.state() == SchedulerState::Running {
            self.run_cycle().await;
        }

        while self.state() == SchedulerState::Running {
            let next = Local::now()
                + chrono::Duration::from_std(self.config.interval())
                    .unwrap_or_else(|_| chrono::Duration::zero());
            info!("Next crawl at {}", next.format("%Y-%m-%d %H:%M:%S"));

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval()) => {},
                _ = self.wake.notified() => {},
            }

            if self.state() == SchedulerState::Stopped {
                break;
            }

            self.run_cycle().await;
        }
    }

    /// One cycle: crawl, then merge into the store.
    ///
    /// Returns `None` when the crawl failed or the store could not be
    /// written; neither stops the scheduler.
    pub async fn run_cycle(&self) -> Option<MergeReport> {
        let url = &self.ctx.config.site.listing_url;
        info!("Crawl started at {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

        let outcome = self.ctx.crawler.run_cycle(url).await;
        if outcome.is_failed() {
            warn!("Cycle produced no posts; store left untouched");
            return None;
        }

        match self
            .ctx
            .accumulator
            .accumulate(&self.ctx.store, outcome.into_records())
        {
            Ok(report) => Some(report),
            Err(e) => {
                error!("Failed to update store {}: {}", self.ctx.store.path().display(), e);
                None
            }
        }
    }
}

/// Stop a running scheduler by reading PID file and sending signal
pub fn stop_scheduler() -> Result<(), String> {
    let pid_path = Scheduler::pid_file_path()
        .ok_or_else(|| "Could not determine PID file path".to_string())?;

    if !pid_path.exists() {
        return Err("No scheduler is running (PID file not found)".to_string());
    }

    let pid_str =
        fs::read_to_string(&pid_path).map_err(|e| format!("Failed to read PID file: {}", e))?;

    let pid: u32 = pid_str
        .trim()
        .parse()
        .map_err(|_| "Invalid PID in PID file".to_string())?;

    #[cfg(unix)]
    let status = std::process::Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .status()
        .map_err(|e| format!("Failed to send signal: {}", e))?;

    #[cfg(windows)]
    let status = std::process::Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/F"])
        .status()
        .map_err(|e| format!("Failed to stop process: {}", e))?;

    if status.success() {
        let _ = fs::remove_file(&pid_path);
        Ok(())
    } else {
        Err(format!("Failed to stop scheduler (PID {})", pid))
    }
}

/// Check scheduler status
pub fn scheduler_status() -> String {
    let pid = Scheduler::pid_file_path()
        .and_then(|p| fs::read_to_string(p).ok())
        .and_then(|s| s.trim().parse::<u32>().ok());

    match pid {
        Some(pid) if Scheduler::process_exists(pid) => {
            format!("Scheduler is running (PID: {})", pid)
        }
        Some(_) => "Scheduler is not running (stale PID file)".to_string(),
        None => "Scheduler is not running".to_string(),
    }
}
