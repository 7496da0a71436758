use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::debug;

use crate::error::OrchestratorError;

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs_f64()
}

/// A single start/stop timer, materialized as `stat.timer.json` (§6
/// "Timer artifact"). Mirrors the teacher crate's RAII `ScopedTimer`
/// idiom (start/stop with an active guard), but logs to a file rather
/// than a tracing span.
#[derive(Debug, Default)]
pub struct StatTimer {
    active: bool,
    started_at: Option<f64>,
    stopped_at: Option<f64>,
    duration: Option<f64>,
}

#[derive(Serialize)]
struct TimerArtifact {
    started_at: Option<f64>,
    stopped_at: Option<f64>,
    duration: f64,
}

impl StatTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started_at(&self) -> Option<f64> {
        self.started_at
    }

    pub fn stopped_at(&self) -> Option<f64> {
        self.stopped_at
    }

    /// Seconds between start and stop, rounded to two decimals. Computed
    /// once and cached.
    pub fn duration(&mut self) -> f64 {
        if let Some(duration) = self.duration {
            return duration;
        }
        let started = self.started_at.unwrap_or(0.0);
        let stopped = self.stopped_at.unwrap_or(0.0);
        let duration = ((stopped - started) * 100.0).round() / 100.0;
        self.duration = Some(duration);
        duration
    }

    pub fn start(&mut self) -> Result<(), OrchestratorError> {
        if self.active {
            return Err(OrchestratorError::internal("Timer is already active"));
        }
        self.active = true;
        self.started_at = Some(now_secs());
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), OrchestratorError> {
        if !self.active {
            return Err(OrchestratorError::internal("Timer is not active"));
        }
        self.active = false;
        self.stopped_at = Some(now_secs());
        Ok(())
    }

    /// Writes `<path>/stat.timer.json` as a single JSON object followed by
    /// a trailing newline.
    pub fn log(&mut self, path: &str) -> Result<(), OrchestratorError> {
        let artifact = TimerArtifact {
            started_at: self.started_at,
            stopped_at: self.stopped_at,
            duration: self.duration(),
        };
        let data = serde_json::to_string(&artifact)
            .map_err(|e| OrchestratorError::internal(format!("failed to serialize timer: {e}")))?;
        let file_path = Path::new(path).join("stat.timer.json");
        debug!(path = %file_path.display(), "writing stat timer artifact");
        fs::write(&file_path, format!("{data}\n"))
            .map_err(|e| OrchestratorError::internal(format!("failed to write {}: {e}", file_path.display())))?;
        Ok(())
    }
}

/// Per-replication statistics bundle. Currently wraps a single
/// [`StatTimer`]; kept as its own type (rather than inlining the timer
/// into `ReplicatingExecutor`) so other stat facets can be added later
/// without changing the executor's call sites.
#[derive(Debug, Default)]
pub struct Stat {
    timer: StatTimer,
}

impl Stat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timer(&mut self) -> &mut StatTimer {
        &mut self.timer
    }

    pub fn start(&mut self) -> Result<(), OrchestratorError> {
        self.timer.start()
    }

    pub fn stop(&mut self) -> Result<(), OrchestratorError> {
        self.timer.stop()
    }

    pub fn log(&mut self, path: &str) -> Result<(), OrchestratorError> {
        self.timer.log(path)
    }
}
