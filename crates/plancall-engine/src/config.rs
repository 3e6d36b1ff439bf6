//! Runner and solver configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the process runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Bounded wait for new output before the deadline is checked again.
    pub poll_interval_ms: u64,

    /// Number of kill signals sent before giving up on a timed-out child.
    pub kill_attempts: u32,

    /// How long to wait for the child to exit after each kill.
    pub kill_wait_ms: u64,

    /// Chunks buffered between the stream drains and the accumulator.
    pub channel_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            kill_attempts: 3,
            kill_wait_ms: 2_000,
            channel_capacity: 64,
        }
    }
}

impl RunnerConfig {
    /// Polling interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Per-attempt kill wait as a duration.
    pub fn kill_wait(&self) -> Duration {
        Duration::from_millis(self.kill_wait_ms)
    }
}

/// Configuration for a solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Name reported in every outcome.
    pub name: String,

    /// Default deadline in milliseconds, if any.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Process runner settings.
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl SolverConfig {
    /// Create a config with no default deadline.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timeout_ms: None,
            runner: RunnerConfig::default(),
        }
    }

    /// Set the default deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Default deadline as a duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
