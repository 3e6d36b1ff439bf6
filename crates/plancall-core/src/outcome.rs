//! Solve outcome types.
//!
//! A SolveOutcome is what one solver invocation hands back: the status, the
//! plan if one was parsed, and the raw solver output.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::plan::Plan;
use crate::types::{LogLevel, SolveStatus};

/// A block of captured solver output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogMessage {
    /// Severity of the message.
    pub level: LogLevel,

    /// Captured text, possibly empty.
    pub text: String,
}

impl LogMessage {
    /// Create an info message (captured stdout).
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Info,
            text: text.into(),
        }
    }

    /// Create an error message (captured stderr).
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Error,
            text: text.into(),
        }
    }
}

/// Result of one solver run.
#[derive(Debug, Clone, Serialize)]
pub struct SolveOutcome {
    /// Unique identifier for this run.
    pub run_id: Uuid,

    /// Name of the solver that produced the outcome.
    pub solver_name: String,

    /// Final classification.
    pub status: SolveStatus,

    /// The parsed plan, if the solver wrote one.
    pub plan: Option<Plan>,

    /// Captured stdout (info) then stderr (error).
    pub logs: Vec<LogMessage>,

    /// Wall-clock time of the solver process in milliseconds.
    pub elapsed_ms: u64,

    /// Timestamp when the outcome was classified.
    pub finished_at: DateTime<Utc>,
}

impl SolveOutcome {
    /// Create a new outcome.
    pub fn new(
        run_id: Uuid,
        solver_name: impl Into<String>,
        status: SolveStatus,
        plan: Option<Plan>,
        logs: Vec<LogMessage>,
    ) -> Self {
        Self {
            run_id,
            solver_name: solver_name.into(),
            status,
            plan,
            logs,
            elapsed_ms: 0,
            finished_at: Utc::now(),
        }
    }

    /// Set the elapsed time.
    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// Captured stdout text.
    pub fn stdout(&self) -> &str {
        self.log_text(LogLevel::Info)
    }

    /// Captured stderr text.
    pub fn stderr(&self) -> &str {
        self.log_text(LogLevel::Error)
    }

    fn log_text(&self, level: LogLevel) -> &str {
        self.logs
            .iter()
            .find(|m| m.level == level)
            .map(|m| m.text.as_str())
            .unwrap_or("")
    }

    /// Serialize the outcome as pretty JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
