//! Common types used across plancall.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Final classification of a solver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// The solver produced a plan.
    Success,
    /// The solver determined the problem has no plan.
    Unsolvable,
    /// The run hit its deadline and was killed.
    Timeout,
    /// The solver failed for reasons unrelated to the problem.
    InternalError,
    /// The solver cannot handle this kind of problem.
    Unsupported,
}

impl SolveStatus {
    /// Returns true if a plan was found.
    pub fn is_success(&self) -> bool {
        matches!(self, SolveStatus::Success)
    }

    /// Returns true if the run ended without a usable answer about the problem.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            SolveStatus::Timeout | SolveStatus::InternalError | SolveStatus::Unsupported
        )
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolveStatus::Success => "success",
            SolveStatus::Unsolvable => "unsolvable",
            SolveStatus::Timeout => "timeout",
            SolveStatus::InternalError => "internal_error",
            SolveStatus::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// Severity of a captured log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Captured standard output.
    Info,
    /// Captured standard error.
    Error,
}
