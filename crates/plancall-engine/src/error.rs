//! Error types for the plancall engine.

use std::io;

use plancall_core::{CoreError, LogLevel, LogMessage};
use thiserror::Error;

/// Errors raised while launching or supervising a solver process.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The command vector was empty.
    #[error("Command is empty")]
    EmptyCommand,

    /// A zero deadline was requested.
    #[error("Timeout must be positive")]
    InvalidTimeout,

    /// The process could not be started.
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Waiting on the child failed.
    #[error("I/O error while supervising {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Errors raised while parsing plan text.
#[derive(Error, Debug)]
pub enum PlanError {
    /// A line is neither blank, a comment, nor an action.
    #[error("Error parsing plan at line {line_number}: {line:?}")]
    Malformed { line_number: usize, line: String },

    /// An action or object name is not in the problem.
    #[error("Unknown {kind} {name:?} at line {line_number}: {line:?}")]
    UnknownSymbol {
        kind: SymbolKind,
        name: String,
        line_number: usize,
        line: String,
    },

    /// A resolved action was given the wrong number of parameters.
    #[error("Invalid action at line {line_number}: {source}")]
    Arity {
        line_number: usize,
        #[source]
        source: CoreError,
    },

    /// A line pattern failed to compile.
    #[error("Invalid plan line pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The plan file could not be read.
    #[error("Failed to read plan file: {0}")]
    Io(#[from] io::Error),
}

impl PlanError {
    /// One-based line number of the offending line, if any.
    pub fn line_number(&self) -> Option<usize> {
        match self {
            PlanError::Malformed { line_number, .. }
            | PlanError::UnknownSymbol { line_number, .. }
            | PlanError::Arity { line_number, .. } => Some(*line_number),
            _ => None,
        }
    }
}

/// The registry a plan token failed to resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Action,
    Object,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolKind::Action => f.write_str("action"),
            SymbolKind::Object => f.write_str("object"),
        }
    }
}

/// A result classifier could not decide on a status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot classify result of {solver}: {message}")]
pub struct ClassificationError {
    pub solver: String,
    pub message: String,
}

impl ClassificationError {
    pub fn new(solver: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            solver: solver.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by a solve call.
///
/// Failures after the solver ran still carry its captured output.
#[derive(Error, Debug)]
pub enum SolveError {
    /// The solver process could not be run.
    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// The solver wrote a plan that could not be parsed.
    #[error("Plan generated by {solver} is invalid: {source}")]
    Plan {
        solver: String,
        logs: Vec<LogMessage>,
        #[source]
        source: PlanError,
    },

    /// The classifier could not decide on a status.
    #[error("{source}")]
    Classification {
        logs: Vec<LogMessage>,
        #[source]
        source: ClassificationError,
    },

    /// The temporary workspace could not be prepared or inspected.
    #[error("Workspace error: {0}")]
    Workspace(#[source] io::Error),
}

impl SolveError {
    /// Solver output captured before the failure; empty if it never ran.
    pub fn logs(&self) -> &[LogMessage] {
        match self {
            SolveError::Plan { logs, .. } | SolveError::Classification { logs, .. } => logs,
            _ => &[],
        }
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
        self.logs()
            .iter()
            .find(|m| m.level == level)
            .map(|m| m.text.as_str())
            .unwrap_or("")
    }
}

/// Convenience Result type for engine operations.
pub type Result<T, E = SolveError> = std::result::Result<T, E>;
