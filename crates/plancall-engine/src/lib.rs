//! # Plancall Engine
//!
//! Runs command-line PDDL solvers as child processes under a deadline and
//! turns the plan files they write into typed [`Plan`](plancall_core::Plan)s.

pub mod config;
pub mod error;
pub mod parser;
pub mod runner;
pub mod sink;
pub mod solver;
pub mod strategy;
pub mod writer;

pub use config::{RunnerConfig, SolverConfig};
pub use error::{ClassificationError, PlanError, Result, RunnerError, SolveError, SymbolKind};
pub use parser::{parse_plan, PlanParser};
pub use runner::{ExecutionResult, ProcessRunner, SolverCommand};
pub use sink::{ConsoleSink, OutputSink, StreamKind};
pub use solver::PddlSolver;
pub use strategy::{CommandBuilder, CommandTemplate, PlanPresenceClassifier, ResultClassifier};
pub use writer::{PddlFileWriter, PddlTextWriter, ProblemWriter};
