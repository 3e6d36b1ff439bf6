//! # Plancall Core
//!
//! Core types shared by the plancall engine and binary.
//!
//! This crate provides the fundamental building blocks:
//! - [`Problem`] - Read-only registry of actions and objects
//! - [`Plan`] - Ordered sequence of resolved action instances
//! - [`SolveOutcome`] - Classified result of one solver run
//! - [`CoreError`] - Definition and validation errors

pub mod error;
pub mod outcome;
pub mod plan;
pub mod problem;
pub mod types;

// Re-exports for convenience
pub use error::{CoreError, Result};
pub use outcome::{LogMessage, SolveOutcome};
pub use plan::{ActionInstance, Plan};
pub use problem::{Action, Object, Parameter, Problem, ProblemBuilder, ProblemDefinition};
pub use types::*;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{CoreError, Result};
    pub use crate::outcome::{LogMessage, SolveOutcome};
    pub use crate::plan::{ActionInstance, Plan};
    pub use crate::problem::{Action, Object, Parameter, Problem, ProblemBuilder};
    pub use crate::types::{LogLevel, SolveStatus};
}
