//! Solver-specific strategies plugged into the orchestrator.
//!
//! Each solver family decides how it is invoked and how its result is read.
//! Both decisions are supplied from outside so the orchestrator holds no
//! solver knowledge. Plain closures work for both.

use std::path::Path;

use plancall_core::{Plan, Problem, SolveStatus};
use serde::{Deserialize, Serialize};

use crate::error::ClassificationError;

/// Builds the argument vector that runs a solver.
pub trait CommandBuilder: Send + Sync {
    /// Produce the command for the given domain, problem and plan paths.
    fn build_command(&self, domain: &Path, problem: &Path, plan: &Path) -> Vec<String>;
}

impl<F> CommandBuilder for F
where
    F: Fn(&Path, &Path, &Path) -> Vec<String> + Send + Sync,
{
    fn build_command(&self, domain: &Path, problem: &Path, plan: &Path) -> Vec<String> {
        self(domain, problem, plan)
    }
}

/// Decides the status of a run that did not time out.
pub trait ResultClassifier: Send + Sync {
    /// Classify the run from the problem and the parsed plan, if any.
    fn classify(
        &self,
        problem: &Problem,
        plan: Option<&Plan>,
    ) -> Result<SolveStatus, ClassificationError>;
}

impl<F> ResultClassifier for F
where
    F: Fn(&Problem, Option<&Plan>) -> Result<SolveStatus, ClassificationError> + Send + Sync,
{
    fn classify(
        &self,
        problem: &Problem,
        plan: Option<&Plan>,
    ) -> Result<SolveStatus, ClassificationError> {
        self(problem, plan)
    }
}

/// Argument vector with `{domain}`, `{problem}` and `{plan}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandTemplate {
    argv: Vec<String>,
}

impl CommandTemplate {
    pub const DOMAIN: &'static str = "{domain}";
    pub const PROBLEM: &'static str = "{problem}";
    pub const PLAN: &'static str = "{plan}";

    /// Create a template from raw arguments.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
        }
    }

    /// True if the template has no program.
    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    /// Raw template arguments.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl CommandBuilder for CommandTemplate {
    fn build_command(&self, domain: &Path, problem: &Path, plan: &Path) -> Vec<String> {
        let domain = domain.to_string_lossy();
        let problem = problem.to_string_lossy();
        let plan = plan.to_string_lossy();
        self.argv
            .iter()
            .map(|arg| {
                arg.replace(Self::DOMAIN, &domain)
                    .replace(Self::PROBLEM, &problem)
                    .replace(Self::PLAN, &plan)
            })
            .collect()
    }
}

/// Success when a plan was written, unsolvable otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanPresenceClassifier;

impl ResultClassifier for PlanPresenceClassifier {
    fn classify(
        &self,
        _problem: &Problem,
        plan: Option<&Plan>,
    ) -> Result<SolveStatus, ClassificationError> {
        Ok(match plan {
            Some(_) => SolveStatus::Success,
            None => SolveStatus::Unsolvable,
        })
    }
}
