//! Solver orchestration.
//!
//! One `solve` call owns one scratch directory and one child process. The
//! directory is removed on every exit path when the [`tempfile::TempDir`]
//! guard drops.

use std::io;
use std::path::Path;
use std::time::Duration;

use plancall_core::{LogMessage, Plan, Problem, SolveOutcome, SolveStatus};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SolverConfig;
use crate::error::{Result, SolveError};
use crate::parser::PlanParser;
use crate::runner::{ExecutionResult, ProcessRunner, SolverCommand};
use crate::sink::OutputSink;
use crate::strategy::{CommandBuilder, ResultClassifier};
use crate::writer::ProblemWriter;

pub const DOMAIN_FILE: &str = "domain.pddl";
pub const PROBLEM_FILE: &str = "problem.pddl";
pub const PLAN_FILE: &str = "plan.txt";

/// A command-line PDDL solver driven through the filesystem.
pub struct PddlSolver<W, C, R> {
    config: SolverConfig,
    writer: W,
    command_builder: C,
    classifier: R,
    runner: ProcessRunner,
    parser: PlanParser,
}

impl<W, C, R> PddlSolver<W, C, R>
where
    W: ProblemWriter,
    C: CommandBuilder,
    R: ResultClassifier,
{
    /// Create a solver from its configuration and strategies.
    pub fn new(config: SolverConfig, writer: W, command_builder: C, classifier: R) -> Result<Self> {
        let runner = ProcessRunner::with_config(config.runner.clone());
        let parser = PlanParser::new().map_err(|source| SolveError::Plan {
            solver: config.name.clone(),
            logs: Vec::new(),
            source,
        })?;
        Ok(Self {
            config,
            writer,
            command_builder,
            classifier,
            runner,
            parser,
        })
    }

    /// Name reported in outcomes.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Get the solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run the solver once on `problem`.
    ///
    /// `timeout` overrides the configured default. A timeout is reported as
    /// [`SolveStatus::Timeout`]; spawn failures and unparseable plans are
    /// errors.
    pub async fn solve(
        &self,
        problem: &Problem,
        timeout: Option<Duration>,
        sink: Option<&mut dyn OutputSink>,
    ) -> Result<SolveOutcome> {
        let run_id = Uuid::new_v4();
        let timeout = timeout.or_else(|| self.config.timeout());
        info!(%run_id, solver = %self.config.name, problem = problem.name(), ?timeout, "solve started");

        let workspace = tempfile::Builder::new()
            .prefix("plancall-")
            .tempdir()
            .map_err(SolveError::Workspace)?;
        let domain_path = workspace.path().join(DOMAIN_FILE);
        let problem_path = workspace.path().join(PROBLEM_FILE);
        let plan_path = workspace.path().join(PLAN_FILE);

        self.writer
            .write_domain(problem, &domain_path)
            .await
            .map_err(SolveError::Workspace)?;
        self.writer
            .write_problem(problem, &problem_path)
            .await
            .map_err(SolveError::Workspace)?;

        let command = SolverCommand::new(self.command_builder.build_command(
            &domain_path,
            &problem_path,
            &plan_path,
        ))?;
        debug!(%run_id, %command, "running solver command");

        let ExecutionResult {
            timed_out,
            stdout,
            stderr,
            exit_code,
            elapsed,
            ..
        } = self.runner.run(&command, timeout, sink).await?;
        let logs = vec![LogMessage::info(stdout), LogMessage::error(stderr)];

        let plan = if plan_written(&plan_path).await? {
            match self.parser.parse_file(problem, &plan_path).await {
                Ok(plan) => Some(plan),
                Err(source) => {
                    warn!(%run_id, solver = %self.config.name, error = %source, "solver wrote an invalid plan");
                    return Err(SolveError::Plan {
                        solver: self.config.name.clone(),
                        logs,
                        source,
                    });
                }
            }
        } else {
            None
        };

        let status = if timed_out && exit_code != Some(0) {
            SolveStatus::Timeout
        } else {
            match self.classifier.classify(problem, plan.as_ref()) {
                Ok(status) => status,
                Err(source) => return Err(SolveError::Classification { logs, source }),
            }
        };
        info!(
            %run_id,
            %status,
            actions = ?plan.as_ref().map(Plan::len),
            elapsed_ms = elapsed.as_millis() as u64,
            "solve finished"
        );

        if let Err(err) = workspace.close() {
            warn!(%run_id, error = %err, "failed to remove solver workspace");
        }

        Ok(SolveOutcome::new(run_id, self.config.name.clone(), status, plan, logs)
            .with_elapsed_ms(elapsed.as_millis() as u64))
    }
}

/// Whether the solver left a plan file behind. Only a missing file means no plan.
async fn plan_written(path: &Path) -> Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(SolveError::Workspace(err)),
    }
}
