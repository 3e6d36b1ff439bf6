//! End-to-end solve scenarios against mock planner scripts.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use plancall_core::{Action, LogLevel, Problem, SolveStatus};
use plancall_engine::{
    PddlSolver, PddlTextWriter, PlanError, PlanPresenceClassifier, RunnerConfig, SolveError,
    SolverConfig,
};
use tempfile::TempDir;

fn problem() -> Problem {
    Problem::builder("logistics")
        .action(
            Action::new("move")
                .parameter("from", "location")
                .parameter("to", "location"),
        )
        .object("a", "location")
        .object("b", "location")
        .build()
        .unwrap()
}

fn config() -> SolverConfig {
    let mut config = SolverConfig::new("echo_planner");
    config.runner = RunnerConfig {
        poll_interval_ms: 50,
        kill_wait_ms: 500,
        ..RunnerConfig::default()
    };
    config
}

fn writer() -> PddlTextWriter {
    PddlTextWriter::new(
        "(define (domain logistics) (:action move :parameters (?from ?to)))",
        "(define (problem p) (:domain logistics) (:objects a b))",
    )
}

/// Write an executable `echo_planner` script whose body sees the domain
/// file as `$1`, the problem file as `$2` and the plan file as `$PLAN`.
fn mock_planner(body: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("echo_planner");
    let script = format!("#!/bin/sh\nPLAN=\"$(dirname \"$1\")/plan.txt\"\n{body}\n");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    (dir, path)
}

fn solver_for(
    script: PathBuf,
    config: SolverConfig,
) -> PddlSolver<
    PddlTextWriter,
    impl Fn(&Path, &Path, &Path) -> Vec<String> + Send + Sync,
    PlanPresenceClassifier,
> {
    let builder = move |domain: &Path, problem: &Path, _plan: &Path| {
        vec![
            script.display().to_string(),
            domain.display().to_string(),
            problem.display().to_string(),
        ]
    };
    PddlSolver::new(config, writer(), builder, PlanPresenceClassifier).unwrap()
}

#[tokio::test]
async fn test_successful_run_yields_plan() {
    let (_dir, script) = mock_planner("echo 'solving'\necho '(move a b)' > \"$PLAN\"\nexit 0");
    let solver = solver_for(script, config());

    let outcome = solver
        .solve(&problem(), Some(Duration::from_secs(10)), None)
        .await
        .unwrap();

    assert_eq!(outcome.status, SolveStatus::Success);
    assert_eq!(outcome.solver_name, "echo_planner");
    let plan = outcome.plan.unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.actions()[0].action().name, "move");
    assert_eq!(plan.actions()[0].parameter_names(), vec!["a", "b"]);
}

#[tokio::test]
async fn test_slow_planner_times_out() {
    let (_dir, script) = mock_planner("exec sleep 30");
    let solver = solver_for(script, config());

    let outcome = solver
        .solve(&problem(), Some(Duration::from_secs_f64(1.0)), None)
        .await
        .unwrap();

    assert_eq!(outcome.status, SolveStatus::Timeout);
    assert!(outcome.plan.is_none());
    assert_eq!(outcome.logs.len(), 2);
    assert_eq!(outcome.logs[0].level, LogLevel::Info);
    assert_eq!(outcome.logs[1].level, LogLevel::Error);
    assert!(outcome.elapsed_ms < 10_000);
}

#[tokio::test]
async fn test_unbalanced_plan_is_a_parse_error() {
    let (_dir, script) =
        mock_planner("echo 'diagnostic from solver'\necho '(move a b' > \"$PLAN\"");
    let solver = solver_for(script, config());

    let err = solver
        .solve(&problem(), Some(Duration::from_secs(10)), None)
        .await
        .unwrap_err();

    assert_eq!(err.stdout(), "diagnostic from solver\n");
    match err {
        SolveError::Plan { solver, source: PlanError::Malformed { line, .. }, .. } => {
            assert_eq!(solver, "echo_planner");
            assert_eq!(line, "(move a b");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_action_is_not_masked_as_no_plan() {
    let (_dir, script) = mock_planner("echo '(fly a b)' > \"$PLAN\"");
    let solver = solver_for(script, config());

    let err = solver.solve(&problem(), None, None).await.unwrap_err();
    assert!(matches!(
        err,
        SolveError::Plan { source: PlanError::UnknownSymbol { .. }, .. }
    ));
}

#[tokio::test]
async fn test_missing_plan_is_classified() {
    let (_dir, script) = mock_planner("echo 'no solution' >&2\nexit 1");
    let solver = solver_for(script, config());

    let outcome = solver.solve(&problem(), None, None).await.unwrap();
    assert_eq!(outcome.status, SolveStatus::Unsolvable);
    assert_eq!(outcome.stderr(), "no solution\n");
}

// A planner that exits 0 while a background child still holds its output
// open hits the deadline with a clean exit code; the classifier decides.
#[tokio::test]
async fn test_deadline_with_clean_exit_is_not_timeout() {
    let (_dir, script) = mock_planner("echo '(move a b)' > \"$PLAN\"\nsleep 3 &\nexit 0");
    let solver = solver_for(script, config());

    let outcome = solver
        .solve(&problem(), Some(Duration::from_millis(500)), None)
        .await
        .unwrap();

    assert_eq!(outcome.status, SolveStatus::Success);
    assert_eq!(outcome.plan.unwrap().len(), 1);
}
