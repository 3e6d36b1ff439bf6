//! One solver run from the command line.

use std::path::Path;

use anyhow::Context;
use plancall_core::{Problem, ProblemDefinition, SolveOutcome, SolveStatus};
use plancall_engine::{ConsoleSink, OutputSink, PddlFileWriter, PddlSolver, PlanPresenceClassifier};
use tracing::info;

use crate::cli::{Cli, SolverProfile};

/// Load inputs, run the solver and report the outcome.
pub async fn run(cli: &Cli) -> anyhow::Result<SolveStatus> {
    let profile = cli.profile.as_deref().map(SolverProfile::load).transpose()?;
    let SolverProfile { config, command } = cli.resolve(profile)?;
    let problem = load_problem(&cli.definition).await?;

    info!(
        solver = %config.name,
        problem = problem.name(),
        timeout_ms = ?config.timeout_ms,
        "🚀 running solver"
    );

    let writer = PddlFileWriter::new(&cli.domain, &cli.problem);
    let solver = PddlSolver::new(config, writer, command, PlanPresenceClassifier)?;

    let mut console = ConsoleSink::stderr_only();
    let sink: Option<&mut dyn OutputSink> = if cli.quiet { None } else { Some(&mut console) };
    let outcome = match solver.solve(&problem, None, sink).await {
        Ok(outcome) => outcome,
        Err(err) => {
            // Live output was suppressed; show what the solver said before failing.
            if cli.quiet {
                eprint!("{}{}", err.stdout(), err.stderr());
            }
            return Err(err.into());
        }
    };

    report(cli, &outcome).await?;
    Ok(outcome.status)
}

async fn load_problem(path: &Path) -> anyhow::Result<Problem> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading problem definition {}", path.display()))?;
    let problem = ProblemDefinition::from_json(&text)
        .and_then(ProblemDefinition::into_problem)
        .with_context(|| format!("invalid problem definition {}", path.display()))?;
    Ok(problem)
}

async fn report(cli: &Cli, outcome: &SolveOutcome) -> anyhow::Result<()> {
    if let (Some(path), Some(plan)) = (&cli.plan_out, &outcome.plan) {
        tokio::fs::write(path, plan.to_pddl())
            .await
            .with_context(|| format!("writing plan to {}", path.display()))?;
    }

    if cli.json {
        println!("{}", outcome.to_json()?);
        return Ok(());
    }

    println!("status: {}", outcome.status);
    if let Some(plan) = &outcome.plan {
        print!("{}", plan.to_pddl());
    }
    info!(
        run_id = %outcome.run_id,
        status = %outcome.status,
        elapsed_ms = outcome.elapsed_ms,
        "✅ solver finished"
    );
    Ok(())
}
