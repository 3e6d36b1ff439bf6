//! Command-line arguments and solver profiles.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use plancall_engine::{CommandTemplate, SolverConfig};
use serde::{Deserialize, Serialize};

/// Run a PDDL solver once and print the plan it finds.
#[derive(Debug, Parser)]
#[command(name = "plancall", version, about)]
pub struct Cli {
    /// PDDL domain file handed to the solver.
    #[arg(long, value_name = "PDDL_FILENAME")]
    pub domain: PathBuf,

    /// PDDL problem file handed to the solver.
    #[arg(long, value_name = "PDDL_FILENAME")]
    pub problem: PathBuf,

    /// JSON file listing the actions and objects plans may mention.
    #[arg(long, value_name = "JSON_FILENAME")]
    pub definition: PathBuf,

    /// JSON solver profile with name, command template and timeout.
    #[arg(long, value_name = "JSON_FILENAME")]
    pub profile: Option<PathBuf>,

    /// Solver name reported in the outcome.
    #[arg(long)]
    pub name: Option<String>,

    /// Timeout in seconds for the solver.
    #[arg(long, env = "PLANCALL_TIMEOUT")]
    pub timeout: Option<f64>,

    /// File where the plan is written.
    #[arg(long = "plan", value_name = "PLAN_FILENAME")]
    pub plan_out: Option<PathBuf>,

    /// Print the full outcome as JSON.
    #[arg(long)]
    pub json: bool,

    /// Do not echo solver output while it runs.
    #[arg(long, short)]
    pub quiet: bool,

    /// Solver command; `{domain}`, `{problem}` and `{plan}` are substituted.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Solver settings stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverProfile {
    #[serde(flatten)]
    pub config: SolverConfig,

    /// Command template.
    pub command: CommandTemplate,
}

impl SolverProfile {
    /// Load a profile from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading solver profile {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing solver profile {}", path.display()))
    }
}

impl Cli {
    /// Merge the optional profile with command-line overrides.
    pub fn resolve(&self, profile: Option<SolverProfile>) -> anyhow::Result<SolverProfile> {
        let mut resolved = match profile {
            Some(profile) => profile,
            None => {
                if self.command.is_empty() {
                    bail!("no solver command given; pass --profile or a command after `--`");
                }
                SolverProfile {
                    config: SolverConfig::new(program_name(&self.command[0])),
                    command: CommandTemplate::new(self.command.clone()),
                }
            }
        };

        if !self.command.is_empty() {
            resolved.command = CommandTemplate::new(self.command.clone());
        }
        if resolved.command.is_empty() {
            bail!("solver profile has an empty command");
        }
        if let Some(name) = &self.name {
            resolved.config.name = name.clone();
        }
        if let Some(timeout) = self.timeout()? {
            resolved.config = resolved.config.with_timeout(timeout);
        }
        Ok(resolved)
    }

    /// Parsed `--timeout`, rejecting non-positive values.
    pub fn timeout(&self) -> anyhow::Result<Option<Duration>> {
        match self.timeout {
            None => Ok(None),
            Some(secs) if secs.is_finite() && secs > 0.0 => Ok(Some(Duration::from_secs_f64(secs))),
            Some(secs) => bail!("timeout must be a positive number of seconds, got {secs}"),
        }
    }
}

fn program_name(program: &str) -> String {
    Path::new(program)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["plancall", "--domain", "d.pddl", "--problem", "p.pddl", "--definition", "defs.json"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_command_after_separator() {
        let cli = parse(&["--timeout", "2.5", "--", "/opt/ff/ff", "-o", "{domain}", "-f", "{problem}"]);
        let profile = cli.resolve(None).unwrap();

        assert_eq!(profile.config.name, "ff");
        assert_eq!(profile.config.timeout_ms, Some(2_500));
        assert_eq!(profile.command.argv()[2], "{domain}");
    }

    #[test]
    fn test_missing_command_rejected() {
        let cli = parse(&[]);
        assert!(cli.resolve(None).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let cli = parse(&["--timeout", "0", "--", "ff"]);
        assert!(cli.resolve(None).is_err());
    }

    #[test]
    fn test_profile_overrides() {
        let profile: SolverProfile = serde_json::from_str(
            r#"{"name": "enhsp", "timeout_ms": 60000, "command": ["java", "-jar", "enhsp.jar", "-o", "{domain}"]}"#,
        )
        .unwrap();
        let cli = parse(&["--name", "enhsp-fast"]);
        let resolved = cli.resolve(Some(profile)).unwrap();

        assert_eq!(resolved.config.name, "enhsp-fast");
        assert_eq!(resolved.config.timeout_ms, Some(60_000));
        assert_eq!(resolved.command.argv()[0], "java");
    }

    #[test]
    fn test_load_profile_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ff.json");
        std::fs::write(&path, r#"{"name": "ff", "command": ["ff", "{domain}", "{problem}"], "runner": {"poll_interval_ms": 100}}"#).unwrap();

        let profile = SolverProfile::load(&path).unwrap();
        assert_eq!(profile.config.runner.poll_interval_ms, 100);
        assert_eq!(profile.config.timeout_ms, None);
    }
}
