//! Writers that materialise solver input files.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use plancall_core::Problem;

/// Writes the domain and problem files a solver reads.
#[async_trait]
pub trait ProblemWriter: Send + Sync {
    /// Write the domain file to `path`.
    async fn write_domain(&self, problem: &Problem, path: &Path) -> io::Result<()>;

    /// Write the problem file to `path`.
    async fn write_problem(&self, problem: &Problem, path: &Path) -> io::Result<()>;
}

/// Copies prewritten PDDL files into the solver workspace.
#[derive(Debug, Clone)]
pub struct PddlFileWriter {
    domain: PathBuf,
    problem: PathBuf,
}

impl PddlFileWriter {
    /// Create a writer for the given source files.
    pub fn new(domain: impl Into<PathBuf>, problem: impl Into<PathBuf>) -> Self {
        Self {
            domain: domain.into(),
            problem: problem.into(),
        }
    }
}

#[async_trait]
impl ProblemWriter for PddlFileWriter {
    async fn write_domain(&self, _problem: &Problem, path: &Path) -> io::Result<()> {
        tokio::fs::copy(&self.domain, path).await.map(|_| ())
    }

    async fn write_problem(&self, _problem: &Problem, path: &Path) -> io::Result<()> {
        tokio::fs::copy(&self.problem, path).await.map(|_| ())
    }
}

/// Writes fixed strings; handy when the PDDL is generated in memory.
#[derive(Debug, Clone)]
pub struct PddlTextWriter {
    domain: String,
    problem: String,
}

impl PddlTextWriter {
    pub fn new(domain: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            problem: problem.into(),
        }
    }
}

#[async_trait]
impl ProblemWriter for PddlTextWriter {
    async fn write_domain(&self, _problem: &Problem, path: &Path) -> io::Result<()> {
        tokio::fs::write(path, &self.domain).await
    }

    async fn write_problem(&self, _problem: &Problem, path: &Path) -> io::Result<()> {
        tokio::fs::write(path, &self.problem).await
    }
}
