//! Plan text parser.
//!
//! Solvers write one action per line, e.g. `(move a b)`. Blank lines and
//! lines starting with `;` are skipped. Any other line that is not a single
//! well-formed action aborts the whole parse.

use std::path::Path;

use plancall_core::{ActionInstance, Plan, Problem};
use regex::Regex;
use tracing::debug;

use crate::error::{PlanError, SymbolKind};

const SKIP_PATTERN: &str = r"^\s*(;.*)?$";

const ACTION_PATTERN: &str = r"^\s*(?:\(\s*(?P<paren>[\w?-]+(?:\s+[\w?-]+)*)\s*\)|\[\s*(?P<bracket>[\w?-]+(?:\s+[\w?-]+)*)\s*\]|(?P<bare>[\w?-]+(?:\s+[\w?-]+)*))\s*$";

/// Parses plan text against a problem's registries.
#[derive(Debug, Clone)]
pub struct PlanParser {
    skip: Regex,
    action: Regex,
}

impl PlanParser {
    /// Compile the line patterns.
    pub fn new() -> Result<Self, PlanError> {
        Ok(Self {
            skip: Regex::new(SKIP_PATTERN)?,
            action: Regex::new(ACTION_PATTERN)?,
        })
    }

    /// Parse plan text into an ordered plan.
    pub fn parse(&self, problem: &Problem, text: &str) -> Result<Plan, PlanError> {
        let mut actions = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let line_number = idx + 1;
            if self.skip.is_match(line) {
                continue;
            }

            let body = self
                .action
                .captures(line)
                .and_then(|caps| {
                    caps.name("paren")
                        .or_else(|| caps.name("bracket"))
                        .or_else(|| caps.name("bare"))
                })
                .map(|m| m.as_str())
                .ok_or_else(|| PlanError::Malformed {
                    line_number,
                    line: line.to_string(),
                })?;

            actions.push(self.resolve(problem, body, line_number, line)?);
        }

        debug!(problem = problem.name(), actions = actions.len(), "parsed plan");
        Ok(Plan::new(actions))
    }

    /// Read and parse a plan file.
    pub async fn parse_file(
        &self,
        problem: &Problem,
        path: impl AsRef<Path>,
    ) -> Result<Plan, PlanError> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        self.parse(problem, &text)
    }

    fn resolve(
        &self,
        problem: &Problem,
        body: &str,
        line_number: usize,
        line: &str,
    ) -> Result<ActionInstance, PlanError> {
        let unknown = |kind: SymbolKind, name: &str| PlanError::UnknownSymbol {
            kind,
            name: name.to_string(),
            line_number,
            line: line.to_string(),
        };

        let mut tokens = body.split_whitespace();
        // The pattern guarantees at least one token.
        let name = tokens.next().unwrap_or_default();
        let action = problem
            .action(name)
            .ok_or_else(|| unknown(SymbolKind::Action, name))?;

        let parameters = tokens
            .map(|token| {
                problem
                    .object(token)
                    .ok_or_else(|| unknown(SymbolKind::Object, token))
            })
            .collect::<Result<Vec<_>, _>>()?;

        ActionInstance::new(action, parameters)
            .map_err(|source| PlanError::Arity { line_number, source })
    }
}

/// Parse plan text with a freshly compiled parser.
pub fn parse_plan(problem: &Problem, text: &str) -> Result<Plan, PlanError> {
    PlanParser::new()?.parse(problem, text)
}
