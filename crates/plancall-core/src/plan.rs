//! Sequential plans resolved against a [`Problem`](crate::Problem).

use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::{CoreError, Result};
use crate::problem::{Action, Object};

/// One application of an action to concrete objects.
///
/// Immutable once constructed; the action and objects stay owned by the
/// problem they were resolved from.
#[derive(Debug, Clone)]
pub struct ActionInstance {
    action: Arc<Action>,
    parameters: Vec<Arc<Object>>,
}

impl ActionInstance {
    /// Create an instance, checking the parameter count against the schema.
    pub fn new(action: Arc<Action>, parameters: Vec<Arc<Object>>) -> Result<Self> {
        if parameters.len() != action.arity() {
            return Err(CoreError::ArityMismatch {
                action: action.name.clone(),
                expected: action.arity(),
                actual: parameters.len(),
            });
        }
        Ok(Self { action, parameters })
    }

    /// The instantiated action schema.
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Shared handle to the action schema.
    pub fn action_handle(&self) -> Arc<Action> {
        Arc::clone(&self.action)
    }

    /// Actual parameters in order.
    pub fn parameters(&self) -> &[Arc<Object>] {
        &self.parameters
    }

    /// Parameter names in order.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Render as a single PDDL plan line, e.g. `(move a b)`.
    pub fn to_pddl(&self) -> String {
        let mut line = format!("({}", self.action.name);
        for param in &self.parameters {
            line.push(' ');
            line.push_str(&param.name);
        }
        line.push(')');
        line
    }
}

impl PartialEq for ActionInstance {
    fn eq(&self, other: &Self) -> bool {
        self.action.name == other.action.name
            && self.parameter_names() == other.parameter_names()
    }
}

impl Eq for ActionInstance {}

impl fmt::Display for ActionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.action.name, self.parameter_names().join(", "))
    }
}

impl Serialize for ActionInstance {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ActionInstance", 2)?;
        state.serialize_field("action", &self.action.name)?;
        state.serialize_field("parameters", &self.parameter_names())?;
        state.end()
    }
}

/// A totally ordered plan. Order is execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    actions: Vec<ActionInstance>,
}

impl Plan {
    /// Create a plan from actions in execution order.
    pub fn new(actions: Vec<ActionInstance>) -> Self {
        Self { actions }
    }

    /// Actions in execution order.
    pub fn actions(&self) -> &[ActionInstance] {
        &self.actions
    }

    /// Iterate over the actions in execution order.
    pub fn iter(&self) -> std::slice::Iter<'_, ActionInstance> {
        self.actions.iter()
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True if the plan has no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Serialize as plan text, one `(name p1 p2)` line per action.
    pub fn to_pddl(&self) -> String {
        self.actions
            .iter()
            .map(|a| a.to_pddl() + "\n")
            .collect()
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a ActionInstance;
    type IntoIter = std::slice::Iter<'a, ActionInstance>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, action) in self.actions.iter().enumerate() {
            writeln!(f, "{:>4}: {}", idx, action)?;
        }
        Ok(())
    }
}
