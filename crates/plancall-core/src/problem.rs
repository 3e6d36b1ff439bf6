//! Problem definition types.
//!
//! A [`Problem`] is the read-only registry a plan is resolved against: every
//! action and object a solver may mention, looked up by exact name. Entities
//! are held behind [`Arc`] so parsed plans reference them instead of copying.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

fn default_type() -> String {
    "object".to_string()
}

/// A typed parameter of an action schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name (without the leading `?`).
    pub name: String,

    /// PDDL type of the parameter.
    #[serde(rename = "type", default = "default_type")]
    pub type_name: String,
}

/// An action schema that plans may instantiate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Name the solver prints in its plan.
    pub name: String,

    /// Ordered parameters.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Action {
    /// Create an action with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    /// Add a typed parameter.
    pub fn parameter(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.parameters.push(Parameter {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    /// Number of parameters an instance must supply.
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// A named object of the problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    /// Object name.
    pub name: String,

    /// PDDL type of the object.
    #[serde(rename = "type", default = "default_type")]
    pub type_name: String,
}

impl Object {
    /// Create a typed object.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Name registries for one planning problem.
#[derive(Debug, Clone)]
pub struct Problem {
    name: String,
    actions: Vec<Arc<Action>>,
    objects: Vec<Arc<Object>>,
    action_index: HashMap<String, usize>,
    object_index: HashMap<String, usize>,
}

impl Problem {
    /// Create a new ProblemBuilder.
    pub fn builder(name: impl Into<String>) -> ProblemBuilder {
        ProblemBuilder::new(name)
    }

    /// Problem name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an action by exact, case-sensitive name.
    pub fn action(&self, name: &str) -> Option<Arc<Action>> {
        self.action_index
            .get(name)
            .map(|&idx| Arc::clone(&self.actions[idx]))
    }

    /// Look up an object by exact, case-sensitive name.
    pub fn object(&self, name: &str) -> Option<Arc<Object>> {
        self.object_index
            .get(name)
            .map(|&idx| Arc::clone(&self.objects[idx]))
    }

    /// All actions in definition order.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().map(|a| a.as_ref())
    }

    /// All objects in definition order.
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.iter().map(|o| o.as_ref())
    }

    /// Convert back into its serializable form.
    pub fn to_definition(&self) -> ProblemDefinition {
        ProblemDefinition {
            name: self.name.clone(),
            actions: self.actions().cloned().collect(),
            objects: self.objects().cloned().collect(),
        }
    }
}

/// Builder for creating Problems with a fluent API.
#[derive(Debug, Default)]
pub struct ProblemBuilder {
    name: String,
    actions: Vec<Action>,
    objects: Vec<Object>,
}

impl ProblemBuilder {
    /// Create a new ProblemBuilder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Register an action schema.
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Register an object.
    pub fn object(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.objects.push(Object::new(name, type_name));
        self
    }

    /// Register several untyped objects at once.
    pub fn objects<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.objects
            .extend(names.into_iter().map(|n| Object::new(n, default_type())));
        self
    }

    /// Build the Problem, rejecting empty and duplicate names.
    pub fn build(self) -> Result<Problem> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ProblemInvalid {
                message: "Problem name is required".to_string(),
            });
        }

        let mut action_index = HashMap::with_capacity(self.actions.len());
        for (idx, action) in self.actions.iter().enumerate() {
            if action.name.trim().is_empty() {
                return Err(CoreError::ProblemInvalid {
                    message: format!("Action name cannot be empty in problem {}", self.name),
                });
            }
            if action_index.insert(action.name.clone(), idx).is_some() {
                return Err(CoreError::DuplicateName {
                    kind: "action".to_string(),
                    name: action.name.clone(),
                });
            }
        }

        let mut object_index = HashMap::with_capacity(self.objects.len());
        for (idx, object) in self.objects.iter().enumerate() {
            if object.name.trim().is_empty() {
                return Err(CoreError::ProblemInvalid {
                    message: format!("Object name cannot be empty in problem {}", self.name),
                });
            }
            if object_index.insert(object.name.clone(), idx).is_some() {
                return Err(CoreError::DuplicateName {
                    kind: "object".to_string(),
                    name: object.name.clone(),
                });
            }
        }

        Ok(Problem {
            name: self.name,
            actions: self.actions.into_iter().map(Arc::new).collect(),
            objects: self.objects.into_iter().map(Arc::new).collect(),
            action_index,
            object_index,
        })
    }
}

/// Serializable form of a [`Problem`], as loaded from a definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDefinition {
    /// Problem name.
    pub name: String,

    /// Action schemas.
    #[serde(default)]
    pub actions: Vec<Action>,

    /// Objects.
    #[serde(default)]
    pub objects: Vec<Object>,
}

impl ProblemDefinition {
    /// Parse a definition from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validate and index the definition.
    pub fn into_problem(self) -> Result<Problem> {
        let mut builder = ProblemBuilder::new(self.name);
        builder.actions = self.actions;
        builder.objects = self.objects;
        builder.build()
    }
}
