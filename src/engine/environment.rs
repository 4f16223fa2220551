// SPDX-License-Identifier: MIT

//! Variable and function bindings for evaluation
//!
//! An [`Environment`] is built by the caller and only read by the evaluator.

use super::value::Value;
use crate::error::{EvalError, RuleError};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A host function callable from expressions
pub type Function = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// Read-only bindings an expression is evaluated against
#[derive(Clone, Default)]
pub struct Environment {
    variables: HashMap<String, Value>,
    functions: HashMap<String, Function>,
}

impl Environment {
    /// Create an empty Environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable, replacing any previous binding
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Builder form of [`Environment::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Register a function, replacing any previous one with the same name
    pub fn register_function<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
    }

    /// Builder form of [`Environment::register_function`]
    pub fn with_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.register_function(name, function);
        self
    }

    /// Register `len`, `lower` and `upper`
    pub fn with_builtins(self) -> Self {
        self.with_function("len", builtin_len)
            .with_function("lower", |args: &[Value]| {
                single_string("lower", args).map(|s| Value::String(s.to_lowercase()))
            })
            .with_function("upper", |args: &[Value]| {
                single_string("upper", args).map(|s| Value::String(s.to_uppercase()))
            })
    }

    /// Get a variable value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Get a registered function
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Resolve a variable and walk its field path (`user.address.country`)
    pub fn resolve(&self, name: &str, path: &[String]) -> Result<&Value, EvalError> {
        let mut current = self
            .variables
            .get(name)
            .ok_or_else(|| EvalError::VariableNotFound(name.to_string()))?;

        for (i, field) in path.iter().enumerate() {
            current = match current {
                Value::Map(_) | Value::Struct(_) => current
                    .get(field)
                    .ok_or_else(|| EvalError::VariableNotFound(dotted(name, &path[..=i])))?,
                other => {
                    return Err(EvalError::NotIndexable {
                        name: dotted(name, &path[..i]),
                        found: other.value_type(),
                    })
                }
            };
        }
        Ok(current)
    }

    /// Get all variable names
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.variables.keys()
    }

    /// Build an Environment from a JSON object
    pub fn from_json(json: serde_json::Value) -> Result<Self, RuleError> {
        match json {
            serde_json::Value::Object(entries) => Ok(Self {
                variables: entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
                functions: HashMap::new(),
            }),
            other => Err(RuleError::config(format!(
                "variables must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Load variables from a JSON or YAML file, chosen by extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RuleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let json: serde_json::Value = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };
        log::debug!("loaded variables from {}", path.display());
        Self::from_json(json)
    }

    /// Move every binding of `other` into this environment, overriding on conflict
    pub fn merge(&mut self, other: Environment) {
        self.variables.extend(other.variables);
        self.functions.extend(other.functions);
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<&String> = self.functions.keys().collect();
        functions.sort();
        f.debug_struct("Environment")
            .field("variables", &self.variables)
            .field("functions", &functions)
            .finish()
    }
}

fn dotted(name: &str, path: &[String]) -> String {
    std::iter::once(name)
        .chain(path.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(".")
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn builtin_len(args: &[Value]) -> Result<Value, String> {
    let [arg] = args else {
        return Err(format!("expected 1 argument, got {}", args.len()));
    };
    let len = match arg {
        Value::String(s) => s.chars().count(),
        Value::Array(items) | Value::Set(items) => items.len(),
        Value::Map(entries) | Value::Struct(entries) => entries.len(),
        other => return Err(format!("{} has no length", other.value_type())),
    };
    i64::try_from(len)
        .map(Value::Int64)
        .map_err(|_| "length does not fit int64".to_string())
}

fn single_string<'a>(name: &str, args: &'a [Value]) -> Result<&'a str, String> {
    match args {
        [Value::String(s)] => Ok(s),
        [other] => Err(format!("{} expects a string, got {}", name, other.value_type())),
        _ => Err(format!("expected 1 argument, got {}", args.len())),
    }
}
