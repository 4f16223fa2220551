// SPDX-License-Identifier: MIT

//! Pass/fail gate over an expression

use crate::engine::{evaluate, parse, Environment, Expression, Value};
use crate::error::{EvalError, ParseError};
use serde::{Deserialize, Serialize};

/// A parsed condition, storable as JSON alongside the text it came from
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Condition {
    /// Original expression text
    pub source: String,
    /// Attribute names the condition is declared to read
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Parsed tree
    pub node: Expression,
}

impl Condition {
    /// Parse a condition from expression text
    pub fn parse(source: impl Into<String>) -> Result<Self, ParseError> {
        let source = source.into();
        let node = parse(&source)?;
        Ok(Self {
            source,
            attributes: Vec::new(),
            node,
        })
    }

    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Evaluate without interpreting the result
    pub fn evaluate(&self, env: &Environment) -> Result<Value, EvalError> {
        evaluate(&self.node, env)
    }

    /// True only when the condition evaluates to boolean `true`.
    ///
    /// Evaluation errors and non-boolean results count as not satisfied.
    pub fn is_pass(&self, env: &Environment) -> bool {
        match self.evaluate(env) {
            Ok(Value::Bool(b)) => b,
            Ok(other) => {
                log::warn!(
                    "Condition '{}' produced {} instead of bool",
                    self.source,
                    other.value_type()
                );
                false
            }
            Err(e) => {
                log::warn!("Failed to evaluate condition '{}': {}", self.source, e);
                false
            }
        }
    }
}
