// SPDX-License-Identifier: MIT

//! Rule file and rule set types

use super::condition::Condition;
use crate::engine::{Environment, Value};
use crate::error::EvalError;
use serde::{Deserialize, Serialize};

/// A rule file as written on disk
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RuleFile {
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

/// A single rule before its condition is parsed
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleDefinition {
    /// Unique name of the rule
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Condition expression text
    pub when: String,
    /// Attributes the condition reads
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// A rule with its condition parsed
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub description: String,
    pub condition: Condition,
}

/// Rules in file order
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub(crate) fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Names of the rules whose condition passes, in file order
    pub fn matching(&self, env: &Environment) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| r.condition.is_pass(env))
            .map(|r| r.name.as_str())
            .collect()
    }

    /// Raw evaluation result of every rule, in file order
    pub fn evaluate_all<'a>(
        &'a self,
        env: &Environment,
    ) -> Vec<(&'a str, Result<Value, EvalError>)> {
        self.rules
            .iter()
            .map(|r| (r.name.as_str(), r.condition.evaluate(env)))
            .collect()
    }
}
