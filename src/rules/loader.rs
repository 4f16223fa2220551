// SPDX-License-Identifier: MIT

//! Rule loader - YAML file loading and parsing
//!
//! Every `when` expression is parsed at load time, so a loaded [`RuleSet`]
//! never holds a rule that cannot be evaluated.

use super::condition::Condition;
use super::types::{Rule, RuleFile, RuleSet};
use crate::error::RuleError;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Loads rule sets from YAML files
pub struct RuleLoader;

impl RuleLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a rule set from a YAML file
    pub fn load_rules<P: AsRef<Path>>(&self, path: P) -> Result<RuleSet, RuleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let rules = Self::parse_yaml(&content)?;
        log::info!("Loaded {} rules from {}", rules.len(), path.display());
        Ok(rules)
    }

    /// Parse a rule set from a YAML string
    pub fn parse_yaml(content: &str) -> Result<RuleSet, RuleError> {
        let file: RuleFile = serde_yaml::from_str(content)?;
        Self::compile(file)
    }

    /// Parse every rule condition, rejecting duplicate names
    pub fn compile(file: RuleFile) -> Result<RuleSet, RuleError> {
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(file.rules.len());

        for def in file.rules {
            if !seen.insert(def.name.clone()) {
                return Err(RuleError::config(format!(
                    "duplicate rule name '{}'",
                    def.name
                )));
            }

            let condition = Condition::parse(def.when)
                .map_err(|e| RuleError::invalid_rule(&def.name, e))?
                .with_attributes(def.attributes);
            log::debug!("Compiled rule '{}': {}", def.name, condition.node);

            rules.push(Rule {
                name: def.name,
                description: def.description,
                condition,
            });
        }

        Ok(RuleSet::new(rules))
    }
}

impl Default for RuleLoader {
    fn default() -> Self {
        Self::new()
    }
}
