// SPDX-License-Identifier: MIT

//! Typed error handling for rulekit
//!
//! Each layer has its own error enum: [`ParseError`] for lexing and parsing,
//! [`EvalError`] for evaluation, and [`RuleError`] at the crate boundary where
//! files, rule sets and configuration come into play.

use crate::engine::ValueType;
use std::fmt;
use thiserror::Error;

/// Top-level error type for rulekit
#[derive(Debug, Error)]
pub enum RuleError {
    /// Expression text could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Expression could not be evaluated
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// A rule in a rule set failed to parse
    #[error("Invalid rule '{name}': {source}")]
    InvalidRule {
        name: String,
        #[source]
        source: ParseError,
    },

    /// Configuration errors (bad variable files, duplicate rule names)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl RuleError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid rule error
    pub fn invalid_rule(name: impl Into<String>, source: ParseError) -> Self {
        Self::InvalidRule {
            name: name.into(),
            source,
        }
    }
}

/// Lexical and syntactic errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The lexer produced an error token
    #[error("{message} at line {line}, column {column}")]
    Lexical {
        message: String,
        line: usize,
        column: usize,
    },

    /// A token other than the expected one was found
    #[error("Expected {expected} but found '{found}' at line {line}, column {column}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },

    /// Input ended while a token was still expected
    #[error("Unexpected end of expression, expected {expected}")]
    UnexpectedEof { expected: String },

    /// A complete expression was followed by more input
    #[error("Unexpected token at end of expression: '{found}' at line {line}, column {column}")]
    TrailingInput {
        found: String,
        line: usize,
        column: usize,
    },

    /// A number token that is neither an integer nor a float
    #[error("Invalid number '{literal}' at line {line}, column {column}")]
    InvalidNumber {
        literal: String,
        line: usize,
        column: usize,
    },

    /// Nesting exceeded the parser's depth limit
    #[error("Expression nested deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// Which operand of an operator an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    /// The single operand of a unary operator
    Operand,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left operand"),
            Side::Right => write!(f, "right operand"),
            Side::Operand => write!(f, "operand"),
        }
    }
}

/// Semantic and runtime errors raised while evaluating an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Operator is not defined for this pair of operand types
    #[error("Cannot apply '{operator}' to {left} and {right}")]
    TypeMismatch {
        operator: &'static str,
        left: ValueType,
        right: ValueType,
    },

    /// Logical operator received a non-boolean operand
    #[error("{side} of '{operator}' must be bool, got {found}")]
    NonBooleanOperand {
        operator: &'static str,
        side: Side,
        found: ValueType,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Modulo by zero")]
    ModuloByZero,

    /// Integer result does not fit the operand width
    #[error("Integer overflow in '{operator}'")]
    Overflow { operator: &'static str },

    #[error("Variable '{0}' not found")]
    VariableNotFound(String),

    /// Member access on a value without fields
    #[error("Cannot access field of '{name}': {found} has no fields")]
    NotIndexable { name: String, found: ValueType },

    #[error("Function '{0}' not found")]
    FunctionNotFound(String),

    /// A host function returned an error
    #[error("Function '{name}' failed: {message}")]
    Function { name: String, message: String },

    /// Right operand of `matches` is not a valid regular expression
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}
