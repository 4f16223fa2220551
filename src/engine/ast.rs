// SPDX-License-Identifier: MIT

//! Abstract Syntax Tree for rule expressions
//!
//! Trees are plain data: built once by the parser, never mutated, and
//! serializable so rule stores can keep them without the source text.

use super::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rule expression
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    /// Literal bool, integer, float or string
    Literal { value: Value },
    /// Variable reference, optionally followed by a dotted field path
    Variable {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        path: Vec<String>,
    },
    /// Unary operator applied to one operand
    Unary {
        operator: UnaryOp,
        operand: Box<Expression>,
    },
    /// Binary operator applied to two operands
    Binary {
        operator: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// List literal, evaluates to an array
    List { items: Vec<Expression> },
    /// Call of a function registered in the environment
    Call {
        function: String,
        #[serde(default)]
        args: Vec<Expression>,
    },
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal {
            value: value.into(),
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable {
            name: name.into(),
            path: Vec::new(),
        }
    }

    pub fn unary(operator: UnaryOp, operand: Expression) -> Self {
        Expression::Unary {
            operator,
            operand: Box::new(operand),
        }
    }

    pub fn binary(operator: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Names of all variables the expression reads, in order of first use
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expression::Literal { .. } => {}
            Expression::Variable { name, .. } => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expression::Unary { operand, .. } => operand.collect_variables(names),
            Expression::Binary { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Expression::List { items: args } | Expression::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum UnaryOp {
    #[serde(rename = "!")]
    Not,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum BinaryOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "xor")]
    Xor,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "**")]
    Pow,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "<<")]
    Shl,
    #[serde(rename = ">>")]
    Shr,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "startsWith")]
    StartsWith,
    #[serde(rename = "endsWith")]
    EndsWith,
    #[serde(rename = "matches")]
    Matches,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Xor => "xor",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::In => "in",
            BinaryOp::Contains => "contains",
            BinaryOp::StartsWith => "startsWith",
            BinaryOp::EndsWith => "endsWith",
            BinaryOp::Matches => "matches",
        }
    }

    /// Inverse of [`BinaryOp::symbol`]; `==` is accepted as an alias of `=`
    pub fn from_symbol(symbol: &str) -> Option<BinaryOp> {
        let op = match symbol {
            "=" | "==" => BinaryOp::Eq,
            "!=" => BinaryOp::NotEq,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Lte,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Gte,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            "xor" => BinaryOp::Xor,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "**" => BinaryOp::Pow,
            "&" => BinaryOp::BitAnd,
            "|" => BinaryOp::BitOr,
            "^" => BinaryOp::BitXor,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            "in" => BinaryOp::In,
            "contains" => BinaryOp::Contains,
            "startsWith" => BinaryOp::StartsWith,
            "endsWith" => BinaryOp::EndsWith,
            "matches" => BinaryOp::Matches,
            _ => return None,
        };
        Some(op)
    }

    /// Operators allowed at most once per comparison level
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::Lte
                | BinaryOp::Gt
                | BinaryOp::Gte
                | BinaryOp::In
                | BinaryOp::Contains
                | BinaryOp::StartsWith
                | BinaryOp::EndsWith
                | BinaryOp::Matches
        )
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Renders the expression back to source text, parenthesising every binary
/// operation so the output reparses to the same tree.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal { value } => write_literal(f, value),
            Expression::Variable { name, path } => {
                write!(f, "${}", name)?;
                for segment in path {
                    write!(f, ".{}", segment)?;
                }
                Ok(())
            }
            Expression::Unary { operator, operand } => write!(f, "{}{}", operator, operand),
            Expression::Binary {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::List { items } => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            Expression::Call { function, args } => {
                write!(f, "{}(", function)?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => {
            write!(f, "\"")?;
            for c in s.chars() {
                match c {
                    '"' => write!(f, "\\\"")?,
                    '\\' => write!(f, "\\\\")?,
                    '\n' => write!(f, "\\n")?,
                    '\t' => write!(f, "\\t")?,
                    '\r' => write!(f, "\\r")?,
                    other => write!(f, "{}", other)?,
                }
            }
            write!(f, "\"")
        }
        Value::Float64(n) => write_float(f, n.to_string()),
        Value::Float32(n) => write_float(f, n.to_string()),
        Value::Array(items) | Value::Set(items) => {
            write!(f, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_literal(f, item)?;
            }
            write!(f, "]")
        }
        other => write!(f, "{}", other),
    }
}

/// Plain decimal with a fractional part, so `3.0` stays a float and no
/// exponent is written
fn write_float(f: &mut fmt::Formatter<'_>, digits: String) -> fmt::Result {
    if digits.contains('.') || !digits.ends_with(|c: char| c.is_ascii_digit()) {
        f.write_str(&digits)
    } else {
        write!(f, "{}.0", digits)
    }
}
