// SPDX-License-Identifier: MIT

//! Rule expression engine
//!
//! Text goes through the [`lexer`] into the parser, which builds an
//! [`Expression`] tree. Trees are evaluated against an [`Environment`] of
//! variables and host functions:
//! - `$age >= 18 && $country in ("US", "CA")`
//! - `len($tags) > 0 || $owner = "root"`
//! - `$email matches "^[a-z]+@example\\.com$"`

mod ast;
mod environment;
mod evaluator;
pub mod lexer;
mod operator;
mod parser;
mod value;

pub use ast::{BinaryOp, Expression, UnaryOp};
pub use environment::{Environment, Function};
pub use evaluator::evaluate;
pub use operator::{apply_binary, apply_unary};
pub use parser::{parse, Parser, MAX_DEPTH};
pub use value::{structural_eq, Value, ValueType};

use crate::error::RuleError;

/// Parse and evaluate in one step
pub fn eval_str(source: &str, env: &Environment) -> Result<Value, RuleError> {
    let expr = parse(source)?;
    Ok(evaluate(&expr, env)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EvalError, ParseError};

    #[test]
    fn test_eval_str() {
        let env = Environment::new().with("age", 21i64);
        assert_eq!(eval_str("$age >= 18", &env).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_eval_str_reports_layer() {
        let env = Environment::new();
        assert!(matches!(
            eval_str("1 +", &env),
            Err(RuleError::Parse(ParseError::UnexpectedEof { .. }))
        ));
        assert!(matches!(
            eval_str("$age", &env),
            Err(RuleError::Eval(EvalError::VariableNotFound(_)))
        ));
    }
}
