// SPDX-License-Identifier: MIT

//! Tree-walking evaluator

use super::ast::Expression;
use super::environment::Environment;
use super::operator::{apply_binary, apply_unary};
use super::value::Value;
use crate::error::EvalError;

/// Evaluate an expression against an environment.
///
/// Operands are evaluated left to right before their operator is applied, and
/// the first failure is returned without evaluating the remaining operands.
/// `&&` and `||` evaluate both sides.
pub fn evaluate(expr: &Expression, env: &Environment) -> Result<Value, EvalError> {
    match expr {
        Expression::Literal { value } => Ok(value.clone()),
        Expression::Variable { name, path } => env.resolve(name, path).cloned(),
        Expression::Unary { operator, operand } => {
            let value = evaluate(operand, env)?;
            apply_unary(*operator, &value)
        }
        Expression::Binary {
            operator,
            left,
            right,
        } => {
            let left = evaluate(left, env)?;
            let right = evaluate(right, env)?;
            let result = apply_binary(*operator, &left, &right);
            log::trace!("{} {} {} => {:?}", left, operator, right, result);
            result
        }
        Expression::List { items } => items
            .iter()
            .map(|item| evaluate(item, env))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expression::Call { function, args } => {
            let callable = env
                .function(function)
                .ok_or_else(|| EvalError::FunctionNotFound(function.clone()))?;
            let args = args
                .iter()
                .map(|arg| evaluate(arg, env))
                .collect::<Result<Vec<_>, _>>()?;
            callable(args.as_slice()).map_err(|message| EvalError::Function {
                name: function.clone(),
                message,
            })
        }
    }
}

impl Expression {
    /// Evaluate this expression, see [`evaluate`]
    pub fn evaluate(&self, env: &Environment) -> Result<Value, EvalError> {
        evaluate(self, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::parser::parse;
    use crate::engine::ValueType;
    use crate::error::Side;
    use serde_json::json;

    fn env_from(json: serde_json::Value) -> Environment {
        Environment::from_json(json).unwrap()
    }

    fn eval(text: &str, env: &Environment) -> Result<Value, EvalError> {
        evaluate(&parse(text).unwrap(), env)
    }

    #[test]
    fn test_literals() {
        let env = Environment::new();
        assert_eq!(eval("42", &env), Ok(Value::Int64(42)));
        assert_eq!(eval("'hi'", &env), Ok(Value::from("hi")));
        assert_eq!(eval("true", &env), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_arithmetic_precedence() {
        let env = Environment::new();
        assert_eq!(eval("1 + 2 * 3", &env), Ok(Value::Int64(7)));
        assert_eq!(eval("10 - 3 - 2", &env), Ok(Value::Int64(5)));
        assert_eq!(eval("(1 + 2) * 3", &env), Ok(Value::Int64(9)));
        assert_eq!(eval("2 ** 3 ** 2", &env), Ok(Value::Int64(64)));
    }

    #[test]
    fn test_logical_and_comparison() {
        let expr = parse(r#"$a > 5 && $b = "x""#).unwrap();
        assert_eq!(
            evaluate(&expr, &env_from(json!({"a": 10, "b": "x"}))),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            evaluate(&expr, &env_from(json!({"a": 3, "b": "x"}))),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn test_membership_in_tuple() {
        let expr = parse(r#"$role in ("admin", "owner")"#).unwrap();
        assert_eq!(
            evaluate(&expr, &env_from(json!({"role": "admin"}))),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            evaluate(&expr, &env_from(json!({"role": "guest"}))),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn test_missing_variable() {
        let env = Environment::new();
        assert_eq!(
            eval("$missing = 1", &env),
            Err(EvalError::VariableNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_logical_operators_evaluate_both_sides() {
        let env = env_from(json!({"flag": false}));
        assert_eq!(
            eval("$flag && $missing", &env),
            Err(EvalError::VariableNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let env = Environment::new();
        assert_eq!(
            eval("$left + $right", &env),
            Err(EvalError::VariableNotFound("left".to_string()))
        );
    }

    #[test]
    fn test_division_by_zero() {
        let env = env_from(json!({"x": 9}));
        assert_eq!(eval("$x / 0", &env), Err(EvalError::DivisionByZero));
        let env = env_from(json!({"x": 9.5}));
        assert_eq!(eval("$x / 0", &env), Err(EvalError::DivisionByZero));
        assert_eq!(eval("$x % 0", &env), Err(EvalError::ModuloByZero));
    }

    #[test]
    fn test_type_error_on_logical() {
        let env = Environment::new();
        assert_eq!(
            eval("1 && true", &env),
            Err(EvalError::NonBooleanOperand {
                operator: "&&",
                side: Side::Left,
                found: ValueType::Int64,
            })
        );
        assert_eq!(
            eval("!'x'", &env),
            Err(EvalError::NonBooleanOperand {
                operator: "!",
                side: Side::Operand,
                found: ValueType::String,
            })
        );
    }

    #[test]
    fn test_nested_path() {
        let env = env_from(json!({"user": {"address": {"country": "CA"}}}));
        assert_eq!(
            eval("$user.address.country in ('US', 'CA')", &env),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval("$user.phone = ''", &env),
            Err(EvalError::VariableNotFound("user.phone".to_string()))
        );
    }

    #[test]
    fn test_function_calls() {
        let env = env_from(json!({"tags": ["a", "b", "c"], "name": "Ada"}))
            .with_builtins()
            .with_function("fail", |_: &[Value]| Err("boom".to_string()));

        assert_eq!(eval("len($tags) = 3", &env), Ok(Value::Bool(true)));
        assert_eq!(eval("upper($name) + '!'", &env), Ok(Value::from("ADA!")));
        assert_eq!(
            eval("nope(1)", &env),
            Err(EvalError::FunctionNotFound("nope".to_string()))
        );
        assert_eq!(
            eval("fail()", &env),
            Err(EvalError::Function {
                name: "fail".to_string(),
                message: "boom".to_string(),
            })
        );
    }

    #[test]
    fn test_list_literal_evaluates_to_array() {
        let env = env_from(json!({"x": 2}));
        assert_eq!(
            eval("[1, $x + 1, 'three']", &env),
            Ok(Value::Array(vec![
                Value::Int64(1),
                Value::Int64(3),
                Value::from("three")
            ]))
        );
    }

    #[test]
    fn test_string_concatenation_with_variables() {
        let env = env_from(json!({"n": 3, "unit": "px"}));
        assert_eq!(eval("$n + $unit", &env), Ok(Value::from("3px")));
    }

    #[test]
    fn test_idempotent() {
        let expr = parse("$a * 2 + len($b)").unwrap();
        let env = env_from(json!({"a": 4, "b": "xyz"})).with_builtins();
        let first = evaluate(&expr, &env);
        let second = evaluate(&expr, &env);
        assert_eq!(first, Ok(Value::Int64(11)));
        assert_eq!(first, second);
    }

    #[test]
    fn test_method_form() {
        let expr = parse("!$done").unwrap();
        let env = Environment::new().with("done", false);
        assert_eq!(expr.evaluate(&env), Ok(Value::Bool(true)));
    }
}
