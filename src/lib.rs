// SPDX-License-Identifier: MIT

//! rulekit - an embeddable rule expression language
//!
//! ```
//! use rulekit::{eval_str, Environment, Value};
//!
//! let env = Environment::new().with("age", 21i64).with("country", "CA");
//! let result = eval_str(r#"$age >= 18 && $country in ("US", "CA")"#, &env).unwrap();
//! assert_eq!(result, Value::Bool(true));
//! ```

pub mod engine;
pub mod error;
pub mod rules;

pub use engine::{eval_str, evaluate, parse, Environment, Expression, Value, ValueType};
pub use error::{EvalError, ParseError, RuleError};
pub use rules::{Condition, RuleLoader, RuleSet};
